use crate::models::Medicine;

/// Side-by-side summary of two picked medicines.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Medicine,
    pub right: Medicine,
}

impl Comparison {
    pub fn new(left: Medicine, right: Medicine) -> Self {
        Self { left, right }
    }

    pub fn ingredients(&self) -> (String, String) {
        (self.left.ingredients_label(), self.right.ingredients_label())
    }

    pub fn packs(&self) -> (&str, &str) {
        (self.left.pack_label(), self.right.pack_label())
    }

    pub fn prices(&self) -> (Option<f64>, Option<f64>) {
        (self.left.parsed_price(), self.right.parsed_price())
    }

    /// True when both medicines group under the same non-empty
    /// active-ingredient key, i.e. they are interchangeable alternatives.
    pub fn same_active_ingredients(&self) -> bool {
        let left = self.left.active_key();
        !left.is_empty() && left == self.right.active_key()
    }
}

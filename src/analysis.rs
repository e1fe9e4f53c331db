//! Same-ingredient alternatives for a picked medicine.
//!
//! Everything here is a pure, single pass over the in-memory records; running
//! it twice on the same input gives the same report.

use crate::models::Medicine;
use crate::text::uniq;

/// Lowest and highest parsed price in a family. Both are `None` when no
/// record carries a usable price.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// The cheapest priced record of a family.
#[derive(Debug, Clone, PartialEq)]
pub struct Cheapest {
    pub medicine: Medicine,
    pub price: f64,
}

/// One line of the composition and packaging comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeRow {
    pub id: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub comp1: String,
    pub comp2: String,
    pub pack_size_label: String,
    pub kind: String,
    pub price: Option<f64>,
    pub discontinued: bool,
}

impl AlternativeRow {
    fn from_medicine(medicine: &Medicine) -> Self {
        Self {
            id: medicine.id.clone(),
            name: medicine.name.clone(),
            manufacturer: medicine.manufacturer().map(str::to_string),
            comp1: medicine.composition1(),
            comp2: medicine.composition2(),
            pack_size_label: medicine.pack_label().to_string(),
            kind: medicine.kind_label().to_string(),
            price: medicine.parsed_price(),
            discontinued: medicine.is_discontinued(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlternativesReport {
    /// Normalized ingredient set shared by every family member.
    pub active_key: String,
    /// Records sharing the active key, in dataset order.
    pub family: Vec<Medicine>,
    pub manufacturers: Vec<String>,
    pub price_range: PriceRange,
    pub cheapest: Option<Cheapest>,
    pub rows: Vec<AlternativeRow>,
    pub any_discontinued: bool,
}

/// Build the alternatives report for `picked` against `data`.
pub fn analyze_alternatives(picked: &Medicine, data: &[Medicine]) -> AlternativesReport {
    let active_key = picked.active_key();
    let family: Vec<Medicine> = data
        .iter()
        .filter(|candidate| candidate.active_key() == active_key)
        .cloned()
        .collect();

    let manufacturers = uniq(
        family
            .iter()
            .filter_map(|medicine| medicine.manufacturer())
            .map(str::to_string),
    );

    let priced: Vec<(&Medicine, f64)> = family
        .iter()
        .filter_map(|medicine| medicine.parsed_price().map(|price| (medicine, price)))
        .collect();

    let price_range = PriceRange {
        min: priced.iter().map(|(_, price)| *price).reduce(f64::min),
        max: priced.iter().map(|(_, price)| *price).reduce(f64::max),
    };

    // Ties keep the record met first.
    let cheapest = priced
        .iter()
        .copied()
        .reduce(|current, candidate| {
            if current.1 > candidate.1 {
                candidate
            } else {
                current
            }
        })
        .map(|(medicine, price)| Cheapest {
            medicine: medicine.clone(),
            price,
        });

    let rows: Vec<AlternativeRow> = family.iter().map(AlternativeRow::from_medicine).collect();
    let any_discontinued = rows.iter().any(|row| row.discontinued);

    AlternativesReport {
        active_key,
        family,
        manufacturers,
        price_range,
        cheapest,
        rows,
        any_discontinued,
    }
}

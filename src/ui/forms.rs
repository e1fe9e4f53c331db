use super::screens::Side;

/// Which input the query bar is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryTarget {
    Medicines,
    Compare(Side),
}

impl QueryTarget {
    pub(crate) fn title(self) -> &'static str {
        match self {
            QueryTarget::Medicines => "Search brand or ingredient (e.g., Avil, Azithromycin)",
            QueryTarget::Compare(Side::Left) => "Drug A: search brand or ingredient",
            QueryTarget::Compare(Side::Right) => "Drug B: search brand or ingredient",
        }
    }
}

/// Single-line text input backing the query bar.
#[derive(Debug, Clone)]
pub(crate) struct QueryForm {
    pub(crate) target: QueryTarget,
    pub(crate) query: String,
}

impl QueryForm {
    pub(crate) fn new(target: QueryTarget, query: &str) -> Self {
        Self {
            target,
            query: query.to_string(),
        }
    }

    /// Append a printable character; control characters are ignored.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.query.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) -> bool {
        self.query.pop().is_some()
    }

    pub(crate) fn value_len(&self) -> usize {
        self.query.chars().count()
    }
}

/// Pending "clear all saved" confirmation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConfirmClearSaved {
    pub(crate) count: usize,
}

/// Read-only popup (help, about).
#[derive(Debug, Clone)]
pub(crate) struct InfoDialog {
    pub(crate) title: &'static str,
    pub(crate) lines: Vec<String>,
}

impl InfoDialog {
    pub(crate) fn help() -> Self {
        Self {
            title: "Help & FAQ",
            lines: vec![
                "• Search by brand or ingredient (e.g., \"Avil\", \"Azithromycin\").".to_string(),
                "• Open a result to see alternatives with the same ingredients.".to_string(),
                "• Prices are approximate and come from the local dataset.".to_string(),
            ],
        }
    }

    pub(crate) fn about() -> Self {
        Self {
            title: "About",
            lines: vec![
                format!("Medwise v{}", env!("CARGO_PKG_VERSION")),
                "Compares drugs using a local JSON dataset.".to_string(),
                "Always consult healthcare professionals.".to_string(),
            ],
        }
    }
}

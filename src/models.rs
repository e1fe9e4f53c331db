//! Domain model for a single medicine record as it appears in the bundled
//! dataset. The type stays a light-weight data holder; the derived views
//! (price, ingredient key, display labels) are computed on demand because the
//! dataset is small and entirely memory-resident.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::text::{collapse_whitespace, norm};

/// Placeholder shown wherever an optional text field is absent.
pub const MISSING: &str = "—";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// One medicine (brand or generic) from the dataset. Field names follow the
/// dataset's JSON keys; scalar values are accepted as strings, numbers or
/// booleans and kept as text.
pub struct Medicine {
    /// Stable identifier. Saved lists refer to records through it.
    #[serde(deserialize_with = "required_text")]
    pub id: String,
    /// Brand or product name.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub name: String,
    /// Price in rupees; preferred over `price` when both exist.
    #[serde(
        rename = "price(₹)",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_inr: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<String>,
    #[serde(
        rename = "Is_discontinued",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_discontinued: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub manufacturer_name: Option<String>,
    /// Dosage form, e.g. `allopathy`.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub pack_size_label: Option<String>,
    /// First active ingredient with its dose, e.g. `Amoxycillin  (500mg)`.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub short_composition1: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub short_composition2: Option<String>,
}

impl Medicine {
    /// The raw price text, preferring the rupee column. Empty text counts as
    /// no price.
    pub fn raw_price(&self) -> Option<&str> {
        self.price_inr
            .as_deref()
            .or(self.price.as_deref())
            .filter(|raw| !raw.is_empty())
    }

    /// Parsed price, or `None` when the record has no usable price.
    pub fn parsed_price(&self) -> Option<f64> {
        self.raw_price().and_then(parse_price)
    }

    /// Whether the record is flagged as discontinued (`TRUE` in any case).
    pub fn is_discontinued(&self) -> bool {
        self.is_discontinued
            .as_deref()
            .is_some_and(|flag| flag.to_uppercase() == "TRUE")
    }

    /// Normalized ingredient names without doses, in composition order.
    pub fn ingredients(&self) -> Vec<String> {
        [&self.short_composition1, &self.short_composition2]
            .into_iter()
            .filter_map(|comp| comp.as_deref().and_then(ingredient_name))
            .map(|name| norm(&name))
            .collect()
    }

    /// Order-independent key grouping records with the same active
    /// ingredients, e.g. `amoxycillin + clavulanic acid`.
    pub fn active_key(&self) -> String {
        let mut names = self.ingredients();
        names.sort();
        names.join(" + ")
    }

    /// Both compositions with whitespace collapsed, for list cards.
    pub fn composition_summary(&self) -> String {
        [&self.short_composition1, &self.short_composition2]
            .into_iter()
            .flatten()
            .filter(|comp| !comp.is_empty())
            .map(|comp| collapse_whitespace(comp))
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// Trimmed compositions as shown on the detail and compare views.
    pub fn ingredients_label(&self) -> String {
        let first = self.composition1();
        match self.short_composition2.as_deref() {
            Some(second) if !second.is_empty() => format!("{first} + {}", second.trim()),
            _ => first,
        }
    }

    pub fn composition1(&self) -> String {
        trimmed_or_empty(&self.short_composition1)
    }

    pub fn composition2(&self) -> String {
        trimmed_or_empty(&self.short_composition2)
    }

    /// Manufacturer when known and non-empty.
    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    pub fn pack_label(&self) -> &str {
        non_empty_or_missing(&self.pack_size_label)
    }

    pub fn kind_label(&self) -> &str {
        non_empty_or_missing(&self.kind)
    }
}

impl fmt::Display for Medicine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Parse a price the way loose dataset values need: every character except
/// digits and `.` is dropped, then the longest leading float is read.
/// Non-finite or unparseable values yield `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();

    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (idx, ch) in cleaned.char_indices() {
        if ch == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        } else {
            seen_digit = true;
        }
        end = idx + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }

    let prefix = cleaned[..end].trim_end_matches('.');
    prefix
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Name part of a composition field: text before the first `(`, trimmed and
/// whitespace-collapsed.
fn ingredient_name(composition: &str) -> Option<String> {
    let head = composition.split('(').next().unwrap_or_default();
    let name = collapse_whitespace(head);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn trimmed_or_empty(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn non_empty_or_missing(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => MISSING,
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer)?.ok_or_else(|| serde::de::Error::custom("id must not be null"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medicine(comp1: Option<&str>, comp2: Option<&str>) -> Medicine {
        Medicine {
            id: "1".into(),
            name: "Test".into(),
            short_composition1: comp1.map(Into::into),
            short_composition2: comp2.map(Into::into),
            ..Medicine::default()
        }
    }

    #[test]
    fn parse_price_strips_currency_and_separators() {
        assert_eq!(parse_price("₹ 1,234.50"), Some(1234.5));
        assert_eq!(parse_price("98.7"), Some(98.7));
        assert_eq!(parse_price("Rs. 45"), Some(0.45));
    }

    #[test]
    fn parse_price_reads_leading_float_only() {
        assert_eq!(parse_price("1.2.3"), Some(1.2));
        assert_eq!(parse_price(".5"), Some(0.5));
        assert_eq!(parse_price("7."), Some(7.0));
    }

    #[test]
    fn parse_price_rejects_text_without_digits() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("n/a"), None);
        assert_eq!(parse_price("..."), None);
    }

    #[test]
    fn raw_price_prefers_rupee_column() {
        let mut item = medicine(None, None);
        item.price = Some("20".into());
        assert_eq!(item.parsed_price(), Some(20.0));

        item.price_inr = Some("35.5".into());
        assert_eq!(item.parsed_price(), Some(35.5));

        item.price_inr = Some(String::new());
        assert_eq!(item.raw_price(), None);
    }

    #[test]
    fn discontinued_flag_is_case_insensitive() {
        let mut item = medicine(None, None);
        assert!(!item.is_discontinued());
        item.is_discontinued = Some("true".into());
        assert!(item.is_discontinued());
        item.is_discontinued = Some("FALSE".into());
        assert!(!item.is_discontinued());
    }

    #[test]
    fn ingredients_drop_doses_and_normalize() {
        let item = medicine(Some("Amoxycillin  (500mg)"), Some(" Clavulanic   Acid (125mg)"));
        assert_eq!(item.ingredients(), vec!["amoxycillin", "clavulanic acid"]);
    }

    #[test]
    fn active_key_is_order_independent() {
        let a = medicine(Some("Amoxycillin (500mg)"), Some("Clavulanic Acid (125mg)"));
        let b = medicine(Some("Clavulanic Acid (125mg)"), Some("Amoxycillin (250mg)"));
        assert_eq!(a.active_key(), "amoxycillin + clavulanic acid");
        assert_eq!(a.active_key(), b.active_key());
    }

    #[test]
    fn active_key_skips_empty_compositions() {
        let item = medicine(Some("(10mg)"), None);
        assert_eq!(item.active_key(), "");
        let single = medicine(None, Some("Pheniramine (25mg)"));
        assert_eq!(single.active_key(), "pheniramine");
    }

    #[test]
    fn labels_trim_and_join_compositions() {
        let item = medicine(Some(" Amoxycillin  (500mg) "), Some("Clavulanic Acid (125mg)"));
        assert_eq!(
            item.composition_summary(),
            "Amoxycillin (500mg) + Clavulanic Acid (125mg)"
        );
        assert_eq!(
            item.ingredients_label(),
            "Amoxycillin  (500mg) + Clavulanic Acid (125mg)"
        );
        assert_eq!(medicine(None, None).ingredients_label(), "");
    }

    #[test]
    fn deserializes_loose_scalar_values() {
        let json = r#"{
            "id": 42,
            "name": "Avil 25 Tablet",
            "price(₹)": 12.5,
            "Is_discontinued": true,
            "type": "allopathy",
            "short_composition1": "Pheniramine (25mg)",
            "short_composition2": null
        }"#;
        let item: Medicine = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.parsed_price(), Some(12.5));
        assert!(item.is_discontinued());
        assert_eq!(item.kind_label(), "allopathy");
        assert_eq!(item.pack_label(), MISSING);
        assert_eq!(item.short_composition2, None);
    }

    #[test]
    fn missing_id_is_rejected() {
        let result = serde_json::from_str::<Medicine>(r#"{"name": "No id"}"#);
        assert!(result.is_err());
    }
}

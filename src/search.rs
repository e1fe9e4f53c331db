//! Fuzzy text search over the dataset.
//!
//! A field matches when some window of its text is within a few edits of the
//! query. The per-field distance is that edit count divided by the query
//! length, so a threshold of 0.28 tolerates roughly one typo in four letters
//! ("amoxicillin" finds "Amoxycillin"). On top of that this module decides
//! which record fields are searched, how much each one counts, and how the
//! final result list is ordered.

use std::collections::HashMap;

use tracing::debug;

use crate::models::Medicine;

/// Hits pulled from the index before de-duplication in the main lookup.
const POOL_LIMIT: usize = 200;
/// Most relevant hits kept before the price re-sort.
const RELEVANCE_CUTOFF: usize = 50;
/// Results shown to the user.
pub const DISPLAY_LIMIT: usize = 10;

/// Record fields that can take part in a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Name,
    Composition1,
    Composition2,
    Manufacturer,
}

impl SearchKey {
    fn text<'a>(&self, medicine: &'a Medicine) -> Option<&'a str> {
        match self {
            SearchKey::Name => Some(medicine.name.as_str()),
            SearchKey::Composition1 => medicine.short_composition1.as_deref(),
            SearchKey::Composition2 => medicine.short_composition2.as_deref(),
            SearchKey::Manufacturer => medicine.manufacturer_name.as_deref(),
        }
    }
}

/// Tuning for one search index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Searched fields with their relative weights.
    pub keys: Vec<(SearchKey, f64)>,
    /// Largest per-field error ratio (0 = exact, 1 = nothing in common) still
    /// counted as a match.
    pub threshold: f64,
    /// Trimmed queries shorter than this return nothing.
    pub min_match_len: usize,
    /// Maximum number of hits returned by [`SearchIndex::search`].
    pub limit: usize,
}

impl SearchOptions {
    /// Brand-or-ingredient lookup used by the search tab. Names dominate so a
    /// brand query such as "avil" stays precise.
    pub fn lookup() -> Self {
        Self {
            keys: vec![
                (SearchKey::Name, 0.6),
                (SearchKey::Composition1, 0.25),
                (SearchKey::Composition2, 0.1),
                (SearchKey::Manufacturer, 0.05),
            ],
            threshold: 0.28,
            min_match_len: 2,
            limit: POOL_LIMIT,
        }
    }

    /// Looser picker used by each side of the compare tab.
    pub fn compare() -> Self {
        Self {
            keys: vec![
                (SearchKey::Name, 1.0),
                (SearchKey::Composition1, 1.0),
                (SearchKey::Composition2, 1.0),
            ],
            threshold: 0.32,
            min_match_len: 1,
            limit: DISPLAY_LIMIT,
        }
    }
}

/// A record position in the indexed slice and its combined score (lower is
/// better).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub index: usize,
    pub score: f64,
}

/// Pre-extracted, lowercased field text for every record.
pub struct SearchIndex {
    entries: Vec<Vec<Option<Vec<char>>>>,
    weights: Vec<f64>,
    options: SearchOptions,
}

impl SearchIndex {
    pub fn new(medicines: &[Medicine], options: SearchOptions) -> Self {
        let total: f64 = options.keys.iter().map(|(_, weight)| weight).sum();
        let weights = options
            .keys
            .iter()
            .map(|(_, weight)| if total > 0.0 { weight / total } else { 0.0 })
            .collect();

        let entries = medicines
            .iter()
            .map(|medicine| {
                options
                    .keys
                    .iter()
                    .map(|(key, _)| {
                        key.text(medicine)
                            .map(str::trim)
                            .filter(|text| !text.is_empty())
                            .map(|text| text.to_lowercase().chars().collect())
                    })
                    .collect()
            })
            .collect();

        Self {
            entries,
            weights,
            options,
        }
    }

    /// Best hits for `query`, ordered by score then by record position.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query: Vec<char> = query.trim().to_lowercase().chars().collect();
        if query.is_empty() || query.len() < self.options.min_match_len {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, fields)| {
                self.score_fields(fields, &query)
                    .map(|score| SearchHit { index, score })
            })
            .collect();

        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(self.options.limit);
        debug!(query_len = query.len(), hits = hits.len(), "search finished");
        hits
    }

    /// Weighted product of matching field distances, or `None` when no field
    /// is close enough.
    fn score_fields(&self, fields: &[Option<Vec<char>>], query: &[char]) -> Option<f64> {
        let mut total = 1.0;
        let mut matched = false;

        for (field, weight) in fields.iter().zip(&self.weights) {
            let Some(text) = field else { continue };
            let distance = window_distance(query, text) as f64 / query.len() as f64;
            if distance > self.options.threshold {
                continue;
            }
            matched = true;
            total *= distance.max(f64::EPSILON).powf(*weight);
        }

        matched.then_some(total)
    }
}

/// Fewest insertions, deletions or substitutions needed to turn `query` into
/// any contiguous window of `text`. The window may start and end anywhere.
fn window_distance(query: &[char], text: &[char]) -> usize {
    // row[i]: cheapest edit of query[..i] into a window ending at the current
    // text position.
    let mut row: Vec<usize> = (0..=query.len()).collect();
    let mut best = query.len();

    for &ch in text {
        let mut diagonal = row[0];
        row[0] = 0;
        for (i, &q) in query.iter().enumerate() {
            let substitute = diagonal + usize::from(q != ch);
            let delete = row[i + 1] + 1;
            let insert = row[i] + 1;
            diagonal = row[i + 1];
            row[i + 1] = substitute.min(delete).min(insert);
        }
        best = best.min(row[query.len()]);
    }

    best
}

/// Main search-tab pipeline: the most relevant hits, one per record id,
/// re-ordered by ascending price with unpriced records last. Returns
/// positions into `medicines`.
pub fn lookup(medicines: &[Medicine], index: &SearchIndex, query: &str) -> Vec<usize> {
    let pool = index.search(query);

    let mut best_by_id: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<SearchHit> = Vec::with_capacity(pool.len());
    for hit in pool {
        let id = medicines[hit.index].id.as_str();
        match best_by_id.get(id) {
            Some(&slot) => {
                if hit.score < unique[slot].score {
                    unique[slot] = hit;
                }
            }
            None => {
                best_by_id.insert(id, unique.len());
                unique.push(hit);
            }
        }
    }

    unique.sort_by(|a, b| a.score.total_cmp(&b.score));
    unique.truncate(RELEVANCE_CUTOFF);

    unique.sort_by(|a, b| {
        let price_a = medicines[a.index].parsed_price().unwrap_or(f64::INFINITY);
        let price_b = medicines[b.index].parsed_price().unwrap_or(f64::INFINITY);
        price_a.total_cmp(&price_b)
    });

    unique
        .into_iter()
        .take(DISPLAY_LIMIT)
        .map(|hit| hit.index)
        .collect()
}

/// Candidates for one side of the compare tab, in relevance order.
pub fn compare_candidates(index: &SearchIndex, query: &str) -> Vec<usize> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    index
        .search(query)
        .into_iter()
        .take(DISPLAY_LIMIT)
        .map(|hit| hit.index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn ids(medicines: &[Medicine], positions: &[usize]) -> Vec<String> {
        positions
            .iter()
            .map(|&idx| medicines[idx].id.clone())
            .collect()
    }

    fn record(id: &str, name: &str, price: Option<&str>) -> Medicine {
        Medicine {
            id: id.into(),
            name: name.into(),
            price_inr: price.map(Into::into),
            ..Medicine::default()
        }
    }

    #[test]
    fn brand_lookup_is_sorted_by_price() {
        let dataset = Dataset::bundled().unwrap();
        let index = SearchIndex::new(dataset.medicines(), SearchOptions::lookup());
        let found = ids(dataset.medicines(), &lookup(dataset.medicines(), &index, "avil"));
        assert!(found.len() >= 2);
        assert_eq!(&found[..2], &["2".to_string(), "1".to_string()]);
    }

    #[test]
    fn ingredient_lookup_puts_unpriced_records_last() {
        let dataset = Dataset::bundled().unwrap();
        let index = SearchIndex::new(dataset.medicines(), SearchOptions::lookup());
        let found = ids(
            dataset.medicines(),
            &lookup(dataset.medicines(), &index, "Azithromycin"),
        );
        assert_eq!(found, vec!["6", "5", "4", "7"]);
    }

    #[test]
    fn short_or_unknown_queries_return_nothing() {
        let dataset = Dataset::bundled().unwrap();
        let index = SearchIndex::new(dataset.medicines(), SearchOptions::lookup());
        assert!(index.search("a").is_empty());
        assert!(index.search("   ").is_empty());
        assert!(index.search("qqqq").is_empty());
    }

    #[test]
    fn exact_name_beats_weaker_field_match() {
        let medicines = vec![
            Medicine {
                manufacturer_name: Some("Dolo Labs".into()),
                ..record("m", "Something Else", None)
            },
            record("n", "Dolo 650", None),
        ];
        let index = SearchIndex::new(&medicines, SearchOptions::lookup());
        let hits = index.search("dolo");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 1);
        assert!(hits[0].score < hits[1].score);
    }

    #[test]
    fn lookup_keeps_one_hit_per_id() {
        let medicines = vec![
            record("dup", "Calpol 650", Some("30")),
            record("dup", "Calpol 500", Some("20")),
            record("other", "Calpol Syrup", Some("40")),
        ];
        let index = SearchIndex::new(&medicines, SearchOptions::lookup());
        let found = lookup(&medicines, &index, "calpol");
        assert_eq!(found.len(), 2);
        assert_eq!(ids(&medicines, &found).iter().filter(|id| *id == "dup").count(), 1);
    }

    #[test]
    fn lookup_caps_results() {
        let medicines: Vec<_> = (0..25)
            .map(|n| record(&n.to_string(), &format!("Zincovit {n}"), Some("10")))
            .collect();
        let index = SearchIndex::new(&medicines, SearchOptions::lookup());
        assert_eq!(lookup(&medicines, &index, "zincovit").len(), DISPLAY_LIMIT);
    }

    #[test]
    fn window_distance_counts_edits_inside_longer_text() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(window_distance(&chars("mycin"), &chars("azithromycin (500mg)")), 0);
        assert_eq!(window_distance(&chars("amoxicillin"), &chars("amoxycillin  (500mg)")), 1);
        assert_eq!(window_distance(&chars("pantprazole"), &chars("pantoprazole")), 1);
        assert_eq!(window_distance(&chars("abc"), &chars("xyz")), 3);
        assert_eq!(window_distance(&chars("abc"), &[]), 3);
    }

    #[test]
    fn misspelled_ingredients_still_match() {
        let dataset = Dataset::bundled().unwrap();
        let index = SearchIndex::new(dataset.medicines(), SearchOptions::lookup());
        let find = |query: &str| ids(dataset.medicines(), &lookup(dataset.medicines(), &index, query));

        assert_eq!(find("azithromicin"), vec!["6", "5", "4", "7"]);
        assert_eq!(find("paracitamol"), vec!["16", "14", "13", "15"]);
        assert_eq!(find("pantaprazole"), vec!["17", "18", "19"]);
        assert_eq!(find("Amoxicillin"), vec!["12", "11", "9", "10", "8"]);
    }

    #[test]
    fn partial_words_match_without_errors() {
        let dataset = Dataset::bundled().unwrap();
        let index = SearchIndex::new(dataset.medicines(), SearchOptions::lookup());
        let find = |query: &str| ids(dataset.medicines(), &lookup(dataset.medicines(), &index, query));

        assert_eq!(find("mycin"), vec!["6", "5", "4", "7"]);
        assert_eq!(find("metformin"), vec!["23", "24", "25"]);
    }

    #[test]
    fn too_many_typos_is_no_match() {
        let medicines = vec![record("1", "Telma 40 Tablet", None)];
        let index = SearchIndex::new(&medicines, SearchOptions::lookup());
        // Two edits in five letters is past the 0.28 ratio.
        assert!(index.search("tekna").is_empty());
        assert_eq!(index.search("telna").len(), 1);
    }

    #[test]
    fn compare_candidates_follow_relevance() {
        let dataset = Dataset::bundled().unwrap();
        let index = SearchIndex::new(dataset.medicines(), SearchOptions::compare());
        let found = ids(dataset.medicines(), &compare_candidates(&index, "Dolo"));
        assert_eq!(found.first().map(String::as_str), Some("13"));
        assert!(compare_candidates(&index, "  ").is_empty());
    }
}

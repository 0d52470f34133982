//! Term frequency over the corpus

use std::collections::HashMap;

/// Distinct entries with their occurrence counts, most frequent first
///
/// Entries with equal counts keep the order in which they first appeared in
/// the corpus, so a given corpus always yields the same table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    rows: Vec<(String, usize)>,
    total: usize,
    distinct: usize,
}

impl FrequencyTable {
    /// Count every entry of `corpus`
    pub fn from_corpus<S: AsRef<str>>(corpus: &[S]) -> Self {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut rows: Vec<(String, usize)> = Vec::new();

        for entry in corpus {
            let entry = entry.as_ref();
            match positions.get(entry) {
                Some(&position) => rows[position].1 += 1,
                None => {
                    positions.insert(entry, rows.len());
                    rows.push((entry.to_string(), 1));
                }
            }
        }

        // sort_by is stable, so ties stay in first-seen order
        rows.sort_by(|a, b| b.1.cmp(&a.1));

        let distinct = rows.len();
        Self {
            rows,
            total: corpus.len(),
            distinct,
        }
    }

    /// Keep only the `k` most frequent rows
    pub fn truncate(mut self, k: usize) -> Self {
        self.rows.truncate(k);
        self
    }

    pub fn rows(&self) -> &[(String, usize)] {
        &self.rows
    }

    /// Most frequent entry, if any
    pub fn top(&self) -> Option<(&str, usize)> {
        self.rows.first().map(|(text, count)| (text.as_str(), *count))
    }

    /// Entries counted, duplicates included
    pub fn total(&self) -> usize {
        self.total
    }

    /// Distinct entries in the corpus, including rows dropped by `truncate`
    pub fn distinct(&self) -> usize {
        self.distinct
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The `k` most frequent entries of `corpus`
pub fn summarize<S: AsRef<str>>(corpus: &[S], k: usize) -> FrequencyTable {
    FrequencyTable::from_corpus(corpus).truncate(k)
}

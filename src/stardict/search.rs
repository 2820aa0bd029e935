//! In-memory headword index.
//!
//! Maps each (normalized) headword to the positions of its records in the
//! `.idx` file. The record list itself stays in the dictionary handle; this
//! index only holds positions into it.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::stardict::types::models::IndexRecord;
use crate::stardict::types::options::CaseFolding;

/// Ordered headword → record positions map. Immutable once built.
#[derive(Debug, Default)]
pub struct SearchIndex {
    keys: BTreeMap<String, Vec<usize>>,
    case_folding: CaseFolding,
}

impl SearchIndex {
    pub fn new(case_folding: CaseFolding) -> Self {
        Self {
            keys: BTreeMap::new(),
            case_folding,
        }
    }

    /// Builds the index from records in file order.
    pub fn build(records: &[IndexRecord], case_folding: CaseFolding) -> Self {
        let mut index = Self::new(case_folding);
        for (position, record) in records.iter().enumerate() {
            index.insert(&record.headword, position);
        }
        index
    }

    /// Adds a position under `headword`; repeated headwords accumulate.
    fn insert(&mut self, headword: &str, position: usize) {
        let key = self.case_folding.normalize(headword).into_owned();
        self.keys.entry(key).or_default().push(position);
    }

    /// Positions of every record whose headword equals `word`, in file order.
    pub fn exact_match(&self, word: &str) -> &[usize] {
        let key = self.case_folding.normalize(word);
        self.keys
            .get(&*key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Lazily yields `(key, positions)` for every key starting with `prefix`,
    /// in ascending key order.
    pub fn prefix_match<'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = (&'a str, &'a [usize])> + use<'a> {
        let prefix = self.case_folding.normalize(prefix).into_owned();
        let range = self
            .keys
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded));
        range
            .map(|(key, positions)| (key.as_str(), positions.as_slice()))
            .take_while(move |(key, _)| key.starts_with(prefix.as_str()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(words: &[&str]) -> Vec<IndexRecord> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| IndexRecord {
                headword: w.to_string(),
                data_offset: i as u64,
                data_size: 1,
            })
            .collect()
    }

    #[test]
    fn duplicates_keep_file_order() {
        let index = SearchIndex::build(&records(&["run", "ran", "run", "run"]), CaseFolding::Sensitive);
        assert_eq!(index.exact_match("run"), &[0, 2, 3]);
        assert_eq!(index.exact_match("ran"), &[1]);
        assert!(index.exact_match("running").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn prefix_match_is_ordered_and_bounded() {
        let index = SearchIndex::build(
            &records(&["testudo", "test", "tea", "testa", "zebra"]),
            CaseFolding::Sensitive,
        );
        let keys: Vec<_> = index.prefix_match("tes").map(|(k, _)| k).collect();
        assert_eq!(keys, ["test", "testa", "testudo"]);

        let all: Vec<_> = index.prefix_match("").map(|(k, _)| k).collect();
        assert_eq!(all, ["tea", "test", "testa", "testudo", "zebra"]);

        assert_eq!(index.prefix_match("x").count(), 0);
    }

    #[test]
    fn case_folding_applies_to_keys_and_queries() {
        let words = ["Hello", "hello", "HELP"];
        let folded = SearchIndex::build(&records(&words), CaseFolding::Insensitive);
        assert_eq!(folded.exact_match("HeLLo"), &[0, 1]);
        assert_eq!(folded.prefix_match("HEL").count(), 2);

        let exact = SearchIndex::build(&records(&words), CaseFolding::Sensitive);
        assert_eq!(exact.exact_match("Hello"), &[0]);
        assert!(exact.exact_match("HeLLo").is_empty());
    }
}

// Insertion-ordered set of strings used for suggestion lists.
// Keeps the first occurrence of every value and drops later duplicates.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctValues {
    seen: HashSet<String>,
    values: Vec<String>,
}

impl DistinctValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `value` had not been seen before
    pub fn insert(&mut self, value: &str) -> bool {
        if self.seen.contains(value) {
            return false;
        }
        self.seen.insert(value.to_string());
        self.values.push(value.to_string());
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.values
    }
}

impl<'a> FromIterator<&'a str> for DistinctValues {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut distinct = Self::new();
        for value in iter {
            distinct.insert(value);
        }
        distinct
    }
}

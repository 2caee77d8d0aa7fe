//! Accumulated answers for one form run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flat mapping from field name to answer value.
///
/// Merging is unconditional overwrite-by-key and never removes a key;
/// validation happens before anything reaches the accumulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, String>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `existing` with every key of `patch`.
    pub fn merge<I, K, V>(&mut self, patch: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in patch {
            self.0.insert(key.into(), value.into());
        }
    }

    /// Non-mutating variant of [`Answers::merge`].
    pub fn merged<I, K, V>(&self, patch: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut out = self.clone();
        out.merge(patch);
        out
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Answers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut answers = Self::new();
        answers.merge(iter);
        answers
    }
}

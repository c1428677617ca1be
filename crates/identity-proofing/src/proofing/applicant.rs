use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A user's claimed identity attributes, keyed by field name.
///
/// Once built the bag is never mutated; stage-specific overrides produce a new value through
/// [`Applicant::with_overrides`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Applicant {
    fields: BTreeMap<String, String>,
}

impl Applicant {
    pub fn new<K, V, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Absent and whitespace-only values are both blank.
    pub fn is_blank(&self, field: &str) -> bool {
        self.get(field).map_or(true, |value| value.trim().is_empty())
    }

    /// Required fields that are blank, in the order given.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|field| self.is_blank(field))
            .collect()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn with_overrides<I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut fields = self.fields.clone();
        fields.extend(overrides);
        Self { fields }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

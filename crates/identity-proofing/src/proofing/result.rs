use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field used when an error does not belong to a specific applicant attribute.
pub const BASE_FIELD: &str = "base";

/// Reasons an adapter run could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProofingFault {
    /// Required applicant attributes were blank; the adapter was never called.
    #[error("Required attributes {} are not present", .missing.join(", "))]
    Validation { missing: Vec<String> },
    #[error("{message}")]
    Vendor { message: String },
    #[error("{message}")]
    Timeout { message: String },
}

impl ProofingFault {
    pub fn vendor(message: impl Into<String>) -> Self {
        Self::Vendor {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub(crate) fn elapsed(limit: Duration) -> Self {
        Self::timeout(format!("vendor did not respond within {}ms", limit.as_millis()))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Outcome accumulator for a single adapter invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofingResult {
    pub errors: BTreeMap<String, BTreeSet<String>>,
    pub messages: BTreeSet<String>,
    pub context: Map<String, Value>,
    pub exception: Option<ProofingFault>,
    pub transaction_id: Option<String>,
}

impl ProofingResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejection under `field`; identical messages collapse into one.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.to_string())
            .or_default()
            .insert(message.into());
        self
    }

    pub fn add_base_error(&mut self, message: impl Into<String>) -> &mut Self {
        self.add_error(BASE_FIELD, message)
    }

    pub fn add_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.insert(message.into());
        self
    }

    pub fn set_context(&mut self, key: &str, value: Value) -> &mut Self {
        self.context.insert(key.to_string(), value);
        self
    }

    pub fn set_transaction_id(&mut self, transaction_id: impl Into<String>) -> &mut Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_exception(&self) -> bool {
        self.exception.is_some()
    }

    pub fn failed(&self) -> bool {
        !self.has_exception() && self.has_errors()
    }

    pub fn success(&self) -> bool {
        !self.has_exception() && !self.has_errors()
    }

    pub fn timed_out(&self) -> bool {
        self.exception.as_ref().is_some_and(ProofingFault::is_timeout)
    }

    pub fn errors_for(&self, field: &str) -> Vec<&str> {
        self.errors
            .get(field)
            .map(|messages| messages.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::applicant::Applicant;
use super::result::{ProofingResult, BASE_FIELD};

/// Error key marking a result written because the job itself faulted.
pub const JOB_FAILED: &str = "job_failed";

/// Per-field entry in [`VendorResult::errors`].
///
/// Vendor rejections carry messages; the job-failure sentinel is the bare flag
/// `{"job_failed": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldErrors {
    Messages(Vec<String>),
    Flag(bool),
}

/// Normalized, storage-ready projection of one job invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorResult {
    pub success: bool,
    #[serde(default)]
    pub errors: BTreeMap<String, FieldErrors>,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub normalized_applicant: Option<Applicant>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub timed_out: bool,
}

impl VendorResult {
    /// Project an adapter result. A captured fault surfaces under `base` so the stored result
    /// never reads as a clean failure with no explanation.
    pub fn from_proofing(result: &ProofingResult) -> Self {
        let mut errors: BTreeMap<String, FieldErrors> = result
            .errors
            .iter()
            .map(|(field, messages)| {
                (
                    field.clone(),
                    FieldErrors::Messages(messages.iter().cloned().collect()),
                )
            })
            .collect();

        if let Some(fault) = &result.exception {
            if !errors.contains_key(BASE_FIELD) {
                errors.insert(
                    BASE_FIELD.to_string(),
                    FieldErrors::Messages(vec![fault.to_string()]),
                );
            }
        }

        Self {
            success: result.success(),
            errors,
            reasons: result.messages.iter().cloned().collect(),
            normalized_applicant: None,
            session_id: None,
            timed_out: result.timed_out(),
        }
    }

    /// Sentinel stored when the job could not finish; readers see a terminal, failed result.
    pub fn job_failed() -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(JOB_FAILED.to_string(), FieldErrors::Flag(true));
        Self {
            success: false,
            errors,
            reasons: Vec::new(),
            normalized_applicant: None,
            session_id: None,
            timed_out: false,
        }
    }

    pub fn is_job_failed(&self) -> bool {
        matches!(self.errors.get(JOB_FAILED), Some(FieldErrors::Flag(true)))
    }

    pub fn messages_for(&self, field: &str) -> &[String] {
        match self.errors.get(field) {
            Some(FieldErrors::Messages(messages)) => messages,
            _ => &[],
        }
    }

    /// Fold a later stage into this one: errors and reasons accumulate, any failure sticks.
    pub fn merge(&mut self, later: VendorResult) {
        self.success = self.success && later.success;
        self.timed_out = self.timed_out || later.timed_out;
        for (field, entry) in later.errors {
            match entry {
                FieldErrors::Messages(messages) => {
                    let slot = self
                        .errors
                        .entry(field)
                        .or_insert_with(|| FieldErrors::Messages(Vec::new()));
                    // a job_failed flag is never downgraded to messages
                    if let FieldErrors::Messages(existing) = slot {
                        for message in messages {
                            if !existing.contains(&message) {
                                existing.push(message);
                            }
                        }
                    }
                }
                flag @ FieldErrors::Flag(_) => {
                    self.errors.insert(field, flag);
                }
            }
        }
        self.reasons.extend(later.reasons);
        if later.normalized_applicant.is_some() {
            self.normalized_applicant = later.normalized_applicant;
        }
        if later.session_id.is_some() {
            self.session_id = later.session_id;
        }
    }

    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
}

use async_trait::async_trait;
use serde_json::Value;

use crate::proofing::adapter::ProoferAdapter;
use crate::proofing::applicant::Applicant;
use crate::proofing::result::{ProofingFault, ProofingResult};
use crate::proofing::stage::Stage;

/// Identity resolution against a fake credit-header vendor.
pub struct ResolutionMock;

impl ResolutionMock {
    pub const VENDOR_NAME: &'static str = "ResolutionMock";
    pub const TRANSACTION_ID: &'static str = "resolution-mock-transaction-id-123";

    pub const FAILED_TO_CONTACT_MARKER: &'static str = "Fail";
    pub const TIMEOUT_FIRST_NAME: &'static str = "Time Exception";
    pub const SUSPICIOUS_NAME_MARKER: &'static str = "Bad";
    pub const UNVERIFIABLE_SSNS: [&'static str; 3] = ["000-00-0000", "000000000", "444-55-6666"];
    pub const UNVERIFIABLE_SSN_SUFFIX: &'static str = "6666";
    pub const UNVERIFIABLE_ZIPCODE: &'static str = "00000";

    const UPPERCASED_FIELDS: [&'static str; 4] = ["first_name", "last_name", "address1", "city"];

    fn normalize(applicant: &Applicant) -> Value {
        let fields = applicant
            .fields()
            .iter()
            .map(|(key, value)| {
                let value = if Self::UPPERCASED_FIELDS.contains(&key.as_str()) {
                    value.trim().to_uppercase()
                } else {
                    value.trim().to_string()
                };
                (key.clone(), Value::String(value))
            })
            .collect();
        Value::Object(fields)
    }
}

#[async_trait]
impl ProoferAdapter for ResolutionMock {
    fn vendor_name(&self) -> &'static str {
        Self::VENDOR_NAME
    }

    fn stage(&self) -> Stage {
        Stage::Resolution
    }

    fn required_attributes(&self) -> &'static [&'static str] {
        &["first_name", "last_name", "dob", "ssn", "zipcode"]
    }

    async fn proof(
        &self,
        applicant: &Applicant,
        result: &mut ProofingResult,
    ) -> Result<(), ProofingFault> {
        let first_name = applicant.get("first_name").unwrap_or_default();

        if first_name.contains(Self::FAILED_TO_CONTACT_MARKER) {
            return Err(ProofingFault::vendor("Failed to contact proofing vendor"));
        }
        if first_name == Self::TIMEOUT_FIRST_NAME {
            return Err(ProofingFault::timeout("resolution mock timeout"));
        }

        if first_name.contains(Self::SUSPICIOUS_NAME_MARKER) {
            result.add_message("The name was suspicious");
            result.add_error("first_name", "Unverified first name.");
        }

        let ssn = applicant.get("ssn").unwrap_or_default().trim();
        if Self::UNVERIFIABLE_SSNS.contains(&ssn) || ssn.ends_with(Self::UNVERIFIABLE_SSN_SUFFIX) {
            result.add_message("The SSN was suspicious");
            result.add_error("ssn", "Unverified SSN.");
        }

        if applicant.get("zipcode").map(str::trim) == Some(Self::UNVERIFIABLE_ZIPCODE) {
            result.add_message("The ZIP code was suspicious");
            result.add_error("zipcode", "Unverified ZIP code.");
        }

        if result.has_errors() {
            return Ok(());
        }

        result
            .add_message("Everything looks good")
            .set_transaction_id(Self::TRANSACTION_ID)
            .set_context("normalized_applicant", Self::normalize(applicant));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant() -> Applicant {
        Applicant::new([
            ("first_name", "Jean-Luc"),
            ("last_name", "Picard"),
            ("dob", "1935-07-13"),
            ("ssn", "900-11-1111"),
            ("zipcode", "20500"),
        ])
    }

    async fn run(applicant: Applicant) -> (ProofingResult, Result<(), ProofingFault>) {
        let mut result = ProofingResult::new();
        let outcome = ResolutionMock.proof(&applicant, &mut result).await;
        (result, outcome)
    }

    #[tokio::test]
    async fn passes_clean_applicants_and_normalizes_names() {
        let (result, outcome) = run(applicant()).await;
        assert!(outcome.is_ok());
        assert!(result.success());
        assert_eq!(
            result.transaction_id.as_deref(),
            Some(ResolutionMock::TRANSACTION_ID)
        );
        let normalized = &result.context["normalized_applicant"];
        assert_eq!(normalized["first_name"], "JEAN-LUC");
        assert_eq!(normalized["last_name"], "PICARD");
        assert_eq!(normalized["zipcode"], "20500");
    }

    #[tokio::test]
    async fn unverifiable_ssn_is_rejected() {
        let applicant =
            applicant().with_overrides([("ssn".to_string(), "000-00-0000".to_string())]);
        let (result, _) = run(applicant).await;
        assert_eq!(result.errors_for("ssn"), vec!["Unverified SSN."]);
        assert!(result.transaction_id.is_none());
    }

    #[tokio::test]
    async fn ssns_ending_in_6666_are_unverified() {
        for ssn in ["444-55-6666", "900-12-6666"] {
            let applicant = applicant().with_overrides([("ssn".to_string(), ssn.to_string())]);
            let (result, outcome) = run(applicant).await;
            assert!(outcome.is_ok());
            assert_eq!(result.errors_for("ssn"), vec!["Unverified SSN."], "ssn {ssn}");
            assert!(!result.success());
        }
    }

    #[tokio::test]
    async fn time_exception_is_a_timeout() {
        let applicant =
            applicant().with_overrides([("first_name".to_string(), "Time Exception".to_string())]);
        let (_, outcome) = run(applicant).await;
        assert!(outcome.expect_err("times out").is_timeout());
    }
}

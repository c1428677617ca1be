use async_trait::async_trait;

use crate::proofing::adapter::ProoferAdapter;
use crate::proofing::applicant::Applicant;
use crate::proofing::result::{ProofingFault, ProofingResult};
use crate::proofing::stage::Stage;

/// State-issued identity document check against a fake motor vehicle registry.
pub struct StateIdMock;

impl StateIdMock {
    pub const VENDOR_NAME: &'static str = "StateIdMock";
    pub const TRANSACTION_ID: &'static str = "state-id-mock-transaction-id-456";
    pub const INVALID_STATE_ID_NUMBER: &'static str = "000000000";
    pub const SUPPORTED_JURISDICTIONS: [&'static str; 8] =
        ["AZ", "DC", "DE", "MD", "VA", "WA", "WI", "WY"];
}

#[async_trait]
impl ProoferAdapter for StateIdMock {
    fn vendor_name(&self) -> &'static str {
        Self::VENDOR_NAME
    }

    fn stage(&self) -> Stage {
        Stage::StateId
    }

    fn required_attributes(&self) -> &'static [&'static str] {
        &["state_id_number", "state_id_type", "state_id_jurisdiction"]
    }

    async fn proof(
        &self,
        applicant: &Applicant,
        result: &mut ProofingResult,
    ) -> Result<(), ProofingFault> {
        let jurisdiction = applicant
            .get("state_id_jurisdiction")
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();
        if !Self::SUPPORTED_JURISDICTIONS.contains(&jurisdiction.as_str()) {
            result.add_message("unsupported jurisdiction");
            result.add_error(
                "state_id_jurisdiction",
                "The jurisdiction could not be verified",
            );
            return Ok(());
        }

        if applicant.get("state_id_number").map(str::trim) == Some(Self::INVALID_STATE_ID_NUMBER) {
            result.add_message("invalid state id number");
            result.add_error(
                "state_id_number",
                "The state ID number could not be verified",
            );
            return Ok(());
        }

        result
            .add_message("valid state ID")
            .set_transaction_id(Self::TRANSACTION_ID);
        Ok(())
    }
}

use async_trait::async_trait;

use crate::proofing::adapter::ProoferAdapter;
use crate::proofing::applicant::Applicant;
use crate::proofing::result::{ProofingFault, ProofingResult};
use crate::proofing::stage::Stage;

/// Address-of-record confirmation keyed on the applicant's phone.
pub struct AddressMock;

impl AddressMock {
    pub const VENDOR_NAME: &'static str = "AddressMock";
    pub const TRANSACTION_ID: &'static str = "address-mock-transaction-id-123";
    pub const UNVERIFIABLE_PHONE_NUMBER: &'static str = "7035555555";
    pub const PROOFER_TIMEOUT_PHONE_NUMBER: &'static str = "7035555888";
    pub const FAILED_TO_CONTACT_PHONE_NUMBER: &'static str = "7035555999";
}

#[async_trait]
impl ProoferAdapter for AddressMock {
    fn vendor_name(&self) -> &'static str {
        Self::VENDOR_NAME
    }

    fn stage(&self) -> Stage {
        Stage::Address
    }

    fn required_attributes(&self) -> &'static [&'static str] {
        &["phone"]
    }

    async fn proof(
        &self,
        applicant: &Applicant,
        result: &mut ProofingResult,
    ) -> Result<(), ProofingFault> {
        let phone = super::phone::digits(applicant.get("phone").unwrap_or_default());

        match phone.as_str() {
            Self::FAILED_TO_CONTACT_PHONE_NUMBER => {
                Err(ProofingFault::vendor("Failed to contact proofing vendor"))
            }
            Self::PROOFER_TIMEOUT_PHONE_NUMBER => {
                Err(ProofingFault::timeout("address mock timeout"))
            }
            Self::UNVERIFIABLE_PHONE_NUMBER => {
                result.add_message("Bad address");
                result.add_error("phone", "The phone number could not be verified.");
                Ok(())
            }
            _ => {
                result
                    .add_message("Good address")
                    .set_transaction_id(Self::TRANSACTION_ID);
                Ok(())
            }
        }
    }
}

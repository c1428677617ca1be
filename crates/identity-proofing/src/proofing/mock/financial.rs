use async_trait::async_trait;

use crate::proofing::adapter::ProoferAdapter;
use crate::proofing::applicant::Applicant;
use crate::proofing::result::{ProofingFault, ProofingResult};
use crate::proofing::stage::Stage;

pub struct FinancialMock;

impl FinancialMock {
    pub const VENDOR_NAME: &'static str = "FinancialMock";
    pub const TRANSACTION_ID: &'static str = "financial-mock-transaction-id-321";
    pub const UNVERIFIABLE_CCN: &'static str = "00000000";
}

#[async_trait]
impl ProoferAdapter for FinancialMock {
    fn vendor_name(&self) -> &'static str {
        Self::VENDOR_NAME
    }

    fn stage(&self) -> Stage {
        Stage::Financial
    }

    fn required_attributes(&self) -> &'static [&'static str] {
        &["ccn"]
    }

    async fn proof(
        &self,
        applicant: &Applicant,
        result: &mut ProofingResult,
    ) -> Result<(), ProofingFault> {
        if applicant.get("ccn").map(str::trim) == Some(Self::UNVERIFIABLE_CCN) {
            result.add_message("Bad number");
            result.add_error("ccn", "The ccn could not be verified.");
        } else {
            result
                .add_message("Good number")
                .set_transaction_id(Self::TRANSACTION_ID);
        }
        Ok(())
    }
}

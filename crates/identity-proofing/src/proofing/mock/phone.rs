use async_trait::async_trait;

use crate::proofing::adapter::ProoferAdapter;
use crate::proofing::applicant::Applicant;
use crate::proofing::result::{ProofingFault, ProofingResult};
use crate::proofing::stage::Stage;

/// Phone ownership check.
pub struct PhoneMock;

impl PhoneMock {
    pub const VENDOR_NAME: &'static str = "PhoneMock";
    pub const TRANSACTION_ID: &'static str = "phone-mock-transaction-id-789";
    pub const PROOFER_TIMEOUT_PHONE_NUMBER: &'static str = "5555550999";

    /// A number made of a single repeated digit (e.g. `5555555555`) never verifies.
    pub fn is_unverifiable(phone: &str) -> bool {
        let mut digits = phone.chars();
        match digits.next() {
            Some(first) => digits.all(|digit| digit == first),
            None => false,
        }
    }
}

pub(super) fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[async_trait]
impl ProoferAdapter for PhoneMock {
    fn vendor_name(&self) -> &'static str {
        Self::VENDOR_NAME
    }

    fn stage(&self) -> Stage {
        Stage::Phone
    }

    fn required_attributes(&self) -> &'static [&'static str] {
        &["phone"]
    }

    async fn proof(
        &self,
        applicant: &Applicant,
        result: &mut ProofingResult,
    ) -> Result<(), ProofingFault> {
        let phone = digits(applicant.get("phone").unwrap_or_default());

        if phone == Self::PROOFER_TIMEOUT_PHONE_NUMBER {
            return Err(ProofingFault::timeout("phone mock timeout"));
        }

        if Self::is_unverifiable(&phone) {
            result.add_message("Bad number");
            result.add_error("phone", "The phone number could not be verified.");
        } else {
            result
                .add_message("Good number")
                .set_transaction_id(Self::TRANSACTION_ID);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_digits_are_unverifiable() {
        assert!(PhoneMock::is_unverifiable("5555555555"));
        assert!(PhoneMock::is_unverifiable(&digits("(222) 222-2222")));
        assert!(!PhoneMock::is_unverifiable("5555550000"));
        assert!(!PhoneMock::is_unverifiable(""));
    }
}

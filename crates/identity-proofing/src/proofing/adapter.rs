use std::time::Duration;

use async_trait::async_trait;

use super::applicant::Applicant;
use super::result::{ProofingFault, ProofingResult};
use super::stage::Stage;

/// A vendor-specific (or mock) verifier for exactly one stage.
///
/// `proof` signals success by recording nothing, a rejection through
/// [`ProofingResult::add_error`], and an inability to complete the call by returning a
/// [`ProofingFault`]. The agent only calls `proof` once every required attribute is present.
#[async_trait]
pub trait ProoferAdapter: Send + Sync {
    fn vendor_name(&self) -> &'static str;

    fn stage(&self) -> Stage;

    fn required_attributes(&self) -> &'static [&'static str];

    /// Per-adapter bound on a single call; `None` falls back to the configured default.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    async fn proof(
        &self,
        applicant: &Applicant,
        result: &mut ProofingResult,
    ) -> Result<(), ProofingFault>;
}

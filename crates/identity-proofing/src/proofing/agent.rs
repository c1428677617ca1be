use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::applicant::Applicant;
use super::registry::AdapterRegistry;
use super::result::{ProofingFault, ProofingResult};
use super::stage::Stage;

/// Resolves the adapter for a `(stage, vendor)` pair and runs it, folding every adapter-level
/// failure into the returned [`ProofingResult`].
#[derive(Debug, Clone)]
pub struct ProofingAgent {
    registry: Arc<AdapterRegistry>,
    default_timeout: Duration,
}

/// Orchestration failures the agent cannot express as a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("no adapter registered for stage '{stage}' and vendor '{vendor}'")]
    UnknownAdapter { stage: Stage, vendor: String },
}

impl ProofingAgent {
    pub fn new(registry: Arc<AdapterRegistry>, default_timeout: Duration) -> Self {
        Self {
            registry,
            default_timeout,
        }
    }

    pub async fn proof(
        &self,
        stage: Stage,
        vendor: &str,
        applicant: &Applicant,
    ) -> Result<ProofingResult, AgentError> {
        let adapter = self
            .registry
            .get(stage, vendor)
            .ok_or_else(|| AgentError::UnknownAdapter {
                stage,
                vendor: vendor.to_string(),
            })?;

        let mut result = ProofingResult::new();

        let missing = applicant.missing(adapter.required_attributes());
        if !missing.is_empty() {
            debug!(%stage, vendor, ?missing, "applicant missing required attributes");
            result.exception = Some(ProofingFault::Validation {
                missing: missing.into_iter().map(str::to_string).collect(),
            });
            return Ok(result);
        }

        let limit = adapter.timeout().unwrap_or(self.default_timeout);
        let outcome = tokio::time::timeout(limit, adapter.proof(applicant, &mut result)).await;

        let fault = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(fault)) => Some(fault),
            Err(_) => Some(ProofingFault::elapsed(limit)),
        };

        if let Some(fault) = fault {
            warn!(
                %stage,
                vendor = adapter.vendor_name(),
                timed_out = fault.is_timeout(),
                error = %fault,
                "proofing adapter faulted"
            );
            result.exception = Some(fault);
        } else {
            debug!(
                %stage,
                vendor = adapter.vendor_name(),
                success = result.success(),
                "proofing adapter finished"
            );
        }

        Ok(result)
    }
}

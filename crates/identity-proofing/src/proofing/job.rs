use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::config::ProofingConfig;

use super::agent::{AgentError, ProofingAgent};
use super::applicant::Applicant;
use super::result::ProofingResult;
use super::stage::Stage;
use super::store::{ResultId, ResultStore, StoreError};
use super::vendor_result::VendorResult;

/// Unit of work handed to whatever executes a proofing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub result_id: ResultId,
    #[serde(default)]
    pub vendor_params: Value,
    pub applicant_json: String,
    #[serde(default)]
    pub vendor_session_id: Option<String>,
}

impl JobPayload {
    pub fn new(result_id: ResultId, applicant: &Applicant) -> Result<Self, JobFault> {
        Ok(Self {
            result_id,
            vendor_params: Value::Null,
            applicant_json: applicant.to_json().map_err(JobFault::Payload)?,
            vendor_session_id: None,
        })
    }

    pub fn with_vendor_params(mut self, vendor_params: Value) -> Self {
        self.vendor_params = vendor_params;
        self
    }

    pub fn with_session_id(mut self, vendor_session_id: Option<String>) -> Self {
        self.vendor_session_id = vendor_session_id;
        self
    }

    pub fn applicant(&self) -> Result<Applicant, JobFault> {
        Applicant::from_json(&self.applicant_json).map_err(JobFault::Payload)
    }
}

/// Failures of the orchestration itself. This is the only error that leaves a job, and only
/// after the `job_failed` sentinel has been written for the payload's result id.
#[derive(Debug, thiserror::Error)]
pub enum JobFault {
    #[error("job payload could not be decoded: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("vendor params for stage '{stage}' are invalid: {source}")]
    VendorParams {
        stage: Stage,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResolutionParams {
    #[serde(default)]
    pub should_proof_state_id: bool,
    #[serde(default)]
    pub state_id_jurisdiction: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StateIdParams {
    #[serde(default)]
    pub state_id_jurisdiction: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PhoneParams {
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FinancialParams {
    #[serde(default)]
    pub ccn: Option<String>,
}

/// Per-stage job variant; each one knows how to verify an applicant with its vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageJob {
    Resolution(ResolutionParams),
    StateId(StateIdParams),
    Address,
    Phone(PhoneParams),
    Financial(FinancialParams),
}

impl StageJob {
    pub fn decode(stage: Stage, vendor_params: &Value) -> Result<Self, JobFault> {
        Ok(match stage {
            Stage::Resolution => Self::Resolution(params(stage, vendor_params)?),
            Stage::StateId => Self::StateId(params(stage, vendor_params)?),
            Stage::Address => Self::Address,
            Stage::Phone => Self::Phone(params(stage, vendor_params)?),
            Stage::Financial => Self::Financial(params(stage, vendor_params)?),
        })
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Resolution(_) => Stage::Resolution,
            Self::StateId(_) => Stage::StateId,
            Self::Address => Stage::Address,
            Self::Phone(_) => Stage::Phone,
            Self::Financial(_) => Stage::Financial,
        }
    }

    async fn execute(
        &self,
        verifier: &StageVerifier,
        applicant: &Applicant,
    ) -> Result<VendorResult, JobFault> {
        match self {
            Self::Resolution(params) => {
                let resolution = verifier.run(Stage::Resolution, applicant).await?;
                let mut outcome = VendorResult::from_proofing(&resolution);
                outcome.normalized_applicant = normalized_applicant(&resolution);

                if params.should_proof_state_id && resolution.success() {
                    let applicant = overlay(
                        applicant,
                        [("state_id_jurisdiction", &params.state_id_jurisdiction)],
                    );
                    let state_id = verifier.run(Stage::StateId, &applicant).await?;
                    outcome.merge(VendorResult::from_proofing(&state_id));
                }
                Ok(outcome)
            }
            Self::StateId(params) => {
                let applicant = overlay(
                    applicant,
                    [("state_id_jurisdiction", &params.state_id_jurisdiction)],
                );
                verifier.project(Stage::StateId, &applicant).await
            }
            Self::Address => verifier.project(Stage::Address, applicant).await,
            Self::Phone(params) => {
                let applicant = overlay(applicant, [("phone", &params.phone)]);
                verifier.project(Stage::Phone, &applicant).await
            }
            Self::Financial(params) => {
                let applicant = overlay(applicant, [("ccn", &params.ccn)]);
                verifier.project(Stage::Financial, &applicant).await
            }
        }
    }
}

fn params<T>(stage: Stage, vendor_params: &Value) -> Result<T, JobFault>
where
    T: DeserializeOwned + Default,
{
    match vendor_params {
        Value::Null => Ok(T::default()),
        value => serde_json::from_value(value.clone())
            .map_err(|source| JobFault::VendorParams { stage, source }),
    }
}

fn overlay<const N: usize>(
    applicant: &Applicant,
    overrides: [(&str, &Option<String>); N],
) -> Applicant {
    applicant.with_overrides(overrides.into_iter().filter_map(|(field, value)| {
        value
            .as_ref()
            .map(|value| (field.to_string(), value.clone()))
    }))
}

fn normalized_applicant(result: &ProofingResult) -> Option<Applicant> {
    if !result.success() {
        return None;
    }
    result
        .context
        .get("normalized_applicant")
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

/// Runs stage verification without persisting anything. Shared by the in-process job and by
/// delegated executors so both produce the same [`VendorResult`].
#[derive(Debug, Clone)]
pub struct StageVerifier {
    agent: ProofingAgent,
    vendors: Arc<BTreeMap<Stage, String>>,
}

impl StageVerifier {
    pub fn new(agent: ProofingAgent, config: &ProofingConfig) -> Self {
        Self {
            agent,
            vendors: Arc::new(config.vendors.clone()),
        }
    }

    pub fn vendor_for(&self, stage: Stage) -> &str {
        self.vendors
            .get(&stage)
            .map(String::as_str)
            .unwrap_or(crate::config::MOCK_VENDOR)
    }

    /// Decode the payload and verify it for `stage`.
    pub async fn verify(
        &self,
        stage: Stage,
        payload: &JobPayload,
    ) -> Result<VendorResult, JobFault> {
        let job = StageJob::decode(stage, &payload.vendor_params)?;
        let applicant = payload.applicant()?;
        let outcome = job.execute(self, &applicant).await?;
        Ok(outcome.with_session_id(payload.vendor_session_id.clone()))
    }

    async fn run(&self, stage: Stage, applicant: &Applicant) -> Result<ProofingResult, JobFault> {
        Ok(self
            .agent
            .proof(stage, self.vendor_for(stage), applicant)
            .await?)
    }

    async fn project(
        &self,
        stage: Stage,
        applicant: &Applicant,
    ) -> Result<VendorResult, JobFault> {
        let result = self.run(stage, applicant).await?;
        Ok(VendorResult::from_proofing(&result))
    }
}

/// In-process job: verifies and persists under the payload's result id.
pub struct ProofingJob<S> {
    verifier: StageVerifier,
    store: Arc<S>,
}

impl<S> ProofingJob<S>
where
    S: ResultStore + 'static,
{
    pub fn new(verifier: StageVerifier, store: Arc<S>) -> Self {
        Self { verifier, store }
    }

    pub fn verifier(&self) -> &StageVerifier {
        &self.verifier
    }

    /// Run the stage and store its result. On a [`JobFault`], including a failed store of the
    /// result itself, the `job_failed` sentinel is written first (best effort) and the original
    /// fault is returned to the caller.
    pub async fn perform(
        &self,
        stage: Stage,
        payload: JobPayload,
    ) -> Result<VendorResult, JobFault> {
        let outcome = self
            .perform_identity_proofing(stage, &payload)
            .await
            .and_then(|result| {
                self.store_result(&payload.result_id, result.clone())
                    .map(|()| result)
            });

        match outcome {
            Ok(result) => {
                info!(
                    result_id = %payload.result_id,
                    %stage,
                    success = result.success,
                    timed_out = result.timed_out,
                    "proofing result stored"
                );
                Ok(result)
            }
            Err(fault) => {
                let sentinel = VendorResult::job_failed();
                if let Err(store_err) = self.store_result(&payload.result_id, sentinel) {
                    error!(
                        result_id = %payload.result_id,
                        %stage,
                        error = %store_err,
                        "failed to store job_failed sentinel"
                    );
                }
                error!(
                    result_id = %payload.result_id,
                    %stage,
                    error = %fault,
                    "proofing job failed"
                );
                Err(fault)
            }
        }
    }

    async fn perform_identity_proofing(
        &self,
        stage: Stage,
        payload: &JobPayload,
    ) -> Result<VendorResult, JobFault> {
        self.verifier.verify(stage, payload).await
    }

    fn store_result(&self, result_id: &ResultId, result: VendorResult) -> Result<(), JobFault> {
        self.store.store(result_id, result)?;
        Ok(())
    }
}

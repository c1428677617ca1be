use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::ProofingConfig;

use super::agent::ProofingAgent;
use super::applicant::Applicant;
use super::callback::{CallbackBody, CallbackError, CallbackReceiver};
use super::job::{JobFault, JobPayload, ProofingJob, StageVerifier};
use super::poller::{PollError, PollOutcome, PollPolicy, ResultPoller};
use super::registry::AdapterRegistry;
use super::stage::Stage;
use super::store::{ResultId, ResultStore, StoreError};
use super::topology::{
    DelegatedExecutor, DelegatedWorker, DispatchError, ExecutionTopology, ProofingDispatcher,
};
use super::vendor_result::VendorResult;

/// Request to start proofing one stage for an applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofingRequest {
    pub applicant: Applicant,
    #[serde(default)]
    pub vendor_params: Value,
    #[serde(default)]
    pub vendor_session_id: Option<String>,
}

impl ProofingRequest {
    pub fn new(applicant: Applicant) -> Self {
        Self {
            applicant,
            vendor_params: Value::Null,
            vendor_session_id: None,
        }
    }

    pub fn with_vendor_params(mut self, vendor_params: Value) -> Self {
        self.vendor_params = vendor_params;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProofingServiceError {
    #[error(transparent)]
    Job(#[from] JobFault),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Callback(#[from] CallbackError),
    #[error("proofing callbacks are not enabled")]
    CallbacksDisabled,
}

/// Service composing the dispatcher, the result poller and the callback receiver over one
/// shared result store.
pub struct ProofingService<S> {
    job: Arc<ProofingJob<S>>,
    dispatcher: ProofingDispatcher<S>,
    poller: ResultPoller<S>,
    callbacks: Option<Arc<CallbackReceiver<S>>>,
    callback_token: Option<String>,
}

impl<S> ProofingService<S>
where
    S: ResultStore + 'static,
{
    pub fn from_config(
        config: &ProofingConfig,
        registry: Arc<AdapterRegistry>,
        store: Arc<S>,
        executor: Option<Arc<dyn DelegatedExecutor>>,
    ) -> Self {
        let agent = ProofingAgent::new(registry, config.vendor_timeout);
        let verifier = StageVerifier::new(agent, config);
        let job = Arc::new(ProofingJob::new(verifier, store.clone()));
        let dispatcher = ProofingDispatcher::new(config.execution, job.clone(), executor);
        let policy = PollPolicy::with_ceiling(config.poll_ceiling);
        let poller = ResultPoller::new(store.clone(), policy);
        let callbacks = config
            .callback_token
            .as_ref()
            .map(|token| Arc::new(CallbackReceiver::new(token.clone(), store)));

        Self {
            job,
            dispatcher,
            poller,
            callbacks,
            callback_token: config.callback_token.clone(),
        }
    }

    pub fn topology(&self) -> ExecutionTopology {
        self.dispatcher.topology()
    }

    /// Mint a result id and start the job. Returns as soon as the job is handed off.
    pub fn submit(
        &self,
        stage: Stage,
        request: ProofingRequest,
    ) -> Result<ResultId, ProofingServiceError> {
        let result_id = ResultId::mint();
        let payload = JobPayload::new(result_id.clone(), &request.applicant)?
            .with_vendor_params(request.vendor_params)
            .with_session_id(request.vendor_session_id);
        self.dispatcher.dispatch(stage, payload)?;
        info!(%result_id, %stage, topology = ?self.topology(), "proofing job dispatched");
        Ok(result_id)
    }

    /// Run the job to completion on the caller's task, bypassing the topology switch.
    pub async fn run_inline(
        &self,
        stage: Stage,
        request: ProofingRequest,
    ) -> Result<(ResultId, VendorResult), ProofingServiceError> {
        let result_id = ResultId::mint();
        let payload = JobPayload::new(result_id.clone(), &request.applicant)?
            .with_vendor_params(request.vendor_params)
            .with_session_id(request.vendor_session_id);
        let result = self.job.perform(stage, payload).await?;
        Ok((result_id, result))
    }

    pub fn result(&self, result_id: &ResultId) -> Result<PollOutcome, ProofingServiceError> {
        Ok(self.poller.load(result_id)?)
    }

    pub async fn wait_for_result(
        &self,
        result_id: &ResultId,
    ) -> Result<VendorResult, ProofingServiceError> {
        Ok(self.poller.wait(result_id).await?)
    }

    /// Authenticate a raw executor callback, then decode and store it.
    pub fn receive_callback(
        &self,
        token: Option<&str>,
        stage: Stage,
        raw: &[u8],
    ) -> Result<ResultId, ProofingServiceError> {
        let callbacks = self.callbacks()?;
        callbacks.authorize(token, stage)?;
        let body = CallbackBody::from_slice(raw)?;
        Ok(callbacks.receive(token, stage, body)?)
    }

    fn callbacks(&self) -> Result<&CallbackReceiver<S>, ProofingServiceError> {
        self.callbacks
            .as_deref()
            .ok_or(ProofingServiceError::CallbacksDisabled)
    }

    /// Worker that drains a delegated queue and reports back through this service's callback
    /// receiver. `None` when no callback token is configured.
    pub fn delegated_worker(&self) -> Option<DelegatedWorker<S>> {
        let callbacks = self.callbacks.clone()?;
        let token = self.callback_token.clone()?;
        Some(DelegatedWorker::new(
            self.job.verifier().clone(),
            callbacks,
            token,
        ))
    }
}

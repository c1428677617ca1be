use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::callback::{CallbackBody, CallbackReceiver};
use super::job::{JobPayload, ProofingJob, StageVerifier};
use super::stage::Stage;
use super::store::ResultStore;
use super::vendor_result::VendorResult;

/// Where a proofing job runs. Consumers never observe the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTopology {
    InProcess,
    Delegated,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown execution topology '{0}'")]
pub struct UnknownTopology(pub String);

impl FromStr for ExecutionTopology {
    type Err = UnknownTopology;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_process" | "inline" | "local" => Ok(Self::InProcess),
            "delegated" | "remote" => Ok(Self::Delegated),
            _ => Err(UnknownTopology(value.to_string())),
        }
    }
}

/// A job as enqueued for an external executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub stage: Stage,
    pub payload: JobPayload,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("delegated execution selected but no executor is configured")]
    NoExecutor,
    #[error("delegated executor is unavailable")]
    ExecutorClosed,
}

/// Hands work to an executor outside this process. The result comes back through the
/// callback receiver.
pub trait DelegatedExecutor: Send + Sync {
    fn enqueue(&self, envelope: JobEnvelope) -> Result<(), DispatchError>;
}

/// Channel-backed executor queue; the receiving half is drained by [`DelegatedWorker`].
#[derive(Debug, Clone)]
pub struct QueueExecutor {
    sender: mpsc::UnboundedSender<JobEnvelope>,
}

impl QueueExecutor {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JobEnvelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl DelegatedExecutor for QueueExecutor {
    fn enqueue(&self, envelope: JobEnvelope) -> Result<(), DispatchError> {
        self.sender
            .send(envelope)
            .map_err(|_| DispatchError::ExecutorClosed)
    }
}

/// Single decision point between running a job here and handing it off.
pub struct ProofingDispatcher<S> {
    topology: ExecutionTopology,
    job: Arc<ProofingJob<S>>,
    executor: Option<Arc<dyn DelegatedExecutor>>,
}

impl<S> ProofingDispatcher<S>
where
    S: ResultStore + 'static,
{
    pub fn new(
        topology: ExecutionTopology,
        job: Arc<ProofingJob<S>>,
        executor: Option<Arc<dyn DelegatedExecutor>>,
    ) -> Self {
        Self {
            topology,
            job,
            executor,
        }
    }

    pub fn topology(&self) -> ExecutionTopology {
        self.topology
    }

    /// Start the job and return without waiting for its result.
    pub fn dispatch(&self, stage: Stage, payload: JobPayload) -> Result<(), DispatchError> {
        match self.topology {
            ExecutionTopology::InProcess => {
                let job = self.job.clone();
                tokio::spawn(async move {
                    // the sentinel is already stored; nothing retries in-process work
                    let _ = job.perform(stage, payload).await;
                });
                Ok(())
            }
            ExecutionTopology::Delegated => {
                let executor = self.executor.as_ref().ok_or(DispatchError::NoExecutor)?;
                executor.enqueue(JobEnvelope { stage, payload })
            }
        }
    }
}

/// Executor-side loop: verifies each envelope with the same [`StageVerifier`] the in-process
/// job uses and delivers the outcome through the callback receiver.
pub struct DelegatedWorker<S> {
    verifier: StageVerifier,
    callbacks: Arc<CallbackReceiver<S>>,
    token: String,
}

impl<S> DelegatedWorker<S>
where
    S: ResultStore + 'static,
{
    pub fn new(
        verifier: StageVerifier,
        callbacks: Arc<CallbackReceiver<S>>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            callbacks,
            token: token.into(),
        }
    }

    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<JobEnvelope>) {
        while let Some(envelope) = receiver.recv().await {
            self.execute(envelope).await;
        }
        info!("delegated proofing worker stopped");
    }

    /// Verify one envelope and deliver its result. A job fault is delivered as the
    /// `job_failed` sentinel, matching what the in-process job stores.
    pub async fn execute(&self, envelope: JobEnvelope) {
        let JobEnvelope { stage, payload } = envelope;
        let result_id = &payload.result_id;
        let result = match self.verifier.verify(stage, &payload).await {
            Ok(result) => result,
            Err(fault) => {
                error!(%result_id, %stage, error = %fault, "delegated proofing failed");
                VendorResult::job_failed()
            }
        };

        let body = match CallbackBody::for_stage(stage, result_id, &result) {
            Ok(body) => body,
            Err(err) => {
                error!(%result_id, %stage, error = %err, "callback body unserializable");
                return;
            }
        };
        if let Err(err) = self.callbacks.receive(Some(&self.token), stage, body) {
            warn!(%result_id, %stage, error = %err, "callback delivery rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_topology_names() {
        assert_eq!("in_process".parse(), Ok(ExecutionTopology::InProcess));
        assert_eq!("Delegated".parse(), Ok(ExecutionTopology::Delegated));
        assert_eq!(
            "lambda".parse::<ExecutionTopology>(),
            Err(UnknownTopology("lambda".to_string()))
        );
    }
}

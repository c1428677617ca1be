//! Identity-proofing execution core.
//!
//! An applicant is verified one stage at a time by a vendor adapter. Jobs run either inside
//! this process or on a delegated executor that reports back over the callback endpoint;
//! both paths write the same [`VendorResult`] into the shared result store, keyed by a
//! [`ResultId`] the caller polls.

pub mod adapter;
pub mod agent;
pub mod applicant;
pub mod callback;
pub mod job;
pub mod mock;
pub mod poller;
pub mod registry;
pub mod result;
pub mod router;
pub mod service;
pub mod stage;
pub mod store;
pub mod topology;
pub mod vendor_result;

#[cfg(test)]
mod tests;

pub use adapter::ProoferAdapter;
pub use agent::{AgentError, ProofingAgent};
pub use applicant::Applicant;
pub use callback::{CallbackBody, CallbackError, CallbackReceiver};
pub use job::{JobFault, JobPayload, ProofingJob, StageJob, StageVerifier};
pub use poller::{PollError, PollOutcome, PollPolicy, ResultPoller};
pub use registry::AdapterRegistry;
pub use result::{ProofingFault, ProofingResult};
pub use router::proofing_router;
pub use service::{ProofingRequest, ProofingService, ProofingServiceError};
pub use stage::{Stage, UnknownStage};
pub use store::{
    FileResultStore, InMemoryResultStore, ResultEntry, ResultId, ResultStore, StoreError,
};
pub use topology::{
    DelegatedExecutor, DelegatedWorker, DispatchError, ExecutionTopology, JobEnvelope,
    ProofingDispatcher, QueueExecutor, UnknownTopology,
};
pub use vendor_result::{FieldErrors, VendorResult, JOB_FAILED};

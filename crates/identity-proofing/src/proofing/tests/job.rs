use super::common::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::proofing::job::{JobFault, JobPayload, ProofingJob, StageJob, StageVerifier};
use crate::proofing::mock::{ResolutionMock, StateIdMock};
use crate::proofing::registry::AdapterRegistry;
use crate::proofing::stage::Stage;
use crate::proofing::store::{
    InMemoryResultStore, ResultEntry, ResultId, ResultStore, StoreError,
};
use crate::proofing::vendor_result::{VendorResult, JOB_FAILED};

fn job(store: Arc<InMemoryResultStore>) -> ProofingJob<InMemoryResultStore> {
    ProofingJob::new(verifier(), store)
}

fn payload() -> JobPayload {
    JobPayload::new(ResultId::mint(), &applicant()).expect("payload")
}

#[tokio::test]
async fn successful_jobs_store_the_projected_result() {
    let store = store();
    let payload = payload().with_session_id(Some("session-1".to_string()));
    let result_id = payload.result_id.clone();

    let result = job(store.clone())
        .perform(Stage::Phone, payload)
        .await
        .expect("job succeeds");

    assert!(result.success);
    assert_eq!(result.reasons, vec!["Good number".to_string()]);
    assert_eq!(result.session_id.as_deref(), Some("session-1"));

    let stored = store.load(&result_id).expect("loads").expect("stored");
    assert_eq!(stored.result, result);
}

#[tokio::test]
async fn adapter_failures_are_results_not_job_faults() {
    let store = store();
    let payload = JobPayload::new(
        ResultId::mint(),
        &applicant_with("first_name", "Failington"),
    )
    .expect("payload");
    let result_id = payload.result_id.clone();

    let result = job(store.clone())
        .perform(Stage::Resolution, payload)
        .await
        .expect("job completes");

    assert!(!result.success);
    assert!(!result.is_job_failed());
    assert_eq!(
        result.messages_for("base"),
        &["Failed to contact proofing vendor".to_string()]
    );
    assert!(store.load(&result_id).expect("loads").is_some());
}

#[tokio::test]
async fn malformed_applicant_json_stores_the_sentinel() {
    let store = store();
    let mut payload = payload();
    payload.applicant_json = "{not json".to_string();
    let result_id = payload.result_id.clone();

    let fault = job(store.clone())
        .perform(Stage::Address, payload)
        .await
        .expect_err("payload is unreadable");
    assert!(matches!(fault, JobFault::Payload(_)));

    let stored = store.load(&result_id).expect("loads").expect("sentinel");
    assert!(stored.result.is_job_failed());
    assert!(!stored.result.success);
    let raw = serde_json::to_value(&stored.result).expect("serializes");
    assert_eq!(raw["errors"][JOB_FAILED], true);
}

#[tokio::test]
async fn unregistered_vendor_stores_the_sentinel() {
    let store = store();
    let mut config = config();
    config.vendors.insert(Stage::Financial, "acme".to_string());
    let verifier = StageVerifier::new(agent(AdapterRegistry::with_mocks()), &config);
    let job = ProofingJob::new(verifier, store.clone());
    let payload = payload();
    let result_id = payload.result_id.clone();

    let fault = job
        .perform(Stage::Financial, payload)
        .await
        .expect_err("no adapter");
    assert!(matches!(fault, JobFault::Agent(_)));

    let stored = store.load(&result_id).expect("loads").expect("sentinel");
    assert!(stored.result.is_job_failed());
}

#[tokio::test]
async fn invalid_vendor_params_store_the_sentinel() {
    let store = store();
    let payload = payload().with_vendor_params(json!({ "phone": 5 }));
    let result_id = payload.result_id.clone();

    let fault = job(store.clone())
        .perform(Stage::Phone, payload)
        .await
        .expect_err("params do not decode");
    assert!(matches!(
        fault,
        JobFault::VendorParams {
            stage: Stage::Phone,
            ..
        }
    ));
    assert!(store
        .load(&result_id)
        .expect("loads")
        .expect("sentinel")
        .result
        .is_job_failed());
}

/// Rejects its first write, then behaves like the in-memory store.
struct FlakyStore {
    inner: InMemoryResultStore,
    writes: AtomicUsize,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryResultStore::new(TTL),
            writes: AtomicUsize::new(0),
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ResultStore for FlakyStore {
    fn store(&self, result_id: &ResultId, result: VendorResult) -> Result<(), StoreError> {
        if self.writes.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.store(result_id, result)
    }

    fn load(&self, result_id: &ResultId) -> Result<Option<ResultEntry>, StoreError> {
        self.inner.load(result_id)
    }
}

#[tokio::test]
async fn failed_result_write_falls_back_to_the_sentinel() {
    let store = Arc::new(FlakyStore::new());
    let job = ProofingJob::new(verifier(), store.clone());
    let payload = payload();
    let result_id = payload.result_id.clone();

    let fault = job
        .perform(Stage::Phone, payload)
        .await
        .expect_err("first write fails");
    assert!(matches!(fault, JobFault::Store(StoreError::Unavailable(_))));

    assert_eq!(store.writes(), 2);
    let stored = store.load(&result_id).expect("loads").expect("sentinel");
    assert!(stored.result.is_job_failed());
}

#[tokio::test]
async fn resolution_chains_state_id_when_requested() {
    let payload = payload().with_vendor_params(json!({
        "should_proof_state_id": true,
        "state_id_jurisdiction": "MD",
    }));

    let result = verifier()
        .verify(Stage::Resolution, &payload)
        .await
        .expect("verifies");

    assert!(result.success);
    assert!(result.reasons.contains(&"Everything looks good".to_string()));
    assert!(result.reasons.contains(&"valid state ID".to_string()));
    let normalized = result.normalized_applicant.expect("normalized");
    assert_eq!(normalized.get("first_name"), Some("JEAN-LUC"));
}

#[tokio::test]
async fn chained_state_id_failure_fails_the_resolution() {
    let applicant = applicant_with("state_id_number", StateIdMock::INVALID_STATE_ID_NUMBER);
    let payload = JobPayload::new(ResultId::mint(), &applicant)
        .expect("payload")
        .with_vendor_params(json!({ "should_proof_state_id": true }));

    let result = verifier()
        .verify(Stage::Resolution, &payload)
        .await
        .expect("verifies");

    assert!(!result.success);
    assert!(!result.messages_for("state_id_number").is_empty());
}

#[tokio::test]
async fn state_id_is_skipped_when_resolution_fails() {
    let applicant = applicant_with("ssn", ResolutionMock::UNVERIFIABLE_SSNS[0])
        .with_overrides([("state_id_jurisdiction".to_string(), "TX".to_string())]);
    let payload = JobPayload::new(ResultId::mint(), &applicant)
        .expect("payload")
        .with_vendor_params(json!({ "should_proof_state_id": true }));

    let result = verifier()
        .verify(Stage::Resolution, &payload)
        .await
        .expect("verifies");

    assert!(!result.success);
    assert!(result.messages_for("state_id_jurisdiction").is_empty());
    assert!(result.normalized_applicant.is_none());
}

#[test]
fn stage_params_default_when_absent() {
    for stage in Stage::ALL {
        let job = StageJob::decode(stage, &serde_json::Value::Null).expect("decodes");
        assert_eq!(job.stage(), stage);
    }
}

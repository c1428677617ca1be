use super::common::*;
use serde_json::json;
use std::sync::Arc;

use crate::proofing::job::JobPayload;
use crate::proofing::service::{ProofingRequest, ProofingServiceError};
use crate::proofing::stage::Stage;
use crate::proofing::store::{ResultId, ResultStore};
use crate::proofing::topology::{
    DelegatedExecutor, DispatchError, ExecutionTopology, JobEnvelope, QueueExecutor,
};
use crate::proofing::vendor_result::VendorResult;

async fn run_in_process(stage: Stage, request: ProofingRequest) -> VendorResult {
    let service = service(&config(), store(), None);
    assert_eq!(service.topology(), ExecutionTopology::InProcess);
    let result_id = service.submit(stage, request).expect("dispatched");
    service.wait_for_result(&result_id).await.expect("result")
}

async fn run_delegated(stage: Stage, request: ProofingRequest) -> VendorResult {
    let (executor, receiver) = QueueExecutor::channel();
    let executor: Arc<dyn DelegatedExecutor> = Arc::new(executor);
    let service = service(&delegated_config(), store(), Some(executor));
    let worker = service.delegated_worker().expect("token configured");
    tokio::spawn(worker.run(receiver));

    let result_id = service.submit(stage, request).expect("enqueued");
    service.wait_for_result(&result_id).await.expect("result")
}

#[tokio::test]
async fn both_topologies_store_identical_results() {
    let cases = [
        (Stage::Resolution, ProofingRequest::new(applicant())),
        (
            Stage::Resolution,
            ProofingRequest::new(applicant_with("first_name", "Badlooking")),
        ),
        (
            Stage::Phone,
            ProofingRequest::new(applicant())
                .with_vendor_params(json!({ "phone": "2222222222" })),
        ),
        (Stage::Address, ProofingRequest::new(applicant())),
        (Stage::Financial, ProofingRequest::new(applicant())),
    ];

    for (stage, request) in cases {
        let in_process = run_in_process(stage, request.clone()).await;
        let delegated = run_delegated(stage, request).await;
        assert_eq!(in_process, delegated, "stage {stage}");
    }
}

#[tokio::test]
async fn delegated_job_faults_deliver_the_sentinel() {
    let request =
        ProofingRequest::new(applicant()).with_vendor_params(json!({ "ccn": ["not", "a", "ccn"] }));

    let in_process = run_in_process(Stage::Financial, request.clone()).await;
    let delegated = run_delegated(Stage::Financial, request).await;

    assert!(in_process.is_job_failed());
    assert_eq!(in_process, delegated);
}

#[tokio::test]
async fn delegated_worker_writes_through_the_callback_receiver() {
    let store = store();
    let service = service(&delegated_config(), store.clone(), None);
    let worker = service.delegated_worker().expect("token configured");
    let result_id = ResultId::mint();
    let payload = JobPayload::new(result_id.clone(), &applicant()).expect("payload");

    worker
        .execute(JobEnvelope {
            stage: Stage::Phone,
            payload,
        })
        .await;

    let entry = store.load(&result_id).expect("loads").expect("delivered");
    assert!(entry.result.success);
}

#[tokio::test]
async fn delegated_topology_without_executor_refuses_jobs() {
    let service = service(&delegated_config(), store(), None);
    let err = service
        .submit(Stage::Phone, ProofingRequest::new(applicant()))
        .expect_err("nowhere to send the job");
    assert!(matches!(
        err,
        ProofingServiceError::Dispatch(DispatchError::NoExecutor)
    ));
}

#[tokio::test]
async fn closed_queue_is_reported() {
    let (executor, receiver) = QueueExecutor::channel();
    drop(receiver);
    let executor: Arc<dyn DelegatedExecutor> = Arc::new(executor);
    let service = service(&delegated_config(), store(), Some(executor));

    let err = service
        .submit(Stage::Phone, ProofingRequest::new(applicant()))
        .expect_err("queue closed");
    assert!(matches!(
        err,
        ProofingServiceError::Dispatch(DispatchError::ExecutorClosed)
    ));
}

#[test]
fn no_worker_without_callback_token() {
    let mut config = config();
    config.callback_token = None;
    let service = service(&config, store(), None);
    assert!(service.delegated_worker().is_none());
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::{ProofingConfig, MOCK_VENDOR};
use crate::proofing::adapter::ProoferAdapter;
use crate::proofing::agent::ProofingAgent;
use crate::proofing::applicant::Applicant;
use crate::proofing::job::StageVerifier;
use crate::proofing::registry::AdapterRegistry;
use crate::proofing::result::{ProofingFault, ProofingResult};
use crate::proofing::service::ProofingService;
use crate::proofing::stage::Stage;
use crate::proofing::store::InMemoryResultStore;
use crate::proofing::topology::{DelegatedExecutor, ExecutionTopology};

pub(super) const TOKEN: &str = "callback-secret";
pub(super) const TTL: Duration = Duration::from_secs(900);

pub(super) fn applicant() -> Applicant {
    Applicant::new([
        ("first_name", "Jean-Luc"),
        ("last_name", "Picard"),
        ("dob", "1935-07-13"),
        ("ssn", "900-11-1111"),
        ("address1", "123 Main St"),
        ("city", "Washington"),
        ("state", "DC"),
        ("zipcode", "20500"),
        ("phone", "5555550000"),
        ("state_id_number", "123456789"),
        ("state_id_type", "drivers_license"),
        ("state_id_jurisdiction", "VA"),
        ("ccn", "12345678"),
    ])
}

pub(super) fn applicant_with(field: &str, value: &str) -> Applicant {
    applicant().with_overrides([(field.to_string(), value.to_string())])
}

pub(super) fn config() -> ProofingConfig {
    ProofingConfig {
        callback_token: Some(TOKEN.to_string()),
        vendor_timeout: Duration::from_millis(200),
        ..ProofingConfig::default()
    }
}

pub(super) fn delegated_config() -> ProofingConfig {
    ProofingConfig {
        execution: ExecutionTopology::Delegated,
        ..config()
    }
}

pub(super) fn store() -> Arc<InMemoryResultStore> {
    Arc::new(InMemoryResultStore::new(TTL))
}

pub(super) fn agent(registry: AdapterRegistry) -> ProofingAgent {
    ProofingAgent::new(Arc::new(registry), Duration::from_millis(200))
}

pub(super) fn verifier() -> StageVerifier {
    StageVerifier::new(agent(AdapterRegistry::with_mocks()), &config())
}

pub(super) fn service(
    config: &ProofingConfig,
    store: Arc<InMemoryResultStore>,
    executor: Option<Arc<dyn DelegatedExecutor>>,
) -> Arc<ProofingService<InMemoryResultStore>> {
    Arc::new(ProofingService::from_config(
        config,
        Arc::new(AdapterRegistry::with_mocks()),
        store,
        executor,
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Records how often it is called; always passes.
#[derive(Default)]
pub(super) struct SpyAdapter {
    pub(super) calls: AtomicUsize,
}

impl SpyAdapter {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProoferAdapter for SpyAdapter {
    fn vendor_name(&self) -> &'static str {
        "SpyAdapter"
    }

    fn stage(&self) -> Stage {
        Stage::Resolution
    }

    fn required_attributes(&self) -> &'static [&'static str] {
        &["first_name", "ssn"]
    }

    async fn proof(
        &self,
        _applicant: &Applicant,
        result: &mut ProofingResult,
    ) -> Result<(), ProofingFault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        result.add_message("spy passed");
        Ok(())
    }
}

/// Never answers within any reasonable timeout.
pub(super) struct StalledAdapter;

#[async_trait]
impl ProoferAdapter for StalledAdapter {
    fn vendor_name(&self) -> &'static str {
        "StalledAdapter"
    }

    fn stage(&self) -> Stage {
        Stage::Phone
    }

    fn required_attributes(&self) -> &'static [&'static str] {
        &["phone"]
    }

    fn timeout(&self) -> Option<Duration> {
        Some(Duration::from_millis(20))
    }

    async fn proof(
        &self,
        _applicant: &Applicant,
        _result: &mut ProofingResult,
    ) -> Result<(), ProofingFault> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

pub(super) fn spy_registry(spy: Arc<SpyAdapter>) -> AdapterRegistry {
    let mut registry = AdapterRegistry::with_mocks();
    registry.register("spy", spy);
    registry
}

pub(super) fn mock_vendor() -> &'static str {
    MOCK_VENDOR
}

use identity_proofing::config::ProofingConfig;
use identity_proofing::error::AppError;
use identity_proofing::proofing::{
    AdapterRegistry, FileResultStore, InMemoryResultStore, ResultEntry, ResultId, ResultStore,
    StoreError, VendorResult,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Result store selected by `PROOFING_RESULT_DIR`: a shared directory when set, process memory
/// otherwise.
#[derive(Debug, Clone)]
pub(crate) enum ConfiguredStore {
    Memory(InMemoryResultStore),
    File(FileResultStore),
}

impl ConfiguredStore {
    pub(crate) fn from_config(config: &ProofingConfig) -> Result<Self, AppError> {
        match &config.result_dir {
            Some(dir) => {
                let store = FileResultStore::open(dir, config.result_ttl)?;
                info!(dir = %store.dir().display(), "using file-backed result store");
                Ok(Self::File(store))
            }
            None => Ok(Self::Memory(InMemoryResultStore::new(config.result_ttl))),
        }
    }
}

impl ResultStore for ConfiguredStore {
    fn store(&self, result_id: &ResultId, result: VendorResult) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.store(result_id, result),
            Self::File(store) => store.store(result_id, result),
        }
    }

    fn load(&self, result_id: &ResultId) -> Result<Option<ResultEntry>, StoreError> {
        match self {
            Self::Memory(store) => store.load(result_id),
            Self::File(store) => store.load(result_id),
        }
    }
}

/// Registry of every adapter this binary ships, checked against the configured vendors.
pub(crate) fn adapter_registry(config: &ProofingConfig) -> Result<Arc<AdapterRegistry>, AppError> {
    let registry = AdapterRegistry::with_mocks();
    let unresolved = registry.unresolved(config);
    if !unresolved.is_empty() {
        return Err(AppError::UnresolvedVendors(unresolved));
    }
    Ok(Arc::new(registry))
}

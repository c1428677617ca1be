use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ProofingConfig, MOCK_VENDOR};

use super::adapter::ProoferAdapter;
use super::mock::{AddressMock, FinancialMock, PhoneMock, ResolutionMock, StateIdMock};
use super::stage::Stage;

/// Explicit `(stage, vendor)` -> adapter table, built once at startup.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<(Stage, String), Arc<dyn ProoferAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table containing the reference mocks under the `mock` vendor id.
    pub fn with_mocks() -> Self {
        let mut registry = Self::new();
        registry
            .register(MOCK_VENDOR, Arc::new(AddressMock))
            .register(MOCK_VENDOR, Arc::new(ResolutionMock))
            .register(MOCK_VENDOR, Arc::new(StateIdMock))
            .register(MOCK_VENDOR, Arc::new(FinancialMock))
            .register(MOCK_VENDOR, Arc::new(PhoneMock));
        registry
    }

    /// Adapters are filed under the stage they declare.
    pub fn register(
        &mut self,
        vendor: impl Into<String>,
        adapter: Arc<dyn ProoferAdapter>,
    ) -> &mut Self {
        self.adapters.insert((adapter.stage(), vendor.into()), adapter);
        self
    }

    pub fn get(&self, stage: Stage, vendor: &str) -> Option<Arc<dyn ProoferAdapter>> {
        self.adapters.get(&(stage, vendor.to_string())).cloned()
    }

    /// Stages whose configured vendor has no registered adapter.
    pub fn unresolved(&self, config: &ProofingConfig) -> Vec<(Stage, String)> {
        Stage::ALL
            .into_iter()
            .map(|stage| (stage, config.vendor_for(stage).to_string()))
            .filter(|(stage, vendor)| self.get(*stage, vendor).is_none())
            .collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self
            .adapters
            .iter()
            .map(|((stage, vendor), adapter)| format!("{stage}/{vendor}={}", adapter.vendor_name()))
            .collect();
        keys.sort();
        f.debug_struct("AdapterRegistry")
            .field("adapters", &keys)
            .finish()
    }
}

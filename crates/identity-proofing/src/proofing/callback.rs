use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::stage::Stage;
use super::store::{ResultId, ResultStore, StoreError};
use super::vendor_result::VendorResult;

/// Body posted by a delegated executor: `{"result_id": ..., "<stage>_result": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackBody {
    pub result_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CallbackBody {
    pub fn from_slice(raw: &[u8]) -> Result<Self, CallbackError> {
        serde_json::from_slice(raw).map_err(CallbackError::MalformedBody)
    }

    pub fn for_stage(
        stage: Stage,
        result_id: &ResultId,
        result: &VendorResult,
    ) -> Result<Self, serde_json::Error> {
        let mut fields = Map::new();
        fields.insert(stage.callback_field(), serde_json::to_value(result)?);
        Ok(Self {
            result_id: result_id.to_string(),
            fields,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("callback token missing or invalid")]
    Unauthorized,
    #[error("callback body is malformed: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("invalid result id '{0}'")]
    InvalidResultId(String),
    #[error("callback body is missing '{0}'")]
    MissingResult(String),
    #[error("callback result is malformed: {0}")]
    MalformedResult(#[source] serde_json::Error),
    #[error(transparent)]
    Store(StoreError),
}

/// Accepts results produced outside this process and writes them through the result store.
///
/// Any id that passes validation is accepted; ids are minted by the request path, never here.
/// Redelivery for the same id overwrites the previous entry.
pub struct CallbackReceiver<S> {
    token: String,
    store: Arc<S>,
}

impl<S> CallbackReceiver<S>
where
    S: ResultStore + 'static,
{
    pub fn new(token: impl Into<String>, store: Arc<S>) -> Self {
        Self {
            token: token.into(),
            store,
        }
    }

    /// Checked before the body is read, so an unauthenticated caller learns nothing about it.
    pub fn authorize(&self, token: Option<&str>, stage: Stage) -> Result<(), CallbackError> {
        let authorized = token.is_some_and(|token| tokens_match(token, &self.token));
        if !authorized {
            warn!(%stage, "rejected proofing callback with bad token");
            return Err(CallbackError::Unauthorized);
        }
        Ok(())
    }

    pub fn receive(
        &self,
        token: Option<&str>,
        stage: Stage,
        body: CallbackBody,
    ) -> Result<ResultId, CallbackError> {
        self.authorize(token, stage)?;

        let CallbackBody {
            result_id,
            mut fields,
        } = body;
        let result_id = ResultId::parse(result_id.as_str())
            .map_err(|_| CallbackError::InvalidResultId(result_id))?;

        let field = stage.callback_field();
        let raw = fields
            .remove(&field)
            .ok_or(CallbackError::MissingResult(field))?;
        let result: VendorResult =
            serde_json::from_value(raw).map_err(CallbackError::MalformedResult)?;

        self.store
            .store(&result_id, result)
            .map_err(CallbackError::Store)?;
        info!(%result_id, %stage, "proofing callback stored");
        Ok(result_id)
    }
}

/// Constant-time token comparison; only the length of the expected token can leak.
pub fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

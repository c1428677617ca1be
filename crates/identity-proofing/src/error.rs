use crate::config::ConfigError;
use crate::proofing::callback::CallbackError;
use crate::proofing::poller::PollError;
use crate::proofing::service::ProofingServiceError;
use crate::proofing::stage::{Stage, UnknownStage};
use crate::proofing::store::StoreError;
use crate::proofing::topology::DispatchError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    UnresolvedVendors(Vec<(Stage, String)>),
    UnknownStage(UnknownStage),
    Store(StoreError),
    Proofing(ProofingServiceError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownStage(_) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            AppError::Proofing(err) => proofing_status(err),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::UnresolvedVendors(_)
            | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn proofing_status(err: &ProofingServiceError) -> StatusCode {
    match err {
        ProofingServiceError::Callback(CallbackError::Unauthorized) => StatusCode::UNAUTHORIZED,
        ProofingServiceError::Callback(CallbackError::InvalidResultId(_))
        | ProofingServiceError::Store(StoreError::InvalidId(_)) => StatusCode::BAD_REQUEST,
        ProofingServiceError::Callback(
            CallbackError::MalformedBody(_)
            | CallbackError::MissingResult(_)
            | CallbackError::MalformedResult(_),
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        ProofingServiceError::CallbacksDisabled => StatusCode::NOT_FOUND,
        ProofingServiceError::Dispatch(DispatchError::ExecutorClosed)
        | ProofingServiceError::Dispatch(DispatchError::NoExecutor) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ProofingServiceError::Poll(PollError::TimedOut { .. }) => StatusCode::GATEWAY_TIMEOUT,
        ProofingServiceError::Job(_)
        | ProofingServiceError::Store(_)
        | ProofingServiceError::Poll(_)
        | ProofingServiceError::Callback(CallbackError::Store(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::UnresolvedVendors(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(stage, vendor)| format!("{stage}={vendor}"))
                    .collect();
                write!(f, "no adapter registered for {}", pairs.join(", "))
            }
            AppError::UnknownStage(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Proofing(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::UnresolvedVendors(_) => None,
            AppError::UnknownStage(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Proofing(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<UnknownStage> for AppError {
    fn from(value: UnknownStage) -> Self {
        Self::UnknownStage(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ProofingServiceError> for AppError {
    fn from(value: ProofingServiceError) -> Self {
        Self::Proofing(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_rejections_map_to_client_statuses() {
        let unauthorized = AppError::from(ProofingServiceError::from(CallbackError::Unauthorized));
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let missing = AppError::from(ProofingServiceError::from(CallbackError::MissingResult(
            "phone_result".to_string(),
        )));
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bad_id = AppError::from(StoreError::InvalidId("a/b".to_string()));
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_failures_surface_as_io_errors() {
        let err = AppError::from(std::io::Error::other("address in use"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "io error: address in use");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn unresolved_vendors_are_listed() {
        let err = AppError::UnresolvedVendors(vec![(Stage::Phone, "acme".to_string())]);
        assert_eq!(err.to_string(), "no adapter registered for phone=acme");
    }
}

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single entity read against the hub produced no value.
///
/// None of these are fatal: the provider logs them and keeps serving the last
/// good readings until the next refresh cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Hub unreachable, connection refused or the request timed out
    #[error("could not reach Home Assistant for {entity_id}: {source}")]
    ConnectionFailure {
        entity_id: String,
        #[source]
        source: reqwest::Error,
    },

    /// Hub answered with something other than 200 OK
    #[error("Home Assistant rejected {entity_id} with status {status}")]
    HubRejected {
        entity_id: String,
        status: StatusCode,
    },

    /// 200 OK, but no usable numeric `state` in the body
    #[error("malformed state for {entity_id}: {reason}")]
    MalformedResponse { entity_id: String, reason: String },
}

/// Field-less discriminant of [`FetchError`], handy for matching in callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    ConnectionFailure,
    HubRejected,
    MalformedResponse,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::ConnectionFailure { .. } => FetchErrorKind::ConnectionFailure,
            FetchError::HubRejected { .. } => FetchErrorKind::HubRejected,
            FetchError::MalformedResponse { .. } => FetchErrorKind::MalformedResponse,
        }
    }

    /// Entity the failed request was for
    pub fn entity_id(&self) -> &str {
        match self {
            FetchError::ConnectionFailure { entity_id, .. }
            | FetchError::HubRejected { entity_id, .. }
            | FetchError::MalformedResponse { entity_id, .. } => entity_id,
        }
    }

    pub(crate) fn malformed(entity_id: &str, reason: impl Into<String>) -> Self {
        FetchError::MalformedResponse {
            entity_id: entity_id.to_string(),
            reason: reason.into(),
        }
    }
}

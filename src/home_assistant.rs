use crate::config::ProviderConfig;
use crate::error::FetchError;
use anyhow::Context;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde_derive::Deserialize;

/// Thin client for the Home Assistant `/api/states` REST endpoint.
pub struct HomeAssistantAPI {
    endpoint_url: String,
    auth_token: String,
    client: reqwest::Client,
}

impl HomeAssistantAPI {
    /// Every request made through this client is bounded by `config.timeout()`.
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build Home Assistant HTTP client")?;
        Ok(Self {
            endpoint_url: config.base_url(),
            auth_token: config.credential.clone(),
            client,
        })
    }

    pub fn state_url(&self, entity_id: &str) -> String {
        format!("{}/api/states/{}", self.endpoint_url, entity_id)
    }

    /// Fetches the full state object of one entity.
    pub async fn read_entity_state(&self, entity_id: &str) -> Result<HAEntityState, FetchError> {
        let connection_failure = |source| FetchError::ConnectionFailure {
            entity_id: entity_id.to_string(),
            source,
        };

        let response = self
            .client
            .get(self.state_url(entity_id))
            .bearer_auth(&self.auth_token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(connection_failure)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HubRejected {
                entity_id: entity_id.to_string(),
                status,
            });
        }

        // A body cut short by the timeout is still the network's fault
        let body = response.text().await.map_err(connection_failure)?;
        serde_json::from_str(&body).map_err(|e| FetchError::malformed(entity_id, e.to_string()))
    }

    /// Fetches one entity and interprets its `state` as a power reading in watts.
    pub async fn read_entity_value(&self, entity_id: &str) -> Result<f64, FetchError> {
        let entity = self.read_entity_state(entity_id).await?;
        entity.state.as_watts().ok_or_else(|| {
            FetchError::malformed(
                entity_id,
                format!("state {} is not a number", entity.state),
            )
        })
    }
}

/// The parts of a Home Assistant state object this crate looks at.
/// Everything else in the response (attributes, context, ...) is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HAEntityState {
    #[serde(default)]
    pub entity_id: String,
    pub state: StateValue,
    #[serde(default)]
    pub last_changed: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Home Assistant reports states as strings, but some integrations emit bare numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Number(f64),
    Text(String),
}

impl StateValue {
    /// `None` for non-numeric states such as `unavailable` or `unknown`
    pub fn as_watts(&self) -> Option<f64> {
        let value = match self {
            StateValue::Number(value) => *value,
            StateValue::Text(text) => text.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl std::fmt::Display for StateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateValue::Number(value) => write!(f, "{value}"),
            StateValue::Text(text) => write!(f, "'{text}'"),
        }
    }
}

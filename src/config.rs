use anyhow::Context;
use reqwest::header::HeaderValue;
use serde_derive::Deserialize;
use std::{env, fmt, str::FromStr, time::Duration};

const DEFAULT_HUB_PORT: u16 = 8123;
const DEFAULT_TIMEOUT_SECONDS: f64 = 2.0;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 60;

/// Settings for one Home Assistant energy provider.
///
/// Immutable once handed to [`crate::EnergyProvider::new`]. Field names follow
/// the camelCase keys hosts use when embedding this in their own config file.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub hub_address: String,
    #[serde(default = "hub_port_default")]
    pub hub_port: u16,
    /// Long-lived access token presented as `Authorization: Bearer ...`
    #[serde(default)]
    pub credential: String,
    #[serde(default)]
    pub debug_level: u8,
    #[serde(default = "timeout_default")]
    pub timeout_seconds: f64,
    #[serde(rename = "cacheTTLSeconds", default = "cache_ttl_default")]
    pub cache_ttl_seconds: u64,
    /// Entity reporting household consumption in watts
    #[serde(default)]
    pub consumption_entity: String,
    /// Entity reporting generation in watts
    #[serde(default)]
    pub generation_entity: String,
}

fn enabled_default() -> bool {
    true
}

fn hub_port_default() -> u16 {
    DEFAULT_HUB_PORT
}

fn timeout_default() -> f64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn cache_ttl_default() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: enabled_default(),
            hub_address: String::new(),
            hub_port: DEFAULT_HUB_PORT,
            credential: String::new(),
            debug_level: 0,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            consumption_entity: String::new(),
            generation_entity: String::new(),
        }
    }
}

// Hand-written so the access token never ends up in a log line.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("enabled", &self.enabled)
            .field("hub_address", &self.hub_address)
            .field("hub_port", &self.hub_port)
            .field(
                "credential",
                &if self.credential.is_empty() {
                    "<unset>"
                } else {
                    "<redacted>"
                },
            )
            .field("debug_level", &self.debug_level)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("consumption_entity", &self.consumption_entity)
            .field("generation_entity", &self.generation_entity)
            .finish()
    }
}

impl ProviderConfig {
    /// Reads the provider settings from `HASS_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any name -> value source, unset names keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            enabled: lookup("HASS_ENABLED")
                .map(|raw| parse_bool_safe(Some(raw)))
                .unwrap_or(defaults.enabled),
            hub_address: lookup("HASS_ADDRESS").unwrap_or_default(),
            hub_port: parse_var(&lookup, "HASS_PORT")?.unwrap_or(defaults.hub_port),
            credential: lookup("HASS_TOKEN").unwrap_or_default(),
            debug_level: parse_var(&lookup, "HASS_DEBUG_LEVEL")?.unwrap_or(defaults.debug_level),
            timeout_seconds: parse_var(&lookup, "HASS_TIMEOUT")?
                .unwrap_or(defaults.timeout_seconds),
            cache_ttl_seconds: parse_var(&lookup, "HASS_CACHE_TTL")?
                .unwrap_or(defaults.cache_ttl_seconds),
            consumption_entity: lookup("HASS_CONSUMPTION_ENTITY").unwrap_or_default(),
            generation_entity: lookup("HASS_GENERATION_ENTITY").unwrap_or_default(),
        })
    }

    /// Rejects settings the provider cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.enabled && self.hub_address.trim().is_empty() {
            anyhow::bail!("hubAddress must be set when the provider is enabled");
        }
        if self.enabled && self.consumption_entity.trim().is_empty() {
            anyhow::bail!("consumptionEntity must be set when the provider is enabled");
        }
        if self.enabled && self.generation_entity.trim().is_empty() {
            anyhow::bail!("generationEntity must be set when the provider is enabled");
        }
        HeaderValue::from_str(&format!("Bearer {}", self.credential))
            .context("credential is not a valid Authorization header value")?;
        if self.hub_port == 0 {
            anyhow::bail!("hubPort must be between 1 and 65535");
        }
        let timeout = Duration::try_from_secs_f64(self.timeout_seconds)
            .with_context(|| format!("invalid timeoutSeconds {}", self.timeout_seconds))?;
        if timeout.is_zero() {
            anyhow::bail!("timeoutSeconds must be greater than zero");
        }
        Ok(())
    }

    /// `http://address:port`, with IPv6 literals bracketed
    pub fn base_url(&self) -> String {
        let address = self.hub_address.trim();
        if address.contains(':') && !address.starts_with('[') {
            format!("http://[{}]:{}", address, self.hub_port)
        } else {
            format!("http://{}:{}", address, self.hub_port)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value '{raw}' for {name}")),
        _ => Ok(None),
    }
}

/// Safely parses a boolean from an optional string, defaulting to false
pub fn parse_bool_safe(val: Option<String>) -> bool {
    val.unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .parse()
        .unwrap_or_default()
}

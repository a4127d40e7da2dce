use crate::config::ProviderConfig;
use crate::error::FetchError;
use crate::home_assistant::HomeAssistantAPI;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::interval;

// Minimum `debug_level` at which a message is promoted from DEBUG to INFO
const LOG_FAILURES: u8 = 1;
const LOG_SKIPPED: u8 = 2;
const LOG_REQUESTS: u8 = 10;

/// Consumption and generation taken from the same refresh cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EnergyReadings {
    pub consumption_w: f64,
    pub generation_w: f64,
}

/// Last known good readings plus when they were fetched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProviderState {
    last_fetch: Option<Instant>,
    readings: EnergyReadings,
}

impl ProviderState {
    /// True when nothing has been fetched yet, or the last fetch is at least `ttl` old.
    pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        match self.last_fetch {
            None => true,
            Some(fetched) => now.saturating_duration_since(fetched) >= ttl,
        }
    }

    fn store(&mut self, readings: EnergyReadings, fetched: Instant) {
        self.readings = readings;
        self.last_fetch = Some(fetched);
    }
}

/// Consumption and generation figures polled from a Home Assistant hub.
///
/// The provider never runs on its own: the host's control loop calls
/// [`EnergyProvider::update`] on its own cadence and reads the cached values
/// through the getters whenever it likes. Remote fetches happen at most once
/// per cache TTL, and a failed cycle leaves the previous readings in place.
pub struct EnergyProvider {
    config: ProviderConfig,
    ha_client: HomeAssistantAPI,
    state: ProviderState,
}

impl EnergyProvider {
    /// Validates `config` and prepares the HTTP client. Nothing is fetched yet.
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let ha_client = HomeAssistantAPI::new(&config)?;
        Ok(Self {
            config,
            ha_client,
            state: ProviderState::default(),
        })
    }

    pub fn get_consumption(&self) -> f64 {
        self.state.readings.consumption_w
    }

    pub fn get_generation(&self) -> f64 {
        self.state.readings.generation_w
    }

    pub fn readings(&self) -> EnergyReadings {
        self.state.readings
    }

    /// When the cache was last refreshed, `None` before the first success.
    pub fn last_fetch(&self) -> Option<Instant> {
        self.state.last_fetch
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Refreshes the cached readings if they are older than the cache TTL.
    ///
    /// Both entities are requested every cycle; the cache only moves when both
    /// answers are usable, so consumption and generation always come from the
    /// same cycle. Failures are logged and otherwise swallowed.
    pub async fn update(&mut self) {
        if !self.config.enabled {
            return;
        }

        let now = Instant::now();
        if !self.state.is_stale(now, self.config.cache_ttl()) {
            self.log(LOG_SKIPPED, format_args!("Cached readings still fresh, skipping fetch"));
            return;
        }

        let consumption = self.fetch_entity_value(&self.config.consumption_entity).await;
        let generation = self.fetch_entity_value(&self.config.generation_entity).await;

        match (consumption, generation) {
            (Ok(consumption_w), Ok(generation_w)) => {
                let readings = EnergyReadings {
                    consumption_w,
                    generation_w,
                };
                self.state.store(readings, Instant::now());
                self.log(
                    LOG_FAILURES,
                    format_args!(
                        "Home Assistant readings updated: consumption {consumption_w}W, generation {generation_w}W"
                    ),
                );
            }
            (consumption, generation) => {
                for err in [consumption.err(), generation.err()].into_iter().flatten() {
                    self.log(LOG_FAILURES, format_args!("Home Assistant read failed: {err}"));
                }
                self.log(
                    LOG_FAILURES,
                    format_args!(
                        "Keeping previous readings: consumption {}W, generation {}W",
                        self.get_consumption(),
                        self.get_generation()
                    ),
                );
            }
        }
    }

    /// Calls [`EnergyProvider::update`] every `period` until `shutdown` resolves.
    ///
    /// `shutdown` is pinned once and polled across iterations, so a signal
    /// that fires while an update is in flight ends the loop right after it.
    pub async fn run_until<F>(&mut self, period: Duration, shutdown: F)
    where
        F: Future,
    {
        let mut poll_interval = interval(period.max(Duration::from_millis(1)));
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = poll_interval.tick() => {
                    self.update().await;
                    let readings = self.readings();
                    tracing::info!(
                        "Consumption {}W, generation {}W",
                        readings.consumption_w,
                        readings.generation_w
                    );
                }
            }
        }
    }

    /// Reads one entity from the hub.
    pub async fn fetch_entity_value(&self, entity_id: &str) -> Result<f64, FetchError> {
        self.log(
            LOG_REQUESTS,
            format_args!("Requesting {}", self.ha_client.state_url(entity_id)),
        );
        let value = self.ha_client.read_entity_value(entity_id).await?;
        self.log(LOG_REQUESTS, format_args!("{entity_id} reported {value}W"));
        Ok(value)
    }

    fn log(&self, min_level: u8, message: fmt::Arguments<'_>) {
        if self.config.debug_level >= min_level {
            tracing::info!("{message}");
        } else {
            tracing::debug!("{message}");
        }
    }
}

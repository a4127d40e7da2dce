//! Home Assistant Energy Provider Library
//!
//! This library polls a Home Assistant hub for household power consumption and
//! generation, caching the readings so a control loop can query them cheaply.

pub mod config;
pub mod energy_provider;
pub mod error;
pub mod home_assistant;

// Re-export commonly used types for easier access
pub use config::ProviderConfig;
pub use energy_provider::{EnergyProvider, EnergyReadings, ProviderState};
pub use error::{FetchError, FetchErrorKind};
pub use home_assistant::HomeAssistantAPI;

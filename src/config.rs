//! System configuration parameters
//!
//! All timing and radio-identity parameters for the beacon.  The firmware
//! has no persistent storage: the config is built once at startup from
//! [`BeaconConfig::default`], optionally overridden by a JSON document
//! baked in at build time, and validated before the main loop starts.

use embassy_time::Duration;
use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest local name that still leaves room for both manufacturer
/// elements in a 31-byte legacy advertising PDU.
pub const MAX_LOCAL_NAME_LEN: usize = 8;

/// Core beacon configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    // --- Companion session ---
    /// Delay after energizing the companion before arming the done-signal watch (ms)
    pub settle_delay_ms: u32,
    /// How long the done signal must stay low to count as a real pulse (ms)
    pub validation_window_ms: u32,
    /// Overall time the companion gets to signal completion (seconds)
    pub session_timeout_secs: u32,
    /// Coarse poll interval of the edge-wait loop (ms)
    pub poll_interval_ms: u32,
    /// Wait after a falling edge before sampling the level (ms)
    pub edge_settle_ms: u32,
    /// Sample period inside the validation window (ms)
    pub sample_interval_ms: u32,
    /// Skip the session when the battery reads below this (mV). `None` = never skip.
    pub min_session_battery_mv: Option<u16>,

    // --- Beacon ---
    /// Radio-on time of one advertising burst (seconds)
    pub burst_length_secs: u32,
    /// Length of the beacon window between two sessions (seconds)
    pub sleep_interval_secs: u32,
    /// Complete local name in the advertisement
    pub local_name: String<MAX_LOCAL_NAME_LEN>,
    /// Company identifier tagging the battery millivolt element
    pub battery_company_id: u16,
    /// Company identifier tagging the supply millivolt element
    pub supply_company_id: u16,

    // --- Sampling ---
    /// Full-scale reference of the voltage dividers (mV)
    pub adc_reference_mv: u16,

    // --- Boot ---
    /// Status LED on-time at boot before the first session (ms)
    pub boot_indicator_ms: u32,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        let mut local_name = String::new();
        // "ATHENE" is 6 bytes, always fits.
        let _ = local_name.push_str("ATHENE");

        Self {
            // Companion session
            settle_delay_ms: 5_000,
            validation_window_ms: 1_000,
            session_timeout_secs: 120,
            poll_interval_ms: 5_000,
            edge_settle_ms: 10,
            sample_interval_ms: 10,
            min_session_battery_mv: None,

            // Beacon
            burst_length_secs: 30,
            sleep_interval_secs: 30 * 60,
            local_name,
            battery_company_id: 0x1789,
            supply_company_id: 0x1792,

            // Sampling
            adc_reference_mv: 4_200,

            // Boot
            boot_indicator_ms: 5_000,
        }
    }
}

/// Timing of one [`SignalValidator`](crate::session::validator) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationTiming {
    pub window: Duration,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub edge_settle: Duration,
    pub sample_interval: Duration,
}

/// Timing of one companion power session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub settle_delay: Duration,
    pub validation: ValidationTiming,
}

impl BeaconConfig {
    /// Parse a JSON override.  Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or break the main loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("validation_window_ms must be > 0"));
        }
        if self.session_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed("session_timeout_secs must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be > 0"));
        }
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("sample_interval_ms must be > 0"));
        }
        if self.sample_interval_ms >= self.validation_window_ms {
            return Err(ConfigError::ValidationFailed(
                "sample_interval_ms must be shorter than validation_window_ms",
            ));
        }
        if self.edge_settle_ms >= self.poll_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "edge_settle_ms must be shorter than poll_interval_ms",
            ));
        }
        if self.burst_length_secs == 0 {
            return Err(ConfigError::ValidationFailed("burst_length_secs must be > 0"));
        }
        if self.burst_length_secs > self.sleep_interval_secs {
            return Err(ConfigError::ValidationFailed(
                "burst_length_secs must not exceed sleep_interval_secs",
            ));
        }
        if self.local_name.is_empty() {
            return Err(ConfigError::ValidationFailed("local_name must not be empty"));
        }
        if self.battery_company_id == self.supply_company_id {
            return Err(ConfigError::ValidationFailed(
                "battery and supply company ids must differ",
            ));
        }
        if self.adc_reference_mv == 0 {
            return Err(ConfigError::ValidationFailed("adc_reference_mv must be > 0"));
        }
        Ok(())
    }

    pub fn validation_timing(&self) -> ValidationTiming {
        ValidationTiming {
            window: Duration::from_millis(self.validation_window_ms.into()),
            timeout: Duration::from_secs(self.session_timeout_secs.into()),
            poll_interval: Duration::from_millis(self.poll_interval_ms.into()),
            edge_settle: Duration::from_millis(self.edge_settle_ms.into()),
            sample_interval: Duration::from_millis(self.sample_interval_ms.into()),
        }
    }

    pub fn session_timing(&self) -> SessionTiming {
        SessionTiming {
            settle_delay: Duration::from_millis(self.settle_delay_ms.into()),
            validation: self.validation_timing(),
        }
    }

    pub fn burst_length(&self) -> Duration {
        Duration::from_secs(self.burst_length_secs.into())
    }

    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs(self.sleep_interval_secs.into())
    }
}

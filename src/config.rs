// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Main configuration struct for the device, cooker, board, sampling, and web API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub cooker: CookerConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub web: WebConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            cooker: CookerConfig::default(),
            board: BoardConfig::default(),
            sampling: SamplingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

/// Device identity and cloud endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default = "default_device_id")]
    pub device_id: String,
    /// Telemetry ingest URL; readings go to the log only when unset.
    #[serde(default)]
    pub ingest_url: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            ingest_url: None,
        }
    }
}

/// Control-loop parameters. Temperatures are kelvin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CookerConfig {
    /// Initial chamber target; 0.0 keeps the element off until commanded.
    #[serde(default)]
    pub chamber_target: f64,
    #[serde(default = "default_chamber_tolerance")]
    pub chamber_tolerance: f64,
    /// Minimum interval between relay activations.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_publish_interval_secs")]
    pub publish_interval_secs: u64,
}

impl Default for CookerConfig {
    fn default() -> Self {
        Self {
            chamber_target: 0.0,
            chamber_tolerance: default_chamber_tolerance(),
            cooldown_secs: default_cooldown_secs(),
            publish_interval_secs: default_publish_interval_secs(),
        }
    }
}

/// Probe wiring. Pin 0 is always the chamber.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardConfig {
    #[serde(default = "default_probe_pins")]
    pub probe_pins: Vec<u8>,
    #[serde(default = "default_series_resistor")]
    pub series_resistor: f64,
    #[serde(default = "default_supply_voltage")]
    pub supply_voltage: f64,
    #[serde(default = "default_relay_pin")]
    pub relay_pin: u8,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            probe_pins: default_probe_pins(),
            series_resistor: default_series_resistor(),
            supply_voltage: default_supply_voltage(),
            relay_pin: default_relay_pin(),
        }
    }
}

/// Sampling cadence and moving-average window.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SamplingConfig {
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            window: default_window(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

// Default value functions
fn default_device_id() -> String { "cooker-0".to_string() }
fn default_chamber_tolerance() -> f64 { 2.0 }
fn default_cooldown_secs() -> u64 { 60 }
fn default_publish_interval_secs() -> u64 { 5 }
fn default_probe_pins() -> Vec<u8> { vec![0, 2, 4, 6] }
fn default_series_resistor() -> f64 { 10_000.0 }
fn default_supply_voltage() -> f64 { 3.3 }
fn default_relay_pin() -> u8 { 18 }
fn default_rate_hz() -> u32 { 10 }
fn default_window() -> usize { 100 }
fn default_listen() -> String { "0.0.0.0:3000".to_string() }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.device.device_id, "cooker-0");
        assert_eq!(config.device.ingest_url, None);
        assert_eq!(config.cooker.chamber_target, 0.0);
        assert_eq!(config.cooker.chamber_tolerance, 2.0);
        assert_eq!(config.cooker.cooldown_secs, 60);
        assert_eq!(config.cooker.publish_interval_secs, 5);
        assert_eq!(config.board.probe_pins, vec![0, 2, 4, 6]);
        assert_eq!(config.board.series_resistor, 10_000.0);
        assert_eq!(config.board.supply_voltage, 3.3);
        assert_eq!(config.board.relay_pin, 18);
        assert_eq!(config.sampling.rate_hz, 10);
        assert_eq!(config.sampling.window, 100);
        assert_eq!(config.web.listen, "0.0.0.0:3000");
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "[cooker]\nchamber_target = 394.26\ncooldown_secs = 120\n\n[board]\nprobe_pins = [0, 2]"
        )
        .unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.cooker.chamber_target, 394.26);
        assert_eq!(config.cooker.cooldown_secs, 120);
        assert_eq!(config.board.probe_pins, vec![0, 2]);
        // Defaults for missing fields
        assert_eq!(config.cooker.chamber_tolerance, 2.0);
        assert_eq!(config.board.series_resistor, 10_000.0);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}

use clap::ArgMatches;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::utils::error::SensorError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sensor_name: String,
    pub serial: SerialConfig,
    pub polling: PollingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub parity: ParityConfig,
    /// Per-read timeout override. Unset keeps `read_timeout_ms` in charge.
    pub timeout_period_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub loop_rate_hz: u32,
    /// Ticks per poll cycle; the request goes out on the last tick of each cycle.
    pub cycle_length: u32,
    pub publish_policy: PublishPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// console | json | csv
    pub format: String,
    pub file_path: Option<String>,
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParityConfig {
    None,
    Even,
    Odd,
}

/// What to publish when a cycle read fewer bytes than a frame needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PublishPolicy {
    /// Publish the previous reading again (the default reading before the first decode).
    RepublishLast,
    /// Only publish freshly decoded readings.
    SuppressStale,
}

pub const OUTPUT_FORMATS: [&str; 3] = ["console", "json", "csv"];

impl Default for Config {
    fn default() -> Self {
        Self {
            sensor_name: "MiranSensorInfo".to_string(),
            serial: SerialConfig::default(),
            polling: PollingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
            read_timeout_ms: 1000,
            parity: ParityConfig::None,
            timeout_period_ms: None,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            loop_rate_hz: 2000,
            cycle_length: 10,
            publish_policy: PublishPolicy::RepublishLast,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "console".to_string(),
            file_path: None,
            channel_capacity: 1000,
        }
    }
}

impl SerialConfig {
    pub fn effective_read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_period_ms.unwrap_or(self.read_timeout_ms))
    }
}

impl PollingConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.loop_rate_hz.max(1) as u64)
    }
}

impl Config {
    /// Applies command line overrides on top of `self`.
    pub fn apply_matches(mut self, matches: &ArgMatches) -> Result<Self, SensorError> {
        if let Some(port) = matches.get_one::<String>("port") {
            self.serial.port = port.clone();
        }
        if let Some(baud) = matches.get_one::<String>("baud") {
            self.serial.baud_rate = parse_arg("baud", baud)?;
        }
        if let Some(rate) = matches.get_one::<String>("rate") {
            self.polling.loop_rate_hz = parse_arg("rate", rate)?;
        }
        if let Some(period) = matches.get_one::<String>("timeout-period") {
            self.serial.timeout_period_ms = Some(parse_arg("timeout-period", period)?);
        }
        if matches.get_flag("suppress-stale") {
            self.polling.publish_policy = PublishPolicy::SuppressStale;
        }
        if let Some(format) = matches.get_one::<String>("format") {
            self.output.format = format.clone();
        }
        if let Some(file) = matches.get_one::<String>("output-file") {
            self.output.file_path = Some(file.clone());
        }

        self.validate()?;
        Ok(self)
    }

    /// Loads `--config` if given, otherwise defaults, then applies CLI overrides.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, SensorError> {
        let base = match matches.get_one::<String>("config") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.apply_matches(matches)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SensorError> {
        let path = path.as_ref();
        info!("📄 Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            SensorError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SensorError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SensorError> {
        if self.serial.port.trim().is_empty() {
            return Err(SensorError::ConfigError("serial.port must not be empty".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(SensorError::ConfigError("serial.baud_rate must be > 0".to_string()));
        }
        if self.polling.loop_rate_hz == 0 || self.polling.loop_rate_hz > 1_000_000 {
            return Err(SensorError::ConfigError(
                "polling.loop_rate_hz must be within 1..=1000000".to_string(),
            ));
        }
        if self.polling.cycle_length == 0 {
            return Err(SensorError::ConfigError("polling.cycle_length must be >= 1".to_string()));
        }
        if self.output.channel_capacity == 0 {
            return Err(SensorError::ConfigError("output.channel_capacity must be > 0".to_string()));
        }
        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(SensorError::ConfigError(format!(
                "unknown output.format '{}', expected one of {:?}",
                self.output.format, OUTPUT_FORMATS
            )));
        }
        if self.serial.timeout_period_ms == Some(0) {
            warn!("⚠️  timeout_period_ms = 0 makes every read return immediately");
        }
        Ok(())
    }
}

fn parse_arg<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, SensorError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| SensorError::ConfigError(format!("invalid --{} '{}': {}", name, value, e)))
}

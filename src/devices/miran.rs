use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::modbus::protocol::{decode_frame, MarkerSearch, RequestCommand};
use crate::utils::clock::TimeSource;

/// One decoded distance measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Seconds since the Unix epoch, taken when the frame was decoded.
    pub timestamp: f64,
    pub length: f64,
}

impl Reading {
    pub fn new(timestamp: f64, length: f64) -> Self {
        Self { timestamp, length }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timestamp: {:.6}\nlength: {}", self.timestamp, self.length)
    }
}

/// A reading together with where in the buffer it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    pub reading: Reading,
    pub search: MarkerSearch,
    pub raw: u32,
}

#[derive(Debug, Clone)]
pub struct MiranSensor {
    pub name: String,
    pub request: RequestCommand,
}

impl MiranSensor {
    pub fn new(name: String) -> Self {
        Self {
            name,
            request: RequestCommand::READ_LENGTH,
        }
    }

    pub fn request(&self) -> &RequestCommand {
        &self.request
    }

    /// Decodes one reading from whatever a poll cycle read back.
    ///
    /// Returns `None` only for buffers shorter than a frame. The timestamp comes
    /// from `clock` at decode time, not at read time.
    pub fn parse_raw_data(&self, data: &[u8], clock: &dyn TimeSource) -> Option<SensorFrame> {
        let frame = decode_frame(data)?;
        let reading = Reading::new(clock.now_seconds(), frame.length);

        match frame.search {
            MarkerSearch::Found(offset) => {
                debug!("📦 {}: frame at offset {} -> {}", self.name, offset, frame.length);
            }
            MarkerSearch::Fallback(offset) => {
                debug!("❓ {}: no frame marker in {} bytes, decoded offset {} -> {}",
                       self.name, data.len(), offset, frame.length);
            }
        }

        Some(SensorFrame {
            reading,
            search: frame.search,
            raw: frame.raw,
        })
    }
}

impl Default for MiranSensor {
    fn default() -> Self {
        Self::new("MiranSensorInfo".to_string())
    }
}

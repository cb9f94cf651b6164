//! Miran Sensor Acquisition Library
//!
//! Polls a Modbus RTU distance sensor over a serial port on a fixed tick
//! schedule, locates the response frame in whatever bytes arrived, decodes the
//! Q16.16 length and publishes timestamped readings to pluggable sinks.

pub mod config;
pub mod modbus;
pub mod devices;
pub mod services;
pub mod output;
pub mod utils;
pub mod cli;

// Re-export commonly used types
pub use config::{Config, PublishPolicy};
pub use services::{AcquisitionService, PollScheduler, PollStats, TickOutcome};
pub use devices::{MiranSensor, Reading, SensorFrame};
pub use modbus::{decode_frame, MarkerSearch, RequestCommand, SerialChannel, SerialPortChannel};
pub use output::{DataFormatter, DataSender, ReadingSink, ChannelSink, FormattedSink};
pub use utils::error::SensorError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

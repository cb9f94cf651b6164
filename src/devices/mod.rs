pub mod miran;

pub use miran::{MiranSensor, Reading, SensorFrame};

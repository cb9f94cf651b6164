pub mod clock;
pub mod error;

pub use clock::{FixedClock, SystemClock, TimeSource};
pub use error::SensorError;

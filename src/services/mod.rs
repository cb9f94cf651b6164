pub mod acquisition_service;
pub mod scheduler;
pub mod stats;

pub use acquisition_service::{AcquisitionService, TickOutcome, RAW_BUFFER_CAPACITY};
pub use scheduler::PollScheduler;
pub use stats::PollStats;

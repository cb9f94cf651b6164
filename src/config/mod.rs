pub mod settings;

pub use settings::{
    Config,
    OutputConfig,
    ParityConfig,
    PollingConfig,
    PublishPolicy,
    SerialConfig,
    OUTPUT_FORMATS,
};

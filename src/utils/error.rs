use thiserror::Error;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Communication error: {0}")]
    CommunicationError(String),

    #[error("Serial channel is closed")]
    ChannelClosed,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Publish error: {0}")]
    PublishError(String),
}

impl From<serde_json::Error> for SensorError {
    fn from(err: serde_json::Error) -> Self {
        SensorError::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for SensorError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => SensorError::Timeout,
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::NotConnected => {
                SensorError::ChannelClosed
            }
            _ => SensorError::CommunicationError(format!("IO error: {}", err)),
        }
    }
}

impl From<serialport::Error> for SensorError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => SensorError::ChannelClosed,
            _ => SensorError::CommunicationError(format!("Serial error: {}", err)),
        }
    }
}

impl From<toml::de::Error> for SensorError {
    fn from(err: toml::de::Error) -> Self {
        SensorError::ConfigError(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for SensorError {
    fn from(err: toml::ser::Error) -> Self {
        SensorError::SerializationError(format!("TOML error: {}", err))
    }
}

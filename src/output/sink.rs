//! Where readings go once a poll cycle is done with them.

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::formatters::DataFormatter;
use super::senders::DataSender;
use crate::devices::Reading;
use crate::utils::error::SensorError;

#[async_trait]
pub trait ReadingSink: Send + Sync {
    async fn publish(&self, reading: &Reading) -> Result<(), SensorError>;
    fn sink_type(&self) -> &str;
}

/// Bounded in-process topic. Publishing never waits: a full queue drops the reading.
pub struct ChannelSink {
    tx: mpsc::Sender<Reading>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Reading>) -> Self {
        Self { tx }
    }

    /// Creates the sink together with its subscriber end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Reading>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ReadingSink for ChannelSink {
    async fn publish(&self, reading: &Reading) -> Result<(), SensorError> {
        self.tx.try_send(*reading).map_err(|e| match e {
            TrySendError::Full(_) => SensorError::PublishError("reading queue full".to_string()),
            TrySendError::Closed(_) => {
                SensorError::PublishError("no subscriber left on reading queue".to_string())
            }
        })
    }

    fn sink_type(&self) -> &str {
        "channel"
    }
}

/// Renders each reading with a formatter and hands the text to a sender.
pub struct FormattedSink {
    formatter: Box<dyn DataFormatter>,
    sender: Box<dyn DataSender>,
}

impl FormattedSink {
    pub fn new(formatter: Box<dyn DataFormatter>, sender: Box<dyn DataSender>) -> Self {
        Self { formatter, sender }
    }

    /// Sends the formatter's header, if it has one.
    pub async fn write_header(&self) -> Result<(), SensorError> {
        let header = self.formatter.format_header();
        if header.is_empty() {
            return Ok(());
        }
        self.sender.send(&header).await
    }

    pub fn destination(&self) -> &str {
        self.sender.destination()
    }
}

#[async_trait]
impl ReadingSink for FormattedSink {
    async fn publish(&self, reading: &Reading) -> Result<(), SensorError> {
        let text = self.formatter.format_reading(reading);
        self.sender.send(&text).await
    }

    fn sink_type(&self) -> &str {
        self.formatter.format_name()
    }
}

/// Drains the reading queue into `sinks` until every publisher is dropped.
///
/// Returns how many readings came through. A sink failing on one reading does
/// not stop the others or the relay.
pub async fn forward_readings(
    mut rx: mpsc::Receiver<Reading>,
    sinks: Vec<Box<dyn ReadingSink>>,
) -> u64 {
    let mut forwarded = 0;
    while let Some(reading) = rx.recv().await {
        for sink in &sinks {
            if let Err(e) = sink.publish(&reading).await {
                warn!("⚠️  {} sink rejected reading: {}", sink.sink_type(), e);
            }
        }
        forwarded += 1;
    }

    debug!("📭 Reading queue closed after {} readings", forwarded);
    forwarded
}

use async_trait::async_trait;
use log::{error, info};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::utils::error::SensorError;

/// Line-oriented destination for formatted readings.
#[async_trait]
pub trait DataSender: Send + Sync {
    async fn send(&self, line: &str) -> Result<(), SensorError>;
    fn destination(&self) -> &str;
}

pub struct ConsoleSender;

#[async_trait]
impl DataSender for ConsoleSender {
    async fn send(&self, line: &str) -> Result<(), SensorError> {
        println!("{}", line);
        Ok(())
    }

    fn destination(&self) -> &str {
        "stdout"
    }
}

/// Appends lines to a log file kept open for the whole run.
///
/// Every line is flushed so a reader tailing the file sees each reading as it lands.
pub struct FileSender {
    path: String,
    file: Mutex<BufWriter<File>>,
}

impl FileSender {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, SensorError> {
        let path = path.as_ref().to_string_lossy().to_string();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                error!("❌ Failed to open file {}: {}", path, e);
                SensorError::PublishError(format!("File open error: {}", e))
            })?;

        info!("📝 Appending readings to {}", path);
        Ok(Self {
            path,
            file: Mutex::new(BufWriter::new(file)),
        })
    }
}

#[async_trait]
impl DataSender for FileSender {
    async fn send(&self, line: &str) -> Result<(), SensorError> {
        let mut file = self.file.lock().await;
        let written = async {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await
        }
        .await;

        written.map_err(|e| {
            error!("❌ Failed to write to file {}: {}", self.path, e);
            SensorError::PublishError(format!("File write error: {}", e))
        })
    }

    fn destination(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_sender_appends_each_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.log");
        let sender = FileSender::open(&path).await.unwrap();

        sender.send("first").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\n");

        sender.send("second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_file_sender_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let sender = FileSender::open(&path).await.unwrap();
        sender.send("this run").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier run\nthis run\n");
        assert_eq!(sender.destination(), path.to_string_lossy());
    }

    #[tokio::test]
    async fn test_file_sender_bad_path() {
        let result = FileSender::open("/nonexistent/dir/readings.log").await;
        assert!(matches!(result, Err(SensorError::PublishError(_))));
    }
}

use log::{error, info, warn};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

use crate::config::settings::{ParityConfig, SerialConfig};
use crate::utils::error::SensorError;

/// Byte-level access to the sensor link.
///
/// The acquisition loop is the only caller, so implementations need no locking.
pub trait SerialChannel: Send {
    fn is_open(&self) -> bool;

    /// Bytes that can be read right now without waiting.
    fn bytes_available(&mut self) -> Result<usize, SensorError>;

    fn write_request(&mut self, request: &[u8]) -> Result<(), SensorError>;

    /// Reads at most `buf.len()` bytes, returning how many were read.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, SensorError>;
}

pub struct SerialPortChannel {
    port: Box<dyn SerialPort>,
    port_name: String,
    open: bool,
}

impl SerialPortChannel {
    pub fn open(settings: &SerialConfig) -> Result<Self, SensorError> {
        info!("🔌 Opening sensor port: {}", settings.port);
        info!("⚙️  Configuration: {} baud, 8 data bits, 1 stop bit, parity {:?}",
              settings.baud_rate, settings.parity);

        let serial_parity = match settings.parity {
            ParityConfig::None => serialport::Parity::None,
            ParityConfig::Even => serialport::Parity::Even,
            ParityConfig::Odd => serialport::Parity::Odd,
        };

        let read_timeout = settings.effective_read_timeout();
        if settings.timeout_period_ms.is_some() {
            info!("⏱️  Per-read timeout overridden by timeout_period: {:?}", read_timeout);
        }

        let port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serial_parity)
            .open()
            .map_err(|e| {
                error!("❌ Unable to open port {}: {}", settings.port, e);
                SensorError::ConnectionError(format!("Failed to open port {}: {}", settings.port, e))
            })?;

        info!("✅ Serial Port initialized");
        Ok(Self {
            port,
            port_name: settings.port.clone(),
            open: true,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn read_timeout(&self) -> Duration {
        self.port.timeout()
    }

    // A vanished device means the link is gone for good; nothing reopens it.
    fn track<T>(&mut self, result: Result<T, SensorError>) -> Result<T, SensorError> {
        if let Err(SensorError::ChannelClosed) = result {
            if self.open {
                warn!("🔌 Port {} went away", self.port_name);
            }
            self.open = false;
        }
        result
    }
}

impl SerialChannel for SerialPortChannel {
    fn is_open(&self) -> bool {
        self.open
    }

    fn bytes_available(&mut self) -> Result<usize, SensorError> {
        let result = self
            .port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(SensorError::from);
        self.track(result)
    }

    fn write_request(&mut self, request: &[u8]) -> Result<(), SensorError> {
        let result = self
            .port
            .write_all(request)
            .and_then(|_| self.port.flush())
            .map_err(SensorError::from);
        self.track(result)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
        let result = self.port.read(buf).map_err(SensorError::from);
        self.track(result)
    }
}

/// Logs every serial port the OS reports. Used by the `list-ports` command.
pub fn list_serial_ports() -> Result<Vec<serialport::SerialPortInfo>, SensorError> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        warn!("⚠️  No serial ports found");
    }

    for port in &ports {
        match &port.port_type {
            serialport::SerialPortType::UsbPort(usb_info) => {
                info!("📡 {} (USB {:04x}:{:04x}{})",
                      port.port_name,
                      usb_info.vid,
                      usb_info.pid,
                      usb_info
                          .manufacturer
                          .as_ref()
                          .map(|m| format!(", {}", m))
                          .unwrap_or_default());
            }
            other => info!("📡 {} ({:?})", port.port_name, other),
        }
    }

    Ok(ports)
}

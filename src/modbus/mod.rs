pub mod client;
pub mod protocol;
pub mod crc;

pub use client::{list_serial_ports, SerialChannel, SerialPortChannel};
pub use protocol::{
    decode_frame, find_marker, DecodedFrame, MarkerSearch, RequestCommand, FRAME_MARKER,
    MIN_FRAME_LEN,
};
pub use crc::crc16_modbus;

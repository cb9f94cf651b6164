pub mod formatters;
pub mod senders;
pub mod sink;

pub use formatters::{formatter_for, DataFormatter, ConsoleFormatter, JsonFormatter, CsvFormatter};
pub use senders::{DataSender, ConsoleSender, FileSender};
pub use sink::{forward_readings, ReadingSink, ChannelSink, FormattedSink};

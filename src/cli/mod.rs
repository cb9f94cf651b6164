pub mod commands;

pub use commands::{build_cli, decode_hex_capture, handle_subcommands, run_acquisition};

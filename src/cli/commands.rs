use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{error, info};

use crate::config::Config;
use crate::devices::MiranSensor;
use crate::modbus::{list_serial_ports, SerialPortChannel};
use crate::output::{
    formatter_for, forward_readings, ChannelSink, ConsoleSender, FileSender, FormattedSink,
    ReadingSink,
};
use crate::services::AcquisitionService;
use crate::utils::clock::SystemClock;

pub fn build_cli() -> Command {
    Command::new("miran-sensor")
        .version(crate::VERSION)
        .about("Polls the Miran distance sensor over Modbus RTU and publishes decoded readings")
        .arg(Arg::new("config").short('c').long("config").global(true)
            .help("TOML configuration file"))
        .arg(Arg::new("port").short('p').long("port").global(true)
            .help("Serial device path"))
        .arg(Arg::new("baud").short('b').long("baud").global(true)
            .help("Baud rate"))
        .arg(Arg::new("rate").short('r').long("rate").global(true)
            .help("Control loop rate in Hz"))
        .arg(Arg::new("timeout-period").long("timeout-period").global(true)
            .help("Per-read timeout in ms, replacing the port read timeout"))
        .arg(Arg::new("suppress-stale").long("suppress-stale").global(true)
            .action(ArgAction::SetTrue)
            .help("Do not republish the previous reading after a short read"))
        .arg(Arg::new("format").short('f').long("format").global(true)
            .value_parser(["console", "json", "csv"])
            .help("Reading output format"))
        .arg(Arg::new("output-file").short('o').long("output-file").global(true)
            .help("Also append readings to this file"))
        .arg(Arg::new("verbose").short('v').long("verbose").global(true)
            .action(ArgAction::SetTrue)
            .help("Debug logging"))
        .subcommand(Command::new("run").about("Run the acquisition loop until Ctrl-C (default)"))
        .subcommand(Command::new("list-ports").about("List available serial ports"))
        .subcommand(Command::new("decode")
            .about("Decode a captured response buffer given as hex")
            .arg(Arg::new("hex").required(true)))
        .subcommand(Command::new("init-config")
            .about("Write the effective configuration as TOML")
            .arg(Arg::new("path").required(true)))
}

/// Runs one-shot subcommands. Returns `false` when the acquisition loop should start.
pub async fn handle_subcommands(matches: &ArgMatches, config: &Config) -> anyhow::Result<bool> {
    if matches.subcommand_matches("list-ports").is_some() {
        info!("🔍 Executing list-ports command...");
        let ports = list_serial_ports()?;
        for port in &ports {
            println!("{}", port.port_name);
        }
        return Ok(true);
    }

    if let Some(matches) = matches.subcommand_matches("decode") {
        let text = matches.get_one::<String>("hex").map(String::as_str).unwrap_or_default();
        println!("{}", decode_hex_capture(text)?);
        return Ok(true);
    }

    if let Some(matches) = matches.subcommand_matches("init-config") {
        let path = matches.get_one::<String>("path").map(String::as_str).unwrap_or_default();
        config.save_to_file(path)?;
        println!("✅ Configuration written to {}", path);
        return Ok(true);
    }

    Ok(false)
}

/// Decodes a hex dump (whitespace and `0x` prefixes allowed) the way a poll cycle would.
pub fn decode_hex_capture(text: &str) -> anyhow::Result<String> {
    let cleaned: String = text
        .split_whitespace()
        .map(|chunk| chunk.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();
    let bytes = hex::decode(&cleaned).with_context(|| format!("invalid hex input '{}'", text))?;

    let sensor = MiranSensor::default();
    let Some(frame) = sensor.parse_raw_data(&bytes, &SystemClock) else {
        bail!("{} bytes is too short for a frame", bytes.len());
    };

    let origin = if frame.search.is_found() { "marker" } else { "fallback" };
    Ok(format!(
        "offset: {} ({})\nraw: 0x{:08X}\n{}",
        frame.search.offset(),
        origin,
        frame.raw,
        frame.reading
    ))
}

pub async fn run_acquisition(config: Config) -> anyhow::Result<()> {
    info!("🚀 Starting {}", config.sensor_name);

    let channel = SerialPortChannel::open(&config.serial)
        .with_context(|| format!("Unable to open port {}", config.serial.port))?;
    info!("⏱️  Read timeout: {:?}", channel.read_timeout());

    let sensor = MiranSensor::new(config.sensor_name.clone());
    let mut service = AcquisitionService::new(channel, sensor, &config.polling)?;

    let Some(formatter) = formatter_for(&config.output.format) else {
        bail!("unknown output format '{}'", config.output.format);
    };
    let console = FormattedSink::new(formatter, Box::new(ConsoleSender));
    console.write_header().await?;
    let mut sinks: Vec<Box<dyn ReadingSink>> = vec![Box::new(console)];

    if let Some(path) = &config.output.file_path {
        if let Some(formatter) = formatter_for(&config.output.format) {
            let sender = FileSender::open(path)
                .await
                .with_context(|| format!("Unable to open output file {}", path))?;
            let file = FormattedSink::new(formatter, Box::new(sender));
            file.write_header().await?;
            sinks.push(Box::new(file));
        }
    }

    // The poll loop only ever enqueues; formatting and I/O happen on the relay task.
    let (topic, rx) = ChannelSink::channel(config.output.channel_capacity);
    service.add_sink(Box::new(topic));
    let relay = tokio::spawn(forward_readings(rx, sinks));

    service
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("❌ Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    drop(service);
    let forwarded = relay.await.context("Reading relay task failed")?;
    info!("📦 Forwarded {} readings", forwarded);

    Ok(())
}

use env_logger::Env;
use log::error;

use miran_sensor_rust::cli::{build_cli, handle_subcommands, run_acquisition};
use miran_sensor_rust::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();

    let default_level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let config = Config::from_matches(&matches).map_err(|e| {
        error!("❌ {}", e);
        e
    })?;

    if handle_subcommands(&matches, &config).await? {
        return Ok(());
    }

    run_acquisition(config).await.map_err(|e| {
        error!("❌ {:#}", e);
        e
    })
}

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use adscope::{
    config,
    plc::{Plc, sim::SimPlc},
    session,
};

#[derive(Parser)]
#[command(author, version, about = "Interactive ADS symbol console")]
struct Cli {
    /// Target AMS Net ID
    #[arg(long)]
    ams_net_id: Option<String>,

    /// Target ADS port
    #[arg(long)]
    port: Option<u16>,

    /// Path to the configuration file. Defaults to ./adscope.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let Cli {
        ams_net_id,
        port,
        config,
    } = Cli::parse();

    let (mut config, config_path) = config::load_or_default(config)?;
    if let Some(ams_net_id) = ams_net_id {
        config.ams_net_id = ams_net_id;
    }
    if let Some(port) = port {
        config.ads_port = port;
    }
    tracing::info!(config = %config_path.display(), "configuration loaded");

    let plc = SimPlc::demo(&config.ams_net_id, config.ads_port);
    println!("Connected to {}", plc.address());

    session::run(Box::new(plc), config.paths).await?;
    Ok(())
}

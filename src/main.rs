use anyhow::Result;
use clap::Parser;
use secrecy::SecretString;
use tapo_exporter::{
    config::{Config, Credentials},
    server,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON device list
    #[arg(short, long, env = "TAPO_CONFIG_LOCATION")]
    config: String,

    /// Account used to authenticate with the devices
    #[arg(long, env = "TAPO_EMAIL")]
    email: String,

    /// Password of the device account
    #[arg(long, env = "TAPO_PASSWORD", hide_env_values = true)]
    password: String,

    /// Port to listen on for metrics (overrides config)
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting device telemetry exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    let credentials = Credentials {
        username: args.email,
        password: SecretString::new(args.password.into()),
    };

    info!("Configuration loaded successfully");
    for device in &config.devices {
        info!(device = %device.name, ip_address = %device.ip_address, "Device from config");
    }
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    if let Err(e) = server::start(config, credentials).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

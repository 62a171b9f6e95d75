// src/main.rs — minseek entry point

use clap::Parser;
use std::sync::Arc;

use minseek::api::{self, ApiState};
use minseek::engine::hub::EventHub;
use minseek::engine::runner::Engine;
use minseek::engine::store::RunStore;
use minseek::infra::config::Config;
use minseek::infra::logger;

#[derive(Parser, Debug)]
#[command(
    name = "minseek",
    version,
    about = "Interactive one-dimensional minimization service"
)]
struct Cli {
    /// Path to a TOML config file (defaults to ./minseek.toml when present).
    #[arg(long)]
    config: Option<String>,

    /// Override the listen port from the config.
    #[arg(long)]
    port: Option<u16>,

    /// Default log level when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init_logging(&cli.log);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let engine = Engine::new(
        Arc::new(RunStore::new()),
        Arc::new(EventHub::new()),
        config.runs,
    );

    api::start_server(
        &config.server,
        ApiState {
            engine: Arc::new(engine),
        },
    )
    .await
}

use std::future::IntoFuture;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tabledb::config::Config;
use tabledb::listener::Listener;
use tabledb::registry::Registry;
use tabledb::{service, web};

/// In-memory typed table store.
#[derive(Parser, Debug)]
#[command(name = "tabledb", version, about)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short = 'c', long, value_name = "FILE", env = "TABLEDB_CONFIG")]
    config: Option<PathBuf>,

    /// Address of the framed TCP front end
    #[arg(long, env = "TABLEDB_TCP_ADDRESS")]
    tcp_address: Option<String>,

    /// Address of the HTTP / WebSocket front end
    #[arg(long, env = "TABLEDB_HTTP_ADDRESS")]
    http_address: Option<String>,

    /// Directory with a static web client
    #[arg(long, value_name = "DIR", env = "TABLEDB_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "TABLEDB_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(&config.log_level);
    run(config).await
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).context("failed to load config file")?,
        None => Config::default(),
    };

    if let Some(address) = &args.tcp_address {
        config.tcp_address = address.clone();
    }
    if let Some(address) = &args.http_address {
        config.http_address = address.clone();
    }
    if let Some(dir) = &args.static_dir {
        config.static_dir = Some(dir.clone());
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    Ok(config)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("tabledb={level},tower_http={level}")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

async fn run(config: Config) -> Result<()> {
    let (handle, registry_task) = service::spawn(Registry::new(), config.channel_capacity);

    let router = web::create_router(handle.clone(), config.static_dir.as_deref());
    let http = tokio::net::TcpListener::bind(&config.http_address)
        .await
        .with_context(|| format!("failed to bind {}", config.http_address))?;
    info!(address = %http.local_addr()?, "web client listening");

    let listener = Listener::new(&config.tcp_address, config.max_frame_len)
        .await
        .with_context(|| format!("failed to bind {}", config.tcp_address))?;

    tokio::select! {
        result = axum::serve(http, router).into_future() => result.context("http server failed")?,
        _ = listener.accept(handle) => {}
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
    }

    registry_task.abort();
    info!("stopped");
    Ok(())
}

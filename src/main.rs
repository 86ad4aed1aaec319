use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use pulseboard::{config::Config, server::run_server};

#[derive(Parser)]
#[command(name = "pulseboard")]
#[command(about = "Project health dashboard over change request metadata")]
struct Args {
    /// Database file path
    #[arg(
        long,
        env = "PULSEBOARD_DATABASE_PATH",
        default_value = "./.pulseboard/pulseboard.db"
    )]
    database_path: String,

    /// Server host
    #[arg(long, env = "PULSEBOARD_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, env = "PULSEBOARD_PORT", default_value = "8050")]
    port: u16,

    /// Number of background query workers
    #[arg(long, env = "PULSEBOARD_WORKERS", default_value = "4")]
    workers: usize,

    /// Timeout for a single background query task in seconds
    #[arg(long, env = "PULSEBOARD_TASK_TIME_LIMIT_SECS", default_value = "300")]
    task_time_limit_secs: u64,

    /// How long a figure request waits for its data in seconds
    #[arg(long, env = "PULSEBOARD_DATA_WAIT_TIMEOUT_SECS", default_value = "30")]
    data_wait_timeout_secs: u64,

    /// Log level (RUST_LOG overrides when set)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing with both console and file logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Create logs directory
    let logs_dir = std::path::Path::new(".pulseboard/logs");
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "server.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Guard is kept alive by the variable scope and will be properly cleaned up on exit

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter.clone()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter),
        )
        .init();

    info!("Starting Pulseboard");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", args.database_path);
    info!("Server: {}:{}", args.host, args.port);
    info!("Workers: {}", args.workers);

    let config = Config {
        database_path: args.database_path,
        host: args.host,
        port: args.port,
        workers: args.workers,
        task_time_limit_secs: args.task_time_limit_secs,
        data_wait_timeout_secs: args.data_wait_timeout_secs,
    };

    run_server(config).await?;

    Ok(())
}

//! this binary starts the kvs server
//! to see the list of options, type: `kvs-server --help`

use clap::{Parser, ValueEnum};
use kvs::config::{DEFAULT_ADDRESS, DEFAULT_BODY_LIMIT, DEFAULT_SHUTDOWN_GRACE};
use kvs::{KvStore, KvsServer, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

// used when RUST_LOG is not set
const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
}

/// a networked, in-memory key-value store
#[derive(Debug, Parser)]
#[command(name = "kvs-server", version, author)]
struct Cli {
    /// sets the IP_ADDR:PORT that the server listens on
    #[arg(long, env = "KVS_ADDR", value_name = "IP_ADDR:PORT", default_value = DEFAULT_ADDRESS)]
    addr: String,

    /// seconds in-flight requests may run after a shutdown signal
    #[arg(
        long,
        env = "KVS_SHUTDOWN_GRACE_SECS",
        default_value_t = DEFAULT_SHUTDOWN_GRACE.as_secs()
    )]
    shutdown_grace_secs: u64,

    /// largest request body accepted, in bytes
    #[arg(long, env = "KVS_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,

    /// log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    subscriber_config(cli.log_format);

    let config = ServerConfig::build(&cli.addr, cli.shutdown_grace_secs, cli.body_limit)?;
    info!("kvs-server {}", env!("CARGO_PKG_VERSION"));
    info!(
        addr = %config.addr,
        grace = ?config.shutdown_grace,
        body_limit = config.body_limit,
        "starting"
    );

    let server = KvsServer::new(KvStore::new(), config);
    server.run().await?;
    Ok(())
}

/// configures a tracing subscriber that will log to STDERR, filtered by `RUST_LOG`
fn subscriber_config(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

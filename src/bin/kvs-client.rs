//! The kvs-client executable supports the following command line arguments:
//!
//! `kvs-client ls [--addr IP-PORT]`
//!
//!     List every key in the store, one per line.
//!
//! `kvs-client get <KEY> [--addr IP-PORT]`
//!
//!     Print the JSON encoding of the value stored at KEY, or "Key not found".
//!
//! `kvs-client set <KEY> <VALUE> [--addr IP-PORT]`
//!
//!     Store VALUE at KEY. A VALUE that is a JSON object is stored structured, anything
//!     else as raw text.
//!
//! `kvs-client rm <KEY> [--addr IP-PORT]`
//!
//!     Remove KEY. A "key not found" is treated as an error.
//!
//! --addr accepts an IP address, either v4 or v6, and a port number, with the format IP:PORT.
//! If --addr is not specified then connect on 127.0.0.1:8080.
//! Print an error and return a non-zero exit code on server error, or if IP-PORT does not
//! parse as an address.

use std::net::SocketAddr;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use kvs::config::DEFAULT_ADDRESS;
use kvs::KvsClient;
use tracing_subscriber::EnvFilter;

/// client for a kvs-server
#[derive(Debug, Parser)]
#[command(name = "kvs-client", version, author)]
struct Cli {
    /// sets the IP_ADDR:PORT of the server to connect to
    #[arg(
        long,
        global = true,
        env = "KVS_ADDR",
        value_name = "IP_ADDR:PORT",
        default_value = DEFAULT_ADDRESS
    )]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every key in the store
    Ls,
    /// Get the value of a given key
    Get {
        /// the key to look up
        key: String,
    },
    /// Set the value of a key
    Set {
        /// the key to set
        key: String,
        /// the value, a JSON object or any text
        value: String,
    },
    /// Removes a given key
    Rm {
        /// the key to remove
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    subscriber_config();
    let cli = Cli::parse();

    let addr: SocketAddr = cli
        .addr
        .parse()
        .with_context(|| format!("could not parse {} into an IP address and port", cli.addr))?;
    let client = KvsClient::new(addr)?;

    match cli.command {
        Command::Ls => {
            for key in client.list_keys().await? {
                println!("{}", key);
            }
        }
        Command::Get { key } => match client.get(&key).await? {
            Some(value) => println!("{}", serde_json::to_string(&value)?),
            None => println!("Key not found"),
        },
        Command::Set { key, value } => client.set_raw(&key, value).await?,
        Command::Rm { key } => {
            if !client.delete(&key).await? {
                bail!("Key not found");
            }
        }
    }
    Ok(())
}

/// configures a tracing subscriber that will log to STDERR, quiet unless `RUST_LOG` is set
fn subscriber_config() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Settings for running a [`KvsServer`](crate::KvsServer), with the defaults used by
//! `kvs-server` and `kvs-client`.
use std::net::SocketAddr;
use std::time::Duration;

use crate::{KvsError, Result};

/// the address the server listens on when none is given
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";

/// how long in-flight requests may keep running once shutdown begins
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// the largest request body the server buffers, in bytes
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Settings for a [`KvsServer`](crate::KvsServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// the IP address and port to listen on
    pub addr: SocketAddr,
    /// the bound on waiting for in-flight requests after a shutdown signal
    pub shutdown_grace: Duration,
    /// request bodies larger than this are answered with `413` before reaching the store
    pub body_limit: usize,
}

impl ServerConfig {
    /// validates and builds a config from raw command line / environment values
    ///
    /// # Errors
    /// returns [`KvsError::Parsing`] if `addr` is not an `IP:PORT` pair
    pub fn build(addr: &str, shutdown_grace_secs: u64, body_limit: usize) -> Result<ServerConfig> {
        let addr: SocketAddr = addr.parse().map_err(|_| {
            KvsError::Parsing(format!("could not parse {} into an IP address and port", addr))
        })?;
        Ok(ServerConfig {
            addr,
            shutdown_grace: Duration::from_secs(shutdown_grace_secs),
            body_limit,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

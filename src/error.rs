use thiserror::Error;

/// type alias for all operations on a [`KvsEngine`](crate::KvsEngine),
/// [`KvsServer`](crate::KvsServer) or [`KvsClient`](crate::KvsClient) that could fail
/// with a [`KvsError`]
pub type Result<T> = std::result::Result<T, KvsError>;

/// The Error variants used throughout the kvs crate.
/// Lower level errors from third party crates are wrapped with `#[from]` so they can be
/// propagated with `?`
#[derive(Debug, Error)]
pub enum KvsError {
    /// the store's backing map was never constructed. A store built with
    /// [`KvStore::new`](crate::KvStore::new) can never report this
    #[error("database is not initialized")]
    Uninitialized,

    /// a thread panicked while holding the store lock
    #[error("store lock was poisoned by a panicking writer")]
    LockPoisoned,

    /// variant for errors caused by socket or file IO
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// a response body from the server was not the JSON the client expected
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// an HTTP level failure inside the client
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// the serving task panicked or was cancelled
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    /// the server answered with a status the client did not expect
    #[error("unexpected response {status}: {body}")]
    UnexpectedStatus {
        /// the HTTP status code returned by the server
        status: u16,
        /// the (trimmed) plain-text body returned with it
        body: String,
    },

    /// variant for errors that occur while parsing command line options
    #[error("{0}")]
    Parsing(String),
}

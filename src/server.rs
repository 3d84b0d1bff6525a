use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, Uri};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::router::{Reply, RequestRouter};
use crate::{KvsEngine, Result, ServerConfig};

/// An HTTP server over a key value storage engine.
/// Every inbound request, whatever its method or path, is handed to one shared
/// [`RequestRouter`]. Requests are served concurrently on the tokio runtime, one task per
/// connection, each with a handle to the same engine.
///
/// # Example
/// ```rust,no_run
/// use kvs::{KvStore, KvsServer, ServerConfig};
/// # async fn example() -> kvs::Result<()> {
/// let server = KvsServer::new(KvStore::new(), ServerConfig::default());
/// // serves until Ctrl-C or SIGTERM
/// server.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct KvsServer<E: KvsEngine> {
    router: Arc<RequestRouter<E>>,
    config: ServerConfig,
}

impl<E: KvsEngine> KvsServer<E> {
    /// Create a new `KvsServer` using the given [`KvsEngine`] and settings.
    pub fn new(engine: E, config: ServerConfig) -> Self {
        KvsServer {
            router: Arc::new(RequestRouter::new(engine)),
            config,
        }
    }

    /// the settings this server was built with
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Builds the axum application: a single fallback handler that receives every request.
    pub fn app(&self) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch::<E>)
            .with_state(Arc::clone(&self.router))
            .layer(DefaultBodyLimit::max(self.config.body_limit))
            .layer(TraceLayer::new_for_http())
    }

    /// binds a listener on the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        Ok(TcpListener::bind(self.config.addr).await?)
    }

    /// Binds the configured address and serves until Ctrl-C or SIGTERM.
    ///
    /// # Errors
    /// returns [`KvsError`](crate::KvsError) if the address could not be bound or the
    /// server failed while running
    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.run_until(listener, shutdown_signal()).await
    }

    /// Serves on `listener` until `shutdown` resolves.
    ///
    /// Once `shutdown` resolves no new connections are accepted. Requests already in
    /// flight get up to [`ServerConfig::shutdown_grace`] to finish, after which the server
    /// stops waiting for them and returns.
    ///
    /// Aborting after the grace period only stops the accept loop. axum runs each
    /// connection on its own task, and those tasks live on until the tokio runtime is
    /// dropped, which for `kvs-server` is when `main` returns.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let addr: SocketAddr = listener.local_addr()?;
        let grace = self.config.shutdown_grace;
        let app = self.app();
        info!(%addr, "kvs-server listening");

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut serving = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });

        tokio::pin!(shutdown);
        tokio::select! {
            joined = &mut serving => {
                joined??;
                return Ok(());
            }
            _ = &mut shutdown => info!("shutting down, no longer accepting connections"),
        }

        let _ = stop_tx.send(());
        match timeout(grace, &mut serving).await {
            Ok(joined) => {
                joined??;
                info!("server shut down");
            }
            Err(_) => {
                warn!(?grace, "requests still in flight after grace period, closing");
                serving.abort();
            }
        }
        Ok(())
    }
}

/// the fallback handler, the body is buffered in full before the router touches the store
async fn dispatch<E: KvsEngine>(
    State(router): State<Arc<RequestRouter<E>>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Reply {
    router.handle(&method, uri.path(), &body)
}

/// Resolves on Ctrl-C, or on SIGTERM for unix targets.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = ?err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = ?err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::{ServerError, ServerResult};
use crate::shutdown::Shutdown;

/// Bind `addr` and serve `router` until `shutdown` fires.
pub async fn bind(addr: &str, router: Router, shutdown: Shutdown) -> ServerResult<RunningServer> {
    let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    serve_on(listener, router, shutdown)
}

/// Serve `router` on an already bound listener until `shutdown` fires.
pub fn serve_on(listener: TcpListener, router: Router, shutdown: Shutdown) -> ServerResult<RunningServer> {
    let local_addr = listener.local_addr()?;
    let signal = shutdown.clone();
    let task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.wait().await })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    });
    Ok(RunningServer {
        local_addr,
        shutdown,
        task,
    })
}

/// A server task running in the background.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<ServerResult<()>>,
}

impl RunningServer {
    /// The bound address, with the real port when bound to port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run until stopped, by a `/stop` request or a shutdown handle.
    pub async fn wait(self) -> ServerResult<()> {
        self.task
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?
    }

    /// Trigger a graceful shutdown and wait for in-flight requests to finish.
    pub async fn stop(self) -> ServerResult<()> {
        self.shutdown.trigger();
        self.wait().await
    }
}

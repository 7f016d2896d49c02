//! HTTP server and graceful shutdown.
//!
//! # Connections
//!
//! Each accepted socket gets its own task, served by hyper-util's `auto`
//! builder so HTTP/1.1 and HTTP/2 clients share one port. The router sits
//! behind one `Arc` shared by every connection; its state is a second `Arc`
//! inside it, so the route table is never copied.
//!
//! Bodies are buffered before routing, capped by the router's
//! [`body_limit`](crate::Router::body_limit). An oversized upload stops
//! being read at the cap instead of landing in memory first.
//!
//! # Shutdown
//!
//! On SIGTERM or Ctrl-C the server:
//!
//! 1. stops calling `accept`, so no new connection is taken on;
//! 2. waits for every connection task in its `JoinSet` to finish;
//! 3. returns from [`Server::serve`], letting `main` exit.
//!
//! A paste write in flight at that moment completes, since store calls run
//! on the blocking pool and the connection task awaits them. Give the
//! supervisor's kill timeout enough room for the slowest request.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: String,
}

impl Server {
    /// Configures the server to bind to `addr` (`host:port`, names allowed)
    /// when [`serve`](Server::serve) is called.
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Accepts connections and dispatches them through `router` until a
    /// shutdown signal arrives and all in-flight requests complete.
    pub async fn serve<S: Send + Sync + 'static>(self, router: Router<S>) -> Result<(), Error> {
        let listener = TcpListener::bind(&self.addr).await?;
        let local = listener.local_addr()?;
        let router = Arc::new(router);

        info!(addr = %local, "tsubin listening");

        let mut tasks = tokio::task::JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(&router, req, peer).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connections so the set stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("tsubin stopped");
        Ok(())
    }
}

/// Converts one hyper request, routes it, and converts the response back.
/// Every failure becomes a status code; hyper never sees an error.
async fn dispatch<S: Send + Sync + 'static>(
    router: &Router<S>,
    req: hyper::Request<hyper::body::Incoming>,
    peer: SocketAddr,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let Ok(method) = Method::try_from(req.method()) else {
        return Ok(Response::status(Status::MethodNotAllowed).into_hyper());
    };

    let response = match Request::from_http(req, method, peer, router.max_body()).await {
        Ok(req) => router.dispatch(req).await,
        Err(e) => {
            debug!(peer = %peer, "could not read request body: {e}");
            Response::status(Status::BadRequest)
        }
    };
    Ok(response.into_hyper())
}

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only on non-Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

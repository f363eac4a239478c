//! HTTP server adapter and graceful shutdown.
//!
//! The transport is deliberately thin: hyper parses the wire, this module
//! translates `hyper::Request` into arbor's [`Request`] descriptor, hands it
//! to [`App::handle`], and writes the [`Response`] back. All routing
//! decisions already happened at build time.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the listener stops accepting immediately, every
//! in-flight connection task runs to completion, and [`Server::serve`]
//! returns. Under Kubernetes, set `terminationGracePeriodSeconds` longer
//! than your slowest request.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::app::App;
use crate::error::Error;
use crate::method::Method;
use crate::request::{parse_query, Request};
use crate::response::Response;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, app: App) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // The app (tree + bound table) is read-only from here on; Arc lets
        // every connection task share it without copying or locking.
        let app = Arc::new(app);

        info!(addr = %self.addr, "arbor listening");

        // JoinSet tracks every spawned connection task so shutdown can wait
        // for all of them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a shutdown signal stops
                // the accept loop even when connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req).await }
                        });

                        // auto::Builder negotiates HTTP/1.1 or HTTP/2.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("arbor stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Translates one hyper request into the descriptor [`App::handle`] expects.
///
/// The error type is [`Infallible`](std::convert::Infallible): every failure
/// becomes an HTTP status, hyper never sees an error.
async fn dispatch(
    app: Arc<App>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let Ok(method) = Method::from_str(req.method().as_str()) else {
        return Ok(Response::status(405).into_http());
    };

    let path = req.uri().path().to_owned();
    let query = req.uri().query().map(parse_query).unwrap_or_default();

    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();

    let role = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&app.config.role_header))
        .map(|(_, value)| value.clone());

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            error!("body read error: {e}");
            return Ok(Response::status(400).into_http());
        }
    };

    let mut request = Request::new(method, path)
        .with_query(query)
        .with_headers(headers)
        .with_body(body);
    if let Some(role) = role {
        request = request.with_role(role);
    }

    Ok(app.handle(request).await.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT on Unix, Ctrl-C elsewhere.
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

    // never resolves: disables the SIGTERM arm off Unix
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

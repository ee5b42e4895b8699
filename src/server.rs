// src/server.rs

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, Method, Request, Response, StatusCode};
use log::{info, warn};
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::error::ExporterError;
use crate::metrics::MetricRegistry;

pub const METRICS_PATH: &str = "/metrics";

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);
const ACCEPT_LOG_WINDOW: Duration = Duration::from_secs(30);

/// Collapses repeated accept failures into one warning per window.
struct AcceptErrorLimiter {
    window: Duration,
    pending: u64,
    last_log: Option<Instant>,
}

impl AcceptErrorLimiter {
    fn new(window: Duration) -> Self {
        AcceptErrorLimiter {
            window,
            pending: 0,
            last_log: None,
        }
    }

    /// Counts one failure. Returns how many failures the next warning
    /// covers, or `None` while the current window is still open.
    fn record(&mut self, now: Instant) -> Option<u64> {
        self.pending += 1;
        let due = match self.last_log {
            Some(last) => now.saturating_duration_since(last) >= self.window,
            None => true,
        };
        if !due {
            return None;
        }
        self.last_log = Some(now);
        Some(std::mem::take(&mut self.pending))
    }
}

pub(crate) fn render(registry: &MetricRegistry, req: &Request<Body>) -> Response<Body> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, METRICS_PATH) => match registry.encode_text() {
            Ok(text) => Response::builder()
                .status(StatusCode::OK)
                .header(hyper::header::CONTENT_TYPE, registry.format_type())
                .body(Body::from(text))
                .unwrap_or_default(),
            Err(err) => {
                warn!("metrics encoding failed: {}", err);
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from("encoding error"))
                    .unwrap_or_default()
            }
        },
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("not found"))
            .unwrap_or_default(),
    }
}

pub async fn bind(addr: &str) -> Result<TcpListener, ExporterError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ExporterError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serves `GET /metrics` until `cancel` fires. Per-connection failures are
/// logged and do not stop the listener.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<MetricRegistry>,
    cancel: CancellationToken,
) -> Result<(), ExporterError> {
    match listener.local_addr() {
        Ok(addr) => info!("metrics endpoint listening on {}", addr),
        Err(err) => warn!("metrics endpoint local address unavailable: {}", err),
    }
    let mut accept_errors = AcceptErrorLimiter::new(ACCEPT_LOG_WINDOW);
    loop {
        let accepted = select! {
            _ = cancel.cancelled() => return Ok(()),
            accepted = listener.accept() => accepted,
        };
        let (stream, peer) = match accepted {
            Ok(conn) => conn,
            Err(err) => {
                if let Some(count) = accept_errors.record(Instant::now()) {
                    warn!("metrics accept failed ({} since last report): {}", count, err);
                }
                select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                }
                continue;
            }
        };

        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Body>| {
                let response = render(&registry, &req);
                async move { Ok::<_, Infallible>(response) }
            });
            if let Err(err) = Http::new().serve_connection(stream, service).await {
                warn!("metrics connection from {} failed: {}", peer, err);
            }
        });
    }
}

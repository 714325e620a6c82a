//! HTTP status surface
//!
//! Serves three read-only JSON endpoints on the configured bind address:
//! - `/health` - liveness plus the current orchestration phase
//! - `/info` - the whole catalog with nested collections inlined
//! - `/last_update` - the newest run-log artifact
//!
//! Sync failures never surface here as a 5xx. Only a failure to read the
//! catalog itself is reported as an internal error.

use std::net::SocketAddr;
use std::sync::Arc;

use catsync_core::domain::SyncPhase;
use catsync_core::ports::{ICatalogStore, IRunLog};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Everything the handlers read from
pub struct ApiState {
    pub store: Arc<dyn ICatalogStore>,
    pub run_log: Arc<dyn IRunLog>,
    pub phase: watch::Receiver<SyncPhase>,
}

/// HTTP server bound to one address
pub struct ApiServer {
    state: Arc<ApiState>,
    addr: SocketAddr,
}

impl ApiServer {
    /// Creates a new `ApiServer`.
    ///
    /// # Arguments
    /// * `state` - Shared handler state
    /// * `endpoint` - Address to bind, e.g. `"0.0.0.0:5000"`
    pub fn new(state: Arc<ApiState>, endpoint: &str) -> anyhow::Result<Self> {
        let addr: SocketAddr = endpoint.parse()?;
        Ok(Self { state, addr })
    }

    /// Binds and serves until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "HTTP surface listening");
        serve(listener, Arc::clone(&self.state), shutdown).await
    }
}

/// Accept loop over an already bound listener
pub async fn serve(
    listener: TcpListener,
    state: Arc<ApiState>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer) = result?;
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(req, &state).await }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        error!(error = %e, peer = %peer, "HTTP connection error");
                    }
                });
            }
            _ = shutdown.cancelled() => {
                info!("HTTP surface shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: &ApiState,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    debug!(method = %req.method(), path = req.uri().path(), "HTTP request");
    if req.method() != Method::GET {
        return Ok(json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &json!({ "error": "Method not allowed" }),
        ));
    }
    Ok(respond(req.uri().path(), state).await)
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    #[serde(flatten)]
    phase: SyncPhase,
}

/// Routes one GET path to its response
pub async fn respond(path: &str, state: &ApiState) -> Response<Full<Bytes>> {
    match path {
        "/health" => {
            let body = HealthBody {
                status: "ok",
                phase: *state.phase.borrow(),
            };
            json_response(StatusCode::OK, &body)
        }
        "/info" => match state.store.load_catalog().await {
            Ok(products) => json_response(StatusCode::OK, &products),
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to load catalog");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({ "error": format!("{e:#}") }),
                )
            }
        },
        "/last_update" => match state.run_log.latest().await {
            Ok(Some(entry)) => json_response(StatusCode::OK, &entry),
            Ok(None) => json_response(
                StatusCode::NOT_FOUND,
                &json!({ "error": "No sync logs found" }),
            ),
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to read run log");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({ "error": format!("{e:#}") }),
                )
            }
        },
        _ => json_response(StatusCode::NOT_FOUND, &json!({ "error": "Not Found" })),
    }
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            error!(error = %e, "Failed to encode response body");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Failed to encode response"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

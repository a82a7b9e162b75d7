//! HTTP/1.1 transport over hyper.

use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request as HyperRequest, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use oxide_router::{Method, Request, Response};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::app::Application;
use crate::error::Result;

/// Binds the configured address and serves `app` until the process exits.
///
/// # Errors
///
/// Fails when the address cannot be bound.
pub async fn run(app: Application) -> Result<()> {
    let listener = TcpListener::bind(app.config().addr.as_str()).await?;
    serve(Arc::new(app), listener).await
}

/// Serves `app` on an already bound listener.
///
/// Each connection runs on its own task; each request is dispatched on the
/// blocking pool so controllers may do synchronous work.
///
/// # Errors
///
/// Fails when accepting a connection fails.
pub async fn serve(app: Arc<Application>, listener: TcpListener) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, app = %app.config().app_name, "Listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let app = app.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| handle_request(req, app.clone()));

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%peer, error = %err, "Error serving connection");
            }
        });
    }
}

async fn handle_request(
    req: HyperRequest<Incoming>,
    app: Arc<Application>,
) -> std::result::Result<HyperResponse<Full<Bytes>>, Infallible> {
    let response = match to_request(req, app.config().max_client_body_size).await {
        Inbound::Ready(request) => tokio::task::spawn_blocking(move || app.handle(request))
            .await
            .unwrap_or_else(|err| {
                error!(error = %err, "Dispatch task failed");
                Response::plain_error(500)
            }),
        Inbound::Rejected(request, status) => app.reject(request, status),
    };
    Ok(to_hyper(response))
}

enum Inbound {
    /// A request ready for dispatch.
    Ready(Request),
    /// A request answered with an error page without dispatch.
    Rejected(Request, u16),
}

/// Converts a hyper request, reading at most `limit` body bytes.
async fn to_request(req: HyperRequest<Incoming>, limit: usize) -> Inbound {
    let (parts, body) = req.into_parts();

    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
    let Some(method) = Method::parse(parts.method.as_str()) else {
        debug!(method = %parts.method, "Unsupported method");
        return Inbound::Rejected(Request::new(Method::Get, target), 404);
    };
    let mut request = Request::new(method, target);

    for (key, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            request.headers.insert(key.to_string(), value.to_string());
        }
    }

    match Limited::new(body, limit).collect().await {
        Ok(collected) => request.body = collected.to_bytes().to_vec(),
        Err(err) => {
            warn!(path = %request.path, limit, error = %err, "Failed to read request body");
            return Inbound::Rejected(request, 500);
        }
    }

    Inbound::Ready(request)
}

fn to_hyper(response: Response) -> HyperResponse<Full<Bytes>> {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = HyperResponse::builder().status(status);
    for (key, value) in &response.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
        .body(Full::new(Bytes::from(response.body)))
        .unwrap_or_else(|err| {
            error!(error = %err, "Invalid response");
            let mut fallback = HyperResponse::new(Full::new(Bytes::from_static(b"Internal Server Error")));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

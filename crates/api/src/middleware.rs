use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Response header carrying the id assigned to each request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Log every request: method, path, remote address, status and duration.
///
/// Each request gets a time-ordered id, recorded on the span and echoed back
/// in the `x-request-id` response header. The remote address is only known
/// when the server was started with `into_make_service_with_connect_info`.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = Uuid::now_v7();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let span = tracing::info_span!(
        "request",
        %request_id,
        %method,
        %path,
        %remote_addr,
    );

    async move {
        tracing::info!("request started");

        let mut response = next.run(req).await;

        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Request logging middleware
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    // Path only: guest tokens may travel in the query string
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    tracing::info!(
        method = %method,
        uri = %path,
        status = %status,
        duration_ms = %start.elapsed().as_millis(),
        "Request processed"
    );

    response
}

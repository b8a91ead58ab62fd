use axum::{body::Body as AxumBody, http::Request, middleware::Next, response::Response};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(1000);

pub async fn request_timing(req: Request<AxumBody>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let elapsed = started.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;
    let status = response.status().as_u16();
    info!(%method, %path, status, elapsed_ms, "Request handled.");
    if elapsed > SLOW_REQUEST_THRESHOLD {
        warn!(%method, %path, elapsed_ms, "Slow request");
    }
    response
}

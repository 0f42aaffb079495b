use std::time::{Duration, Instant};

use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error,
};
use tracing::{info, info_span, Instrument};

/// Logs one line per request with its status and latency.
pub async fn trace_request(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start_time = Instant::now();

    let span = info_span!(
        "http_request",
        method = %req.method(),
        path = %req.path(),
        peer = ?req.peer_addr(),
    );

    async move {
        let response = next.call(req).await;

        let latency_ms = latency_millis(start_time.elapsed());

        match &response {
            Ok(res) => info!(
                status = res.status().as_u16(),
                latency_ms,
                "request finished"
            ),
            Err(err) => info!(
                error = %err,
                latency_ms,
                "request failed"
            ),
        }

        response
    }
    .instrument(span)
    .await
}

fn latency_millis(latency: Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}

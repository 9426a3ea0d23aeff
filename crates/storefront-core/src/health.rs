use std::fmt::Display;

use axum::http::StatusCode;

/// Handler for `GET /healthz`: liveness only.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Map a readiness check outcome to a status code. Failures are logged with the component name.
pub fn readiness<E: Display>(component: &'static str, outcome: Result<(), E>) -> StatusCode {
    match outcome {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(component, error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

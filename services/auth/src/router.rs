use axum::{
    Router,
    routing::{get, post},
};
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::trace::TraceLayer;

use storefront_core::health::healthz;
use storefront_core::middleware::request_id_layer;

use crate::handlers::{
    health::readyz,
    otp::{issue_otp, verify_otp},
    session::{check_session, sign_out},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // OTP
        .route("/auth/otp", post(issue_otp))
        .route("/auth/otp/verify", post(verify_otp))
        // Session
        .route("/auth/session", get(check_session).delete(sign_out))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}

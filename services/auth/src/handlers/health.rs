use axum::{extract::State, http::StatusCode};

use storefront_core::health::readiness;

use crate::state::AppState;

/// `GET /readyz`: the database and the session store must both answer.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    let db = readiness("postgres", state.db.ping().await);
    if db != StatusCode::OK {
        return db;
    }
    readiness("session store", state.session_store.ping().await)
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use storefront_auth_types::wire::{ErrorBody, ErrorKind};

/// Auth service error variants. Every failure is scoped to the single call that raised it.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("invalid identifier")]
    InvalidIdentifier,
    #[error("could not deliver the code")]
    DispatchFailure(#[source] anyhow::Error),
    #[error("storage unavailable")]
    StoreFailure(#[from] anyhow::Error),
    #[error("no active code for this identifier")]
    NotFound,
    #[error("code expired")]
    Expired,
    #[error("code does not match")]
    Mismatch,
    #[error("account could not be recovered")]
    RecoveryFailure(#[source] anyhow::Error),
    #[error("could not start a session")]
    MintFailure(#[source] anyhow::Error),
    #[error("invalid token")]
    InvalidToken,
}

impl AuthServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier => ErrorKind::InvalidIdentifier,
            Self::DispatchFailure(_) => ErrorKind::DispatchFailure,
            Self::StoreFailure(_) => ErrorKind::StoreFailure,
            Self::NotFound => ErrorKind::OtpNotFound,
            Self::Expired => ErrorKind::OtpExpired,
            Self::Mismatch => ErrorKind::OtpMismatch,
            Self::RecoveryFailure(_) => ErrorKind::RecoveryFailure,
            Self::MintFailure(_) => ErrorKind::MintFailure,
            Self::InvalidToken => ErrorKind::InvalidToken,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::Expired | Self::Mismatch | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::DispatchFailure(_) => StatusCode::BAD_GATEWAY,
            Self::StoreFailure(_) | Self::MintFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::RecoveryFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::DispatchFailure(e)
            | Self::StoreFailure(e)
            | Self::RecoveryFailure(e)
            | Self::MintFailure(e) => Some(e),
            _ => None,
        }
    }

    /// Wrap any error from the session path as `MintFailure`, keeping existing ones as is.
    pub fn into_mint_failure(self) -> Self {
        match self {
            Self::MintFailure(_) => self,
            other => Self::MintFailure(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client outcomes and TraceLayer already records them.
        // Server-side failures carry an anyhow chain that must reach the logs.
        if let Some(cause) = self.cause() {
            tracing::error!(
                kind = self.kind().as_str(),
                error = %self,
                cause = %format!("{cause:#}"),
                "request failed"
            );
        }
        let body = ErrorBody {
            ok: false,
            kind: self.kind(),
            message: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

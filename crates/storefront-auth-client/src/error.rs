use reqwest::StatusCode;

use storefront_auth_types::wire::{ErrorBody, ErrorKind};

/// What the user is told when an auth call fails. Internal kinds never reach the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UserFacingError {
    #[error("That code didn't work. Request a new one and try again.")]
    RetryWithNewCode,
    #[error("Something went wrong on our side. Please try again in a moment.")]
    TryAgainLater,
    #[error("We couldn't sign you in. Please contact support.")]
    ContactSupport,
    #[error("Enter your phone number with country code, e.g. +15551234567.")]
    InvalidPhoneNumber,
}

impl From<ErrorKind> for UserFacingError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::OtpNotFound | ErrorKind::OtpExpired | ErrorKind::OtpMismatch => {
                Self::RetryWithNewCode
            }
            ErrorKind::RecoveryFailure => Self::ContactSupport,
            ErrorKind::InvalidIdentifier => Self::InvalidPhoneNumber,
            ErrorKind::DispatchFailure
            | ErrorKind::StoreFailure
            | ErrorKind::MintFailure
            | ErrorKind::InvalidToken
            | ErrorKind::Unknown => Self::TryAgainLater,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The service answered with a structured error body.
    #[error("auth service returned {status}: {}", .body.message)]
    Api { status: StatusCode, body: ErrorBody },
    /// Non-success status without a parsable error body.
    #[error("auth service returned {0}")]
    Status(StatusCode),
    #[error("auth service unreachable")]
    Transport(#[from] reqwest::Error),
    #[error("session storage failed")]
    Storage(#[from] std::io::Error),
    #[error("stored session is corrupt")]
    Corrupt(#[from] serde_json::Error),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { body, .. } => body.kind,
            _ => ErrorKind::Unknown,
        }
    }

    pub fn user_facing(&self) -> UserFacingError {
        self.kind().into()
    }
}

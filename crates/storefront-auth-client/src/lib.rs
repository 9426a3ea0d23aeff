//! Client-side session contract for the storefront auth service.
//!
//! [`SessionManager`] owns the one authentication state of a client process and publishes it
//! on a `watch` channel. It talks to the service through an [`AuthBackend`] and keeps tokens
//! in a [`SessionStorage`].

pub mod backend;
pub mod error;
pub mod manager;
pub mod state;
pub mod storage;

pub use backend::{AuthBackend, HttpAuthBackend};
pub use error::{ClientError, UserFacingError};
pub use manager::{SessionEvent, SessionManager, VerifyOutcome};
pub use state::{AuthState, SessionInfo};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage, StoredSession};

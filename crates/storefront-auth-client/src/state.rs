use storefront_domain::id::IdentityId;

/// Who is signed in, as far as UI consumers need to know. Tokens stay in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub identity_id: IdentityId,
    /// Access-token expiry, seconds since UNIX epoch.
    pub access_token_exp: u64,
}

/// Client authentication state.
///
/// ```text
/// Anonymous ──start──▶ Restoring ──found──▶ Authenticated
///     ▲                    │                     │
///     └──────none──────────┘                     │
///     └────────────────sign out / expiry─────────┘
/// Anonymous | Restoring ──verify──▶ Authenticated
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Restoring,
    Authenticated(SessionInfo),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn session(&self) -> Option<&SessionInfo> {
        match self {
            Self::Authenticated(info) => Some(info),
            _ => None,
        }
    }
}

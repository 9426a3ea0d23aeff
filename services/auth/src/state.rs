use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::infra::cache::SessionStore;
use crate::infra::db::DbOtpRepository;
use crate::infra::identity_api::AdminApiIdentityStore;
use crate::infra::session::JwtSessionInfrastructure;
use crate::infra::sms::SmsDispatcher;
use crate::usecase::issue::IssueOtpUseCase;
use crate::usecase::resolve::{IdentityResolver, ResolverPolicy};
use crate::usecase::session::{CheckSessionUseCase, SessionMinter, SignOutUseCase};
use crate::usecase::verify::VerifyOtpUseCase;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub session_store: SessionStore,
    pub identity_store: AdminApiIdentityStore,
    pub dispatcher: SmsDispatcher,
    pub jwt_secret: String,
    pub cookie_domain: String,
    pub otp_ttl: chrono::Duration,
    pub resolver_policy: ResolverPolicy,
    pub call_timeout: Duration,
}

type Sessions = JwtSessionInfrastructure<SessionStore>;

impl AppState {
    pub fn otp_repo(&self) -> DbOtpRepository {
        DbOtpRepository {
            db: self.db.clone(),
        }
    }

    pub fn sessions(&self) -> Sessions {
        JwtSessionInfrastructure {
            cache: self.session_store.clone(),
            jwt_secret: self.jwt_secret.clone(),
        }
    }

    pub fn issue_otp(&self) -> IssueOtpUseCase<DbOtpRepository, SmsDispatcher> {
        IssueOtpUseCase {
            otps: self.otp_repo(),
            dispatcher: self.dispatcher.clone(),
            ttl: self.otp_ttl,
            call_timeout: self.call_timeout,
        }
    }

    pub fn verify_otp(&self) -> VerifyOtpUseCase<DbOtpRepository, AdminApiIdentityStore, Sessions> {
        VerifyOtpUseCase {
            otps: self.otp_repo(),
            resolver: IdentityResolver {
                store: self.identity_store.clone(),
                policy: self.resolver_policy,
            },
            minter: SessionMinter {
                sessions: self.sessions(),
                call_timeout: self.call_timeout,
            },
            call_timeout: self.call_timeout,
        }
    }

    pub fn check_session(&self) -> CheckSessionUseCase<Sessions> {
        CheckSessionUseCase {
            sessions: self.sessions(),
            call_timeout: self.call_timeout,
        }
    }

    pub fn sign_out(&self) -> SignOutUseCase<Sessions> {
        SignOutUseCase {
            sessions: self.sessions(),
            call_timeout: self.call_timeout,
        }
    }
}

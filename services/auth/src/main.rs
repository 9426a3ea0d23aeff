use sea_orm::Database;
use tracing::{info, warn};

use storefront_auth::config::AuthConfig;
use storefront_auth::infra::cache::{MemorySessionCache, RedisSessionCache, SessionStore};
use storefront_auth::infra::db::DbOtpRepository;
use storefront_auth::infra::identity_api::AdminApiIdentityStore;
use storefront_auth::infra::sms::{LogDispatcher, SmsDispatcher, TwilioSmsDispatcher};
use storefront_auth::router::build_router;
use storefront_auth::state::AppState;
use storefront_auth::usecase::purge::PurgeExpiredOtpsUseCase;
use storefront_core::config::Config;
use storefront_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let session_store = match &config.redis_url {
        Some(url) => {
            let pool = deadpool_redis::Config::from_url(url)
                .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                .expect("failed to create Redis pool");
            SessionStore::Redis(RedisSessionCache { pool })
        }
        None => {
            warn!("redis not configured, sessions are kept in process memory");
            SessionStore::Memory(MemorySessionCache::default())
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.call_timeout())
        .build()
        .expect("failed to build HTTP client");

    let dispatcher = match config.twilio() {
        Some(twilio) => SmsDispatcher::Twilio(TwilioSmsDispatcher::new(
            http.clone(),
            &config.twilio_api_base,
            twilio.account_sid.to_owned(),
            twilio.auth_token.to_owned(),
            twilio.from_number.to_owned(),
        )),
        None => {
            warn!("twilio not configured, otp codes will not be delivered");
            SmsDispatcher::Log(LogDispatcher)
        }
    };

    let purge = PurgeExpiredOtpsUseCase {
        otps: DbOtpRepository { db: db.clone() },
        retention: config.otp_retention(),
        call_timeout: config.call_timeout(),
    };
    let purge_every = config.purge_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_every);
        loop {
            ticker.tick().await;
            if let Err(e) = purge.execute().await {
                warn!(error = %e, "otp purge failed");
            }
        }
    });

    let state = AppState {
        db,
        session_store,
        identity_store: AdminApiIdentityStore::new(
            http,
            &config.identity_api_url,
            config.identity_api_key.clone(),
        ),
        dispatcher,
        jwt_secret: config.jwt_secret.clone(),
        cookie_domain: config.cookie_domain.clone(),
        otp_ttl: config.otp_ttl(),
        resolver_policy: config.resolver_policy(),
        call_timeout: config.call_timeout(),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}

use storefront_auth::error::AuthServiceError;
use storefront_auth::usecase::session::{
    CheckSessionInput, CheckSessionUseCase, SessionMinter, SignOutInput, SignOutUseCase,
};

use crate::helpers::{MemorySessionCache, TIMEOUT, identity, sessions};

const PHONE: &str = "+15551234567";

fn minter(cache: MemorySessionCache) -> SessionMinter<crate::helpers::TestSessions> {
    SessionMinter {
        sessions: sessions(cache),
        call_timeout: TIMEOUT,
    }
}

#[tokio::test]
async fn should_mint_fresh_session_each_time() {
    let cache = MemorySessionCache::default();
    let minter = minter(cache.clone());
    let who = identity(PHONE);

    let first = minter.mint(&who).await.unwrap();
    let second = minter.mint(&who).await.unwrap();

    assert_eq!(first.identity_id, who.id);
    assert_eq!(second.identity_id, who.id);
    assert_ne!(first.tokens.access_token, second.tokens.access_token);
    assert!(
        cache.bootstrap.lock().unwrap().is_empty(),
        "bootstrap credentials are redeemed within the call"
    );
}

#[tokio::test]
async fn should_map_cache_failure_to_mint_failure() {
    let result = minter(MemorySessionCache::failing())
        .mint(&identity(PHONE))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::MintFailure(_))),
        "expected MintFailure, got {result:?}"
    );
}

#[tokio::test]
async fn should_check_then_reject_after_sign_out() {
    let cache = MemorySessionCache::default();
    let who = identity(PHONE);
    let session = minter(cache.clone()).mint(&who).await.unwrap();

    let check = CheckSessionUseCase {
        sessions: sessions(cache.clone()),
        call_timeout: TIMEOUT,
    };
    let info = check
        .execute(CheckSessionInput {
            access_token: session.tokens.access_token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(info.identity_id, who.id);

    SignOutUseCase {
        sessions: sessions(cache.clone()),
        call_timeout: TIMEOUT,
    }
    .execute(SignOutInput {
        access_token: session.tokens.access_token.clone(),
        refresh_token: Some(session.tokens.refresh_token.clone()),
    })
    .await
    .unwrap();

    let result = check
        .execute(CheckSessionInput {
            access_token: session.tokens.access_token,
        })
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
    assert_eq!(cache.revoked.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_reject_garbage_access_token() {
    let result = CheckSessionUseCase {
        sessions: sessions(MemorySessionCache::default()),
        call_timeout: TIMEOUT,
    }
    .execute(CheckSessionInput {
        access_token: "garbage".to_owned(),
    })
    .await;

    assert!(
        matches!(result, Err(AuthServiceError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_surface_store_failure_on_sign_out() {
    let session = minter(MemorySessionCache::default())
        .mint(&identity(PHONE))
        .await
        .unwrap();

    let result = SignOutUseCase {
        sessions: sessions(MemorySessionCache::failing()),
        call_timeout: TIMEOUT,
    }
    .execute(SignOutInput {
        access_token: session.tokens.access_token,
        refresh_token: None,
    })
    .await;

    assert!(
        matches!(result, Err(AuthServiceError::StoreFailure(_))),
        "expected StoreFailure, got {result:?}"
    );
}

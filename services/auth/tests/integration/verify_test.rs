use storefront_auth::error::AuthServiceError;
use storefront_auth::usecase::issue::IssueOtpInput;
use storefront_auth::usecase::verify::VerifyOtpInput;
use storefront_auth_types::token::{TokenKind, validate_session_token};

use crate::helpers::{
    MemorySessionCache, MockDispatcher, MockIdentityStore, MockOtpRepo, TEST_SECRET,
    complete_profile, identity, issue_uc, otp_record, verify_uc,
};

const PHONE: &str = "+15551234567";

fn input(identifier: &str, code: &str) -> VerifyOtpInput {
    VerifyOtpInput {
        identifier: identifier.to_owned(),
        code: code.to_owned(),
    }
}

/// Any 6-digit code different from `code`.
fn wrong(code: &str) -> String {
    if code == "000000" {
        "000001".to_owned()
    } else {
        "000000".to_owned()
    }
}

async fn issue(otps: &MockOtpRepo, dispatcher: &MockDispatcher, identifier: &str) -> String {
    issue_uc(otps.clone(), dispatcher.clone())
        .execute(IssueOtpInput {
            identifier: identifier.to_owned(),
        })
        .await
        .unwrap();
    dispatcher.last_code(identifier).unwrap()
}

// Scenario A
#[tokio::test]
async fn should_create_identity_and_session_for_new_phone() {
    let otps = MockOtpRepo::empty();
    let dispatcher = MockDispatcher::new();
    let store = MockIdentityStore::empty();

    let code = issue(&otps, &dispatcher, PHONE).await;
    assert_eq!(otps.unconsumed_for(PHONE).len(), 1);

    let out = verify_uc(otps.clone(), store.clone(), MemorySessionCache::default())
        .execute(input(PHONE, &code))
        .await
        .unwrap();

    assert!(out.is_new_identity);
    assert!(!out.profile_complete);
    let identities = store.all_identities();
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].identifier, PHONE);
    assert_eq!(identities[0].id, out.identity_id);
    assert_eq!(*store.stubs.lock().unwrap(), vec![out.identity_id]);

    let info = validate_session_token(
        &out.session.tokens.access_token,
        TEST_SECRET,
        TokenKind::Access,
    )
    .unwrap();
    assert_eq!(info.identity_id, out.identity_id);
    assert_eq!(info.login_key, PHONE);
    assert!(
        validate_session_token(
            &out.session.tokens.refresh_token,
            TEST_SECRET,
            TokenKind::Refresh
        )
        .is_ok()
    );
    assert!(otps.unconsumed_for(PHONE).is_empty(), "code must be consumed");
}

#[tokio::test]
async fn should_return_existing_identity_found_on_first_page() {
    let existing = identity(PHONE);
    let store = MockIdentityStore::with_listed(vec![existing.clone()]);
    store.set_profile(existing.id, complete_profile());
    let otps = MockOtpRepo::empty();
    otps.records_handle()
        .lock()
        .unwrap()
        .push(otp_record(PHONE, "123456"));

    let out = verify_uc(otps, store.clone(), MemorySessionCache::default())
        .execute(input(PHONE, "123456"))
        .await
        .unwrap();

    assert_eq!(out.identity_id, existing.id);
    assert!(!out.is_new_identity);
    assert!(out.profile_complete);
    assert!(store.created.lock().unwrap().is_empty());
}

// Scenario B
#[tokio::test]
async fn should_fail_expired_even_with_matching_code() {
    let otps = MockOtpRepo::empty();
    let dispatcher = MockDispatcher::new();
    let code = issue(&otps, &dispatcher, PHONE).await;
    otps.age_all(chrono::Duration::minutes(11));

    let result = verify_uc(
        otps.clone(),
        MockIdentityStore::empty(),
        MemorySessionCache::default(),
    )
    .execute(input(PHONE, &code))
    .await;

    assert!(
        matches!(result, Err(AuthServiceError::Expired)),
        "expected Expired, got {result:?}"
    );
    assert_eq!(
        otps.unconsumed_for(PHONE).len(),
        1,
        "expired record is rejected, not deleted"
    );
}

// Scenario C
#[tokio::test]
async fn should_reject_wrong_code_then_accept_reissued_code() {
    let otps = MockOtpRepo::empty();
    let dispatcher = MockDispatcher::new();
    let store = MockIdentityStore::empty();
    let uc = verify_uc(otps.clone(), store.clone(), MemorySessionCache::default());

    let first = issue(&otps, &dispatcher, PHONE).await;
    let result = uc.execute(input(PHONE, &wrong(&first))).await;
    assert!(
        matches!(result, Err(AuthServiceError::Mismatch)),
        "expected Mismatch, got {result:?}"
    );
    let before = otps.unconsumed_for(PHONE);
    assert_eq!(before.len(), 1, "mismatch leaves the record unconsumed");

    let second = issue(&otps, &dispatcher, PHONE).await;
    let after = otps.unconsumed_for(PHONE);
    assert_eq!(after.len(), 1);
    assert_ne!(after[0].id, before[0].id, "old record invalidated");

    let out = uc.execute(input(PHONE, &second)).await.unwrap();
    assert!(out.is_new_identity);
}

#[tokio::test]
async fn should_accept_correct_code_after_mismatch() {
    let otps = MockOtpRepo::empty();
    let dispatcher = MockDispatcher::new();
    let uc = verify_uc(
        otps.clone(),
        MockIdentityStore::empty(),
        MemorySessionCache::default(),
    );
    let code = issue(&otps, &dispatcher, PHONE).await;

    assert!(uc.execute(input(PHONE, &wrong(&code))).await.is_err());
    assert!(uc.execute(input(PHONE, &code)).await.is_ok());
}

#[tokio::test]
async fn should_fail_not_found_on_replay() {
    let otps = MockOtpRepo::empty();
    let dispatcher = MockDispatcher::new();
    let uc = verify_uc(
        otps.clone(),
        MockIdentityStore::empty(),
        MemorySessionCache::default(),
    );
    let code = issue(&otps, &dispatcher, PHONE).await;

    uc.execute(input(PHONE, &code)).await.unwrap();
    let replay = uc.execute(input(PHONE, &code)).await;

    assert!(
        matches!(replay, Err(AuthServiceError::NotFound)),
        "expected NotFound, got {replay:?}"
    );
}

#[tokio::test]
async fn should_fail_not_found_without_issued_code() {
    let uc = verify_uc(
        MockOtpRepo::empty(),
        MockIdentityStore::empty(),
        MemorySessionCache::default(),
    );

    for identifier in [PHONE, "not-a-phone"] {
        let result = uc.execute(input(identifier, "123456")).await;
        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound for {identifier:?}, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_let_exactly_one_concurrent_verify_win() {
    let otps = MockOtpRepo::empty();
    let dispatcher = MockDispatcher::new();
    let store = MockIdentityStore::empty();
    let code = issue(&otps, &dispatcher, PHONE).await;

    let a = verify_uc(otps.clone(), store.clone(), MemorySessionCache::default());
    let b = verify_uc(otps.clone(), store.clone(), MemorySessionCache::default());

    let (ra, rb) = tokio::join!(
        a.execute(input(PHONE, &code)),
        b.execute(input(PHONE, &code))
    );

    let wins = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one caller may consume the code");
    let loser = if ra.is_ok() { rb } else { ra };
    assert!(
        matches!(loser, Err(AuthServiceError::NotFound)),
        "expected NotFound, got {loser:?}"
    );
    assert_eq!(store.all_identities().len(), 1);
}

#[tokio::test]
async fn should_keep_code_consumed_when_resolution_fails() {
    let otps = MockOtpRepo::empty();
    let dispatcher = MockDispatcher::new();
    let store = MockIdentityStore {
        fail_create: true,
        ..MockIdentityStore::default()
    };
    let code = issue(&otps, &dispatcher, PHONE).await;

    let result = verify_uc(otps.clone(), store, MemorySessionCache::default())
        .execute(input(PHONE, &code))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::StoreFailure(_))),
        "expected StoreFailure, got {result:?}"
    );
    assert!(otps.unconsumed_for(PHONE).is_empty());
}

#[tokio::test]
async fn should_surface_mint_failure_and_keep_code_consumed() {
    let otps = MockOtpRepo::empty();
    let dispatcher = MockDispatcher::new();
    let store = MockIdentityStore::empty();
    let code = issue(&otps, &dispatcher, PHONE).await;

    let result = verify_uc(otps.clone(), store.clone(), MemorySessionCache::failing())
        .execute(input(PHONE, &code))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::MintFailure(_))),
        "expected MintFailure, got {result:?}"
    );
    assert!(otps.unconsumed_for(PHONE).is_empty());
    assert_eq!(
        store.all_identities().len(),
        1,
        "identity stays created for the next attempt"
    );
}

#[tokio::test]
async fn should_surface_store_failure_on_lookup() {
    let result = verify_uc(
        MockOtpRepo::failing(),
        MockIdentityStore::empty(),
        MemorySessionCache::default(),
    )
    .execute(input(PHONE, "123456"))
    .await;

    assert!(
        matches!(result, Err(AuthServiceError::StoreFailure(_))),
        "expected StoreFailure, got {result:?}"
    );
}

//! Identity API and SMS adapters against in-process fake backends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use uuid::Uuid;

use storefront_auth::domain::repository::{IdentityStore, OtpDispatcher};
use storefront_auth::domain::types::{CreateOutcome, IdentityAttrs};
use storefront_auth::error::AuthServiceError;
use storefront_auth::infra::identity_api::AdminApiIdentityStore;
use storefront_auth::infra::sms::TwilioSmsDispatcher;
use storefront_auth::usecase::resolve::IdentityResolver;
use storefront_domain::id::IdentityId;
use storefront_domain::identifier::PhoneNumber;
use storefront_domain::pagination::PageRequest;

use crate::helpers::policy;

const API_KEY: &str = "service-key";
const TAKEN_PHONE: &str = "+15550000001";
const BROKEN_PHONE: &str = "+15550000500";

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Fake admin API ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct FakeAdmin {
    /// `(id, phone)` in store order.
    users: Arc<Mutex<Vec<(Uuid, Option<String>)>>>,
    profiles: Arc<Mutex<HashMap<Uuid, Value>>>,
    created_bodies: Arc<Mutex<Vec<Value>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    apikey == Some(API_KEY) && bearer == Some("Bearer service-key")
}

async fn list_users(
    State(fake): State<FakeAdmin>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, u32>>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }
    let page = q.get("page").copied().unwrap_or(1) as usize;
    let per_page = q.get("per_page").copied().unwrap_or(50) as usize;
    let users: Vec<Value> = fake
        .users
        .lock()
        .unwrap()
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|(id, phone)| json!({ "id": id, "phone": phone }))
        .collect();
    Json(json!({ "users": users })).into_response()
}

async fn create_user(
    State(fake): State<FakeAdmin>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }
    fake.created_bodies.lock().unwrap().push(body.clone());
    let phone = body["phone"].as_str().unwrap_or_default().to_owned();
    match phone.as_str() {
        TAKEN_PHONE => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "msg": "phone already registered" })),
        )
            .into_response(),
        BROKEN_PHONE => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => {
            let id = Uuid::new_v4();
            fake.users.lock().unwrap().push((id, Some(phone.clone())));
            (StatusCode::CREATED, Json(json!({ "id": id, "phone": phone }))).into_response()
        }
    }
}

async fn get_profile(State(fake): State<FakeAdmin>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match fake.profiles.lock().unwrap().get(&id) {
        Some(p) => Json(p.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_profile(
    State(fake): State<FakeAdmin>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let Some(id) = body["id"].as_str().and_then(|s| s.parse::<Uuid>().ok()) else {
        return StatusCode::BAD_REQUEST;
    };
    let mut profiles = fake.profiles.lock().unwrap();
    if profiles.contains_key(&id) {
        return StatusCode::CONFLICT;
    }
    profiles.insert(id, json!({ "full_name": null, "email": null }));
    StatusCode::CREATED
}

async fn admin_store() -> (FakeAdmin, AdminApiIdentityStore) {
    let fake = FakeAdmin::default();
    let router = Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/profiles", post(create_profile))
        .route("/profiles/{id}", get(get_profile))
        .with_state(fake.clone());
    let base = spawn(router).await;
    let store = AdminApiIdentityStore::new(reqwest::Client::new(), &base, API_KEY.to_owned());
    (fake, store)
}

#[tokio::test]
async fn should_list_requested_page_and_skip_users_without_phone() {
    let (fake, store) = admin_store().await;
    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    {
        let mut users = fake.users.lock().unwrap();
        users.push((ids[0], Some("+15551110000".to_owned())));
        users.push((ids[1], None));
        users.push((ids[2], Some("+15552220000".to_owned())));
    }

    let first = store.list(PageRequest::first(2)).await.unwrap();
    let second = store.list(PageRequest::first(2).next()).await.unwrap();

    assert_eq!(first.raw_len, 2);
    assert_eq!(first.identities.len(), 1);
    assert_eq!(first.identities[0].id, IdentityId(ids[0]));
    assert_eq!(first.identities[0].identifier, "+15551110000");
    assert_eq!(second.raw_len, 1);
    assert_eq!(second.identities.len(), 1);
    assert_eq!(second.identities[0].identifier, "+15552220000");
}

#[tokio::test]
async fn should_resolve_taken_phone_listed_after_pages_of_phoneless_users() {
    let (fake, store) = admin_store().await;
    let existing = Uuid::new_v4();
    {
        let mut users = fake.users.lock().unwrap();
        for _ in 0..4 {
            users.push((Uuid::new_v4(), None));
        }
        users.push((existing, Some(TAKEN_PHONE.to_owned())));
    }
    let resolver = IdentityResolver {
        store,
        policy: policy(2),
    };

    let resolution = resolver.resolve(TAKEN_PHONE).await.unwrap();

    assert_eq!(resolution.identity.id, IdentityId(existing));
    assert_eq!(resolution.identity.identifier, TAKEN_PHONE);
    assert_eq!(
        fake.created_bodies.lock().unwrap().len(),
        1,
        "only the canonical create that reported the conflict"
    );
}

#[tokio::test]
async fn should_create_identity_with_attrs() {
    let (fake, store) = admin_store().await;

    let outcome = store
        .create("+15553330000", &IdentityAttrs::disambiguated("+15553330000"))
        .await
        .unwrap();

    let identity = match outcome {
        CreateOutcome::Created(identity) => identity,
        other => panic!("expected Created, got {other:?}"),
    };
    assert_eq!(identity.identifier, "+15553330000");
    let bodies = fake.created_bodies.lock().unwrap();
    assert_eq!(bodies[0]["phone_confirmed"], true);
    assert_eq!(bodies[0]["disambiguated_from"], "+15553330000");
}

#[tokio::test]
async fn should_report_conflict_as_already_exists() {
    let (_fake, store) = admin_store().await;

    let outcome = store
        .create(TAKEN_PHONE, &IdentityAttrs::canonical())
        .await
        .unwrap();

    assert_eq!(outcome, CreateOutcome::AlreadyExists);
}

#[tokio::test]
async fn should_map_server_error_to_store_failure() {
    let (_fake, store) = admin_store().await;

    let result = store.create(BROKEN_PHONE, &IdentityAttrs::canonical()).await;

    assert!(
        matches!(result, Err(AuthServiceError::StoreFailure(_))),
        "expected StoreFailure, got {result:?}"
    );
}

#[tokio::test]
async fn should_map_unreachable_api_to_store_failure() {
    let store = AdminApiIdentityStore::new(
        reqwest::Client::new(),
        "http://127.0.0.1:1",
        API_KEY.to_owned(),
    );

    let result = store.list(PageRequest::default()).await;

    assert!(
        matches!(result, Err(AuthServiceError::StoreFailure(_))),
        "expected StoreFailure, got {result:?}"
    );
}

#[tokio::test]
async fn should_create_profile_stub_idempotently() {
    let (_fake, store) = admin_store().await;
    let id = IdentityId(Uuid::new_v4());

    assert_eq!(store.get_profile(id).await.unwrap(), None);
    store.create_profile_stub(id, "+15554440000").await.unwrap();
    store.create_profile_stub(id, "+15554440000").await.unwrap();

    let profile = store.get_profile(id).await.unwrap().unwrap();
    assert!(!profile.is_complete());
}

// ── Fake SMS gateway ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct FakeGateway {
    messages: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    fail: bool,
}

async fn send_message(
    State(gw): State<FakeGateway>,
    Path(sid): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    // base64("AC123:token")
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
    if auth != Some("Basic QUMxMjM6dG9rZW4=") {
        return StatusCode::UNAUTHORIZED;
    }
    if gw.fail {
        return StatusCode::BAD_REQUEST;
    }
    gw.messages.lock().unwrap().push((sid, form));
    StatusCode::CREATED
}

async fn gateway(fail: bool) -> (FakeGateway, TwilioSmsDispatcher) {
    let gw = FakeGateway {
        fail,
        ..FakeGateway::default()
    };
    let router = Router::new()
        .route("/2010-04-01/Accounts/{sid}/Messages.json", post(send_message))
        .with_state(gw.clone());
    let base = spawn(router).await;
    let dispatcher = TwilioSmsDispatcher::new(
        reqwest::Client::new(),
        &base,
        "AC123".to_owned(),
        "token".to_owned(),
        "+15550009999".to_owned(),
    );
    (gw, dispatcher)
}

#[tokio::test]
async fn should_post_sms_form_with_basic_auth() {
    let (gw, dispatcher) = gateway(false).await;
    let phone = PhoneNumber::parse("+15551234567").unwrap();

    dispatcher.send(&phone, "042137").await.unwrap();

    let messages = gw.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    let (sid, form) = &messages[0];
    assert_eq!(sid, "AC123");
    assert_eq!(form["To"], "+15551234567");
    assert_eq!(form["From"], "+15550009999");
    assert!(form["Body"].contains("042137"));
}

#[tokio::test]
async fn should_map_gateway_rejection_to_dispatch_failure() {
    let (_gw, dispatcher) = gateway(true).await;
    let phone = PhoneNumber::parse("+15551234567").unwrap();

    let result = dispatcher.send(&phone, "042137").await;

    assert!(
        matches!(result, Err(AuthServiceError::DispatchFailure(_))),
        "expected DispatchFailure, got {result:?}"
    );
}

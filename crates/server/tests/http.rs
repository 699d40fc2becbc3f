use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::Engine;
use migration::MigratorTrait;

struct World {
    app: Router,
    alice_account: Uuid,
    alice_token: String,
    bob_account: Uuid,
}

async fn world() -> World {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    let alice = engine.register_user("alice@example.com").await.unwrap();
    let alice_account = engine.open_account(alice, None).await.unwrap();
    let alice_token = engine.issue_token(alice, None).await.unwrap();
    let bob = engine.register_user("x@y.com").await.unwrap();
    let bob_account = engine.open_account(bob, None).await.unwrap();

    World {
        app: server::router(engine),
        alice_account,
        alice_token,
        bob_account,
    }
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_transfer(token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::post("/transfer").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn transfer_succeeds_and_echoes_the_amount() {
    let w = world().await;
    let body = json!({
        "sender_account_id": w.alice_account,
        "recipient_email": "x@y.com",
        "amount": 50.00,
        "currency": "USD",
    });

    let (status, body) = call(&w.app, post_transfer(Some(&w.alice_token), &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transaction successful");
    assert_eq!(body["amount"], "50.00");
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["recipient_email"], "x@y.com");
    assert!(Uuid::parse_str(body["transfer_id"].as_str().unwrap()).is_ok());

    let path = format!("/accounts/{}/balance", w.alice_account);
    let (status, body) = call(&w.app, get(&path, Some(&w.alice_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balances"], json!([{ "amount": "-50.00", "currency": "USD" }]));
}

#[tokio::test]
async fn misspelled_recipient_field_is_accepted() {
    let w = world().await;
    let body = json!({
        "sender_account_id": w.alice_account,
        "recepient_email": "x@y.com",
        "amount": "1.25",
        "currency": "eur",
    });

    let (status, body) = call(&w.app, post_transfer(Some(&w.alice_token), &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], "1.25");
    assert_eq!(body["currency"], "EUR");
}

#[tokio::test]
async fn transfer_errors_map_to_statuses() {
    let w = world().await;
    let valid = json!({
        "sender_account_id": w.alice_account,
        "recipient_email": "x@y.com",
        "amount": "5.00",
        "currency": "USD",
    });

    let (status, body) = call(&w.app, post_transfer(None, &valid)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = call(&w.app, post_transfer(Some("bogus"), &valid)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut foreign = valid.clone();
    foreign["sender_account_id"] = json!(w.bob_account);
    let (status, _) = call(&w.app, post_transfer(Some(&w.alice_token), &foreign)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut nobody = valid.clone();
    nobody["recipient_email"] = json!("nobody@y.com");
    let (status, _) = call(&w.app, post_transfer(Some(&w.alice_token), &nobody)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut to_self = valid.clone();
    to_self["recipient_email"] = json!("alice@example.com");
    let (status, _) = call(&w.app, post_transfer(Some(&w.alice_token), &to_self)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut missing = valid.clone();
    missing.as_object_mut().unwrap().remove("currency");
    let (status, body) = call(&w.app, post_transfer(Some(&w.alice_token), &missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("currency"));

    let request = Request::post("/transfer")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", w.alice_token))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = call(&w.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replayed_request_returns_the_same_transfer() {
    let w = world().await;
    let body = json!({
        "sender_account_id": w.alice_account,
        "recipient_email": "x@y.com",
        "amount": "9.99",
        "currency": "USD",
        "idempotency_key": "checkout-42",
    });

    let (_, first) = call(&w.app, post_transfer(Some(&w.alice_token), &body)).await;
    let (status, second) = call(&w.app, post_transfer(Some(&w.alice_token), &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    let path = format!("/accounts/{}/entries", w.alice_account);
    let (_, entries) = call(&w.app, get(&path, Some(&w.alice_token))).await;
    assert_eq!(entries["entries"].as_array().unwrap().len(), 1);
    assert_eq!(entries["entries"][0]["type"], "debit");
}

#[tokio::test]
async fn read_endpoints_require_a_token_and_ownership() {
    let w = world().await;

    let (status, _) = call(&w.app, get("/accounts", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&w.app, get("/accounts", Some(&w.alice_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accounts"][0]["id"], json!(w.alice_account));
    assert_eq!(body["accounts"][0]["status"], "open");

    let path = format!("/accounts/{}/entries?limit=5", w.bob_account);
    let (status, _) = call(&w.app, get(&path, Some(&w.alice_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&w.app, get("/accounts/not-a-uuid/balance", Some(&w.alice_token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_needs_no_token() {
    let w = world().await;
    let (status, body) = call(&w.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

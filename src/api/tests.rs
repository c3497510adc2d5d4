use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{App, test, web::Data};
use serde_json::{Value, json};

use crate::accounting::Accounting;
use crate::auth::accounts::Accounts;
use crate::config::Config;
use crate::model::profile::ProfileDefaults;
use crate::routes;
use crate::session::SessionRegistry;
use crate::store::{MemoryStore, Store};

fn test_config() -> Config {
    Config {
        database_url: "memory://".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        rate_login_per_min: 1_000,
        rate_register_per_min: 1_000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".into(),
        session_idle_secs: 60,
        profile_defaults: ProfileDefaults::default(),
    }
}

fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40_000))
}

macro_rules! test_app {
    () => {{
        let config = test_config();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let accounting = Data::new(Accounting::new(store.clone(), config.profile_defaults));
        let accounts = Data::new(Accounts::new(store, config.profile_defaults));
        let sessions = Data::new(SessionRegistry::new(Duration::from_secs(60)));

        test::init_service(
            App::new()
                .app_data(Data::new(config.clone()))
                .app_data(accounting)
                .app_data(accounts)
                .app_data(sessions)
                .configure(|cfg| routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

/// Sends a request and returns the status with the JSON body, if any.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.peer_addr(peer()).to_request()).await;
        let status = resp.status();
        let bytes = test::read_body(resp).await;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }};
}

/// Registers `username` and returns a bearer header value for it.
macro_rules! sign_in {
    ($app:expr, $username:expr) => {{
        let creds = json!({
            "username": $username,
            "password": "pw",
            "confirm_password": "pw",
        });
        let (status, _) = send!(
            $app,
            test::TestRequest::post().uri("/auth/register").set_json(&creds)
        );
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri("/auth/login")
                .set_json(json!({ "username": $username, "password": "pw" }))
        );
        assert_eq!(status, StatusCode::OK);
        format!("Bearer {}", body["access_token"].as_str().unwrap())
    }};
}

fn get(uri: &str, bearer: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", bearer))
}

fn post(uri: &str, bearer: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header(("Authorization", bearer))
}

fn put(uri: &str, bearer: &str) -> test::TestRequest {
    test::TestRequest::put()
        .uri(uri)
        .insert_header(("Authorization", bearer))
}

fn delete(uri: &str, bearer: &str) -> test::TestRequest {
    test::TestRequest::delete()
        .uri(uri)
        .insert_header(("Authorization", bearer))
}

fn week_of_leave() -> Value {
    json!({ "start_date": "2026-01-05", "end_date": "2026-01-09" })
}

#[actix_web::test]
async fn new_account_starts_with_the_default_profile() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");

    let (status, profile) = send!(app, get("/api/profile", &bearer));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["leave_balance"], json!(307.5));
    assert_eq!(profile["weekday_hours"]["thu"], json!(11.5));
}

#[actix_web::test]
async fn protected_routes_reject_missing_or_forged_tokens() {
    let app = test_app!();

    let (status, _) = send!(app, test::TestRequest::get().uri("/api/profile"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send!(app, get("/api/profile", "Bearer not-a-token"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn register_and_login_report_conflicts_and_bad_credentials() {
    let app = test_app!();
    sign_in!(app, "ada");

    let creds = json!({ "username": "ada", "password": "x", "confirm_password": "x" });
    let (status, _) = send!(
        app,
        test::TestRequest::post().uri("/auth/register").set_json(&creds)
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "username": "ada", "password": "wrong" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Invalid username or password"));
}

#[actix_web::test]
async fn booking_debits_the_scheduled_hours() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");

    let (status, preview) = send!(
        app,
        get("/api/leave/preview?start_date=2026-01-05&end_date=2026-01-09", &bearer)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["hours"], json!(38.0));

    let (status, added) = send!(app, post("/api/leave", &bearer).set_json(week_of_leave()));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["record"]["hours"], json!(38.0));
    assert_eq!(added["leave_balance"], json!(269.5));

    let (_, leaves) = send!(app, get("/api/leave", &bearer));
    assert_eq!(leaves.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn overlapping_leave_is_held_until_confirmed() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");
    send!(app, post("/api/leave", &bearer).set_json(week_of_leave()));

    let wednesday = json!({ "start_date": "2026-01-07", "end_date": "2026-01-07" });
    let (status, body) = send!(app, post("/api/leave", &bearer).set_json(&wednesday));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["flow"], json!("overlap"));
    assert_eq!(body["proposal"]["hours"], json!(10.5));

    let (_, pending) = send!(app, get("/api/pending", &bearer));
    assert_eq!(pending["pending"], json!(["overlap"]));

    let (status, added) = send!(app, post("/api/confirm/overlap", &bearer));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["leave_balance"], json!(259.0));

    // a confirmed proposal is spent
    let (status, _) = send!(app, post("/api/confirm/overlap", &bearer));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn insufficient_balance_is_rejected_with_the_figures() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");

    let (status, body) = send!(
        app,
        post("/api/leave", &bearer).set_json(json!({
            "start_date": "2026-01-05",
            "end_date": "2026-01-05",
            "hours": 400.0,
        }))
    );
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["requested"], json!(400.0));
    assert_eq!(body["available"], json!(307.5));
}

#[actix_web::test]
async fn deleting_leave_refunds_only_after_confirmation() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");
    let (_, added) = send!(app, post("/api/leave", &bearer).set_json(week_of_leave()));
    let leave_id = added["record"]["id"].as_u64().unwrap();

    let (status, proposal) = send!(app, delete(&format!("/api/leave/{leave_id}"), &bearer));
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(proposal["flow"], json!("delete-leave"));

    let (_, leaves) = send!(app, get("/api/leave", &bearer));
    assert_eq!(leaves.as_array().map(Vec::len), Some(1));

    let (status, deleted) = send!(app, post("/api/confirm/delete-leave", &bearer));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["leave_balance"], json!(307.5));

    let (_, leaves) = send!(app, get("/api/leave", &bearer));
    assert_eq!(leaves, json!([]));
}

#[actix_web::test]
async fn another_users_leave_cannot_be_deleted() {
    let app = test_app!();
    let ada = sign_in!(app, "ada");
    let grace = sign_in!(app, "grace");
    let (_, added) = send!(app, post("/api/leave", &ada).set_json(week_of_leave()));
    let leave_id = added["record"]["id"].as_u64().unwrap();

    let (status, _) = send!(app, delete(&format!("/api/leave/{leave_id}"), &grace));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(app, delete("/api/leave/999", &grace));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn cancelled_balance_override_changes_nothing() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");

    let (status, proposal) = send!(
        app,
        put("/api/profile/balance", &bearer).set_json(json!({ "leave_balance": 10.0 }))
    );
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(proposal["current"], json!(307.5));

    let (status, _) = send!(app, post("/api/cancel/balance-update", &bearer));
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send!(app, post("/api/confirm/balance-update", &bearer));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, profile) = send!(app, get("/api/profile", &bearer));
    assert_eq!(profile["leave_balance"], json!(307.5));
}

#[actix_web::test]
async fn weekday_hours_are_edited_one_day_at_a_time() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");

    let (status, profile) = send!(
        app,
        put("/api/profile/weekday-hours/tue", &bearer).set_json(json!({ "hours": 4.0 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["weekday_hours"]["tue"], json!(4.0));

    let (status, _) = send!(
        app,
        put("/api/profile/weekday-hours/tue", &bearer).set_json(json!({ "hours": -1.0 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn confirmed_account_deletion_frees_the_username() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");
    send!(app, post("/api/leave", &bearer).set_json(week_of_leave()));

    let (status, _) = send!(app, delete("/api/account", &bearer));
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = send!(app, post("/api/confirm/delete-account", &bearer));
    assert_eq!(status, StatusCode::NO_CONTENT);

    let bearer = sign_in!(app, "ada");
    let (_, leaves) = send!(app, get("/api/leave", &bearer));
    assert_eq!(leaves, json!([]));
}

#[actix_web::test]
async fn token_of_a_deleted_account_cannot_recreate_it() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");
    send!(app, delete("/api/account", &bearer));
    let (status, _) = send!(app, post("/api/confirm/delete-account", &bearer));
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send!(app, get("/api/profile", &bearer));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("user not found"));

    let (status, _) = send!(app, post("/api/leave", &bearer).set_json(week_of_leave()));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, leaves) = send!(app, get("/api/leave", &bearer));
    assert_eq!(leaves, json!([]));
}

#[actix_web::test]
async fn delete_all_refunds_every_record_once_confirmed() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");
    send!(app, post("/api/leave", &bearer).set_json(week_of_leave()));
    send!(
        app,
        post("/api/leave", &bearer)
            .set_json(json!({ "start_date": "2026-01-14", "end_date": "2026-01-15" }))
    );

    let (status, proposal) = send!(app, delete("/api/leave", &bearer));
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(proposal["flow"], json!("delete-all"));
    assert_eq!(proposal["records"], json!(2));
    // 38.0 for the week, Wed 10.5 + Thu 11.5
    assert_eq!(proposal["refund_hours"], json!(60.0));

    let (status, outcome) = send!(app, post("/api/confirm/delete-all", &bearer));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["removed"], json!(2));
    assert_eq!(outcome["refunded_hours"], json!(60.0));
    assert_eq!(outcome["leave_balance"], json!(307.5));

    let (_, leaves) = send!(app, get("/api/leave", &bearer));
    assert_eq!(leaves, json!([]));
}

#[actix_web::test]
async fn confirming_a_flow_with_nothing_held_is_a_bad_request() {
    let app = test_app!();
    let bearer = sign_in!(app, "ada");

    for flow in ["overlap", "balance-update", "delete-leave", "delete-all", "delete-account"] {
        let (status, body) = send!(app, post(&format!("/api/confirm/{flow}"), &bearer));
        assert_eq!(status, StatusCode::BAD_REQUEST, "{flow}");
        assert_eq!(body["message"], json!(format!("Nothing to confirm for {flow}")));
    }

    let (_, profile) = send!(app, get("/api/profile", &bearer));
    assert_eq!(profile["leave_balance"], json!(307.5));
}

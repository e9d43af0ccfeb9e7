mod common;

use axum::http::StatusCode;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use common::{TestApp, PASSWORD};
use fleet_backend::entities::{company, driver_profile, user::UserRole};

fn registration(email: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password1": "pa55word!",
        "password2": "pa55word!",
        "first_name": "Kofi",
        "last_name": "Boateng",
        "phone_number": "024 123-4567 8",
        "role": "COMPANY_OWNER",
    })
}

#[tokio::test]
async fn register_provisions_role_records() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/auth/register", None, registration("Kofi@Example.com"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "kofi@example.com");
    assert_eq!(body["user"]["phone_number"], "02412345678");
    assert_eq!(body["user"]["role"], "COMPANY_OWNER");
    assert_eq!(body["user"]["full_name"], "Kofi Boateng");
    assert!(body["user"].get("password_hash").is_none());

    let user_id: uuid::Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();
    let profiles = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(user_id))
        .count(&app.state.db)
        .await
        .unwrap();
    assert_eq!(profiles, 1);

    let owned = company::Entity::find()
        .filter(company::Column::OwnerId.eq(user_id))
        .one(&app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owned.name.as_deref(), Some("Kofi Boateng's Company"));
    assert_eq!(owned.email.as_deref(), Some("kofi@example.com"));
    assert_eq!(owned.phone_number.as_deref(), Some("02412345678"));
}

#[tokio::test]
async fn register_reports_every_field_problem() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "email": "not-an-email",
                "password1": "one",
                "password2": "two",
                "first_name": "",
                "last_name": "Mensah",
                "phone_number": "12345",
                "role": "PILOT",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = &body["fields"];
    assert_eq!(fields["password2"][0], "Passwords do not match");
    for name in ["email", "first_name", "phone_number", "role"] {
        assert!(fields.get(name).is_some(), "{name} not reported");
    }
    assert!(fields.get("last_name").is_none());
}

#[tokio::test]
async fn register_rejects_duplicate_email_and_phone() {
    let app = TestApp::new().await;
    app.user_with_phone("ama@example.com", Some("02412345678"), UserRole::IndividualDriver)
        .await;

    let mut payload = registration("AMA@example.com");
    payload["phone_number"] = json!("0241-234-5678");
    let (status, body) = app.post("/api/auth/register", None, payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["email"][0], "Email already exists");
    assert_eq!(body["fields"]["phone_number"][0], "Phone number already exists");
}

#[tokio::test]
async fn login_by_email_or_phone() {
    let app = TestApp::new().await;
    app.user_with_phone("yaw@example.com", Some("05512345678"), UserRole::CompanyDriver)
        .await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "identifier": "YAW@Example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "COMPANY_DRIVER");

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "identifier": "055-1234 5678", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_with_bad_credentials_is_unauthorized() {
    let app = TestApp::new().await;
    app.user("esi@example.com", UserRole::IndividualDriver).await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "identifier": "esi@example.com", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials.");

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "identifier": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = TestApp::new().await;
    let (user, token) = app.user("abena@example.com", UserRole::Admin).await;

    let (status, _) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/auth/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["is_driver"], false);
}

#[tokio::test]
async fn admins_cannot_self_register() {
    let app = TestApp::new().await;
    let mut payload = registration("kwame@example.com");
    payload["role"] = json!("ADMIN");

    let (status, body) = app.post("/api/auth/register", None, payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"].get("role").is_some());
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/auth/login", None, json!({ "password": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some_and(|m| m.contains("identifier")));
}

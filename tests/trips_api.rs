mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;
use fleet_backend::entities::user::{self, UserRole};

fn new_trip() -> Value {
    json!({
        "recipient_name": "Ama Mensah",
        "recipient_phone": "024 123 45678",
        "vehicle_type": "VAN",
        "pickup_address": "Tema Depot",
        "delivery_address": "Makola Market",
        "pickup_latitude": 5.669,
        "pickup_longitude": -0.017,
        "delivery_latitude": 5.549,
        "delivery_longitude": -0.207,
        "pickup_time": "2026-11-01T09:30:00Z",
    })
}

struct Fleet {
    app: TestApp,
    owner_token: String,
    driver: user::Model,
    driver_token: String,
}

/// An owner with one active company driver.
async fn fleet() -> Fleet {
    let app = TestApp::new().await;
    let (_, owner_token) = app.user("owner@example.com", UserRole::CompanyOwner).await;
    let (driver, driver_token) = app.user("driver@example.com", UserRole::CompanyDriver).await;

    let (_, company) = app.get("/api/company", Some(&owner_token)).await;
    let (status, _) = app
        .post(
            "/api/companies/join",
            Some(&driver_token),
            json!({ "invite_code": company["invite_code"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    Fleet {
        app,
        owner_token,
        driver,
        driver_token,
    }
}

async fn create_trip(f: &Fleet) -> String {
    let (status, body) = f
        .app
        .post("/api/trips", Some(&f.owner_token), new_trip())
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["recipient_phone"], "02412345678");
    assert!(body["driver"].is_null());
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn full_delivery_lifecycle() {
    let f = fleet().await;
    let id = create_trip(&f).await;

    let (status, body) = f
        .app
        .post(
            &format!("/api/trips/{id}/assign"),
            Some(&f.owner_token),
            json!({ "driver": f.driver.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "ASSIGNED");
    assert_eq!(body["driver"], f.driver.id.to_string());
    assert!(body["assigned_at"].is_string());
    let otp = body["otp_code"].as_str().unwrap().to_string();
    assert_eq!(otp.len(), 6);

    // The driver sees the trip but not the code
    let (status, body) = f
        .app
        .get(&format!("/api/trips/{id}"), Some(&f.driver_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("otp_code").is_none());

    let (status, body) = f
        .app
        .post(&format!("/api/trips/{id}/start"), Some(&f.driver_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");

    let (status, body) = f
        .app
        .post(
            &format!("/api/trips/{id}/confirm"),
            Some(&f.driver_token),
            json!({ "otp": "000000x" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP");

    let (status, body) = f
        .app
        .post(
            &format!("/api/trips/{id}/confirm"),
            Some(&f.driver_token),
            json!({ "otp": otp }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert!(body["completed_at"].is_string());

    let (_, body) = f.app.get(&format!("/api/trips/{id}"), Some(&f.owner_token)).await;
    assert!(body.get("otp_code").is_none());

    let (status, body) = f
        .app
        .post(
            &format!("/api/trips/{id}/confirm"),
            Some(&f.driver_token),
            json!({ "otp": otp }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OTP not sent");
}

#[tokio::test]
async fn transitions_out_of_order_are_rejected() {
    let f = fleet().await;
    let id = create_trip(&f).await;

    let (status, body) = f
        .app
        .post(&format!("/api/trips/{id}/cancel"), Some(&f.owner_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let (status, body) = f
        .app
        .post(&format!("/api/trips/{id}/cancel"), Some(&f.owner_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Trip not pending");

    let (status, body) = f
        .app
        .post(
            &format!("/api/trips/{id}/assign"),
            Some(&f.owner_token),
            json!({ "driver": f.driver.id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Trip not pending");

    let second = create_trip(&f).await;
    f.app
        .post(
            &format!("/api/trips/{second}/assign"),
            Some(&f.owner_token),
            json!({ "driver": f.driver.id }),
        )
        .await;
    let (status, _) = f
        .app
        .post(&format!("/api/trips/{second}/start"), Some(&f.driver_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = f
        .app
        .post(&format!("/api/trips/{second}/start"), Some(&f.driver_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Trip not assigned");
}

#[tokio::test]
async fn assignment_requires_an_active_member() {
    let f = fleet().await;
    let id = create_trip(&f).await;
    let (outsider, _) = f
        .app
        .user("outsider@example.com", UserRole::CompanyDriver)
        .await;
    let (solo, _) = f.app.user("solo@example.com", UserRole::IndividualDriver).await;

    for driver in [outsider.id, solo.id] {
        let (status, body) = f
            .app
            .post(
                &format!("/api/trips/{id}/assign"),
                Some(&f.owner_token),
                json!({ "driver": driver }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"].get("driver").is_some());
    }

    f.app
        .patch(
            &format!("/api/company/drivers/{}", f.driver.id),
            Some(&f.owner_token),
            json!({ "is_active": false }),
        )
        .await;
    let (status, _) = f
        .app
        .post(
            &format!("/api/trips/{id}/assign"),
            Some(&f.owner_token),
            json!({ "driver": f.driver.id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trips_are_scoped_to_creator_and_driver() {
    let f = fleet().await;
    let id = create_trip(&f).await;
    let (_, stranger_token) = f
        .app
        .user("stranger@example.com", UserRole::CompanyOwner)
        .await;

    // Not yet assigned: the driver cannot see it
    let (status, _) = f
        .app
        .get(&format!("/api/trips/{id}"), Some(&f.driver_token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = f
        .app
        .get(&format!("/api/trips/{id}"), Some(&stranger_token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = f.app.get("/api/trips", Some(&stranger_token)).await;
    assert!(list.as_array().unwrap().is_empty());

    f.app
        .post(
            &format!("/api/trips/{id}/assign"),
            Some(&f.owner_token),
            json!({ "driver": f.driver.id }),
        )
        .await;
    let (_, list) = f.app.get("/api/trips", Some(&f.driver_token)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // The driver may not cancel, the owner may not start
    let (status, _) = f
        .app
        .post(&format!("/api/trips/{id}/cancel"), Some(&f.driver_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = f
        .app
        .post(&format!("/api/trips/{id}/start"), Some(&f.owner_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_company_owners_create_trips() {
    let f = fleet().await;

    let (status, _) = f
        .app
        .post("/api/trips", Some(&f.driver_token), new_trip())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut bad = new_trip();
    bad["pickup_latitude"] = json!(120.0);
    let (status, body) = f.app.post("/api/trips", Some(&f.owner_token), bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"].get("pickup_latitude").is_some());

    let (status, _) = f.app.post("/api/trips", None, new_trip()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rating_is_optional_and_bounded() {
    let f = fleet().await;

    let mut rated = new_trip();
    rated["rating"] = json!(4);
    let (status, body) = f.app.post("/api/trips", Some(&f.owner_token), rated).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["rating"], 4);

    let (_, body) = f.app.post("/api/trips", Some(&f.owner_token), new_trip()).await;
    assert!(body["rating"].is_null());

    let mut bad = new_trip();
    bad["rating"] = json!(6);
    let (status, body) = f.app.post("/api/trips", Some(&f.owner_token), bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"].get("rating").is_some());
}

#[tokio::test]
async fn confirm_without_code_is_invalid() {
    let f = fleet().await;
    let id = create_trip(&f).await;
    f.app
        .post(
            &format!("/api/trips/{id}/assign"),
            Some(&f.owner_token),
            json!({ "driver": f.driver.id }),
        )
        .await;

    let (status, body) = f
        .app
        .post(&format!("/api/trips/{id}/confirm"), Some(&f.driver_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP");
}

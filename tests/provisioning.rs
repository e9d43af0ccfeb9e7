mod common;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use common::TestApp;
use fleet_backend::entities::user::{self, UserRole};
use fleet_backend::entities::{company, company_driver, driver_profile, profile, trip, vehicle};
use fleet_backend::error::AppError;
use fleet_backend::services::{companies, provisioning, users};

async fn counts(db: &DatabaseConnection, user_id: Uuid) -> (u64, u64, u64) {
    let profiles = profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .count(db)
        .await
        .unwrap();
    let driver_profiles = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(user_id))
        .count(db)
        .await
        .unwrap();
    let companies = company::Entity::find()
        .filter(company::Column::OwnerId.eq(user_id))
        .count(db)
        .await
        .unwrap();
    (profiles, driver_profiles, companies)
}

#[tokio::test]
async fn each_role_gets_its_records() {
    let app = TestApp::new().await;
    let db = &app.state.db;

    let (admin, _) = app.user("admin@example.com", UserRole::Admin).await;
    let (owner, _) = app.user("owner@example.com", UserRole::CompanyOwner).await;
    let (solo, _) = app.user("solo@example.com", UserRole::IndividualDriver).await;
    let (member, _) = app.user("member@example.com", UserRole::CompanyDriver).await;

    assert_eq!(counts(db, admin.id).await, (1, 0, 0));
    assert_eq!(counts(db, owner.id).await, (0, 1, 1));
    assert_eq!(counts(db, solo.id).await, (0, 1, 0));
    assert_eq!(counts(db, member.id).await, (0, 1, 0));
}

#[tokio::test]
async fn provisioning_twice_creates_nothing() {
    let app = TestApp::new().await;
    let db = &app.state.db;
    let (owner, _) = app.user("owner@example.com", UserRole::CompanyOwner).await;

    let before = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(owner.id))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut active: driver_profile::ActiveModel = before.clone().into();
    active.license_number = Set("GH-123".to_string());
    active.update(db).await.unwrap();

    let created = provisioning::provision(db, &owner).await.unwrap();
    assert!(created.is_empty());
    assert_eq!(counts(db, owner.id).await, (0, 1, 1));

    let after = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(owner.id))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.license_number, "GH-123");
}

#[tokio::test]
async fn role_changes_only_add_records() {
    let app = TestApp::new().await;
    let db = &app.state.db;

    let (owner, _) = app.user("owner@example.com", UserRole::CompanyOwner).await;
    let (updated, created) = users::change_role(db, owner, UserRole::IndividualDriver)
        .await
        .unwrap();
    assert!(created.is_empty());
    assert_eq!(updated.role, UserRole::IndividualDriver);
    assert_eq!(counts(db, updated.id).await, (0, 1, 1));

    let (admin, _) = app.user("admin@example.com", UserRole::Admin).await;
    let (promoted, created) = users::change_role(db, admin, UserRole::CompanyOwner)
        .await
        .unwrap();
    assert!(created.driver_profile);
    assert!(created.company);
    assert!(!created.profile);
    assert_eq!(counts(db, promoted.id).await, (1, 1, 1));
}

#[tokio::test]
async fn email_and_phone_are_unique() {
    let app = TestApp::new().await;
    app.user_with_phone("a@example.com", Some("02000000001"), UserRole::IndividualDriver)
        .await;

    let duplicate = users::create_user(
        &app.state.db,
        users::NewUser {
            email: "A@EXAMPLE.COM".to_string(),
            password: "pw".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            phone_number: None,
            role: UserRole::IndividualDriver,
        },
    )
    .await;
    let err = duplicate.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);

    let duplicate_phone = users::create_user(
        &app.state.db,
        users::NewUser {
            email: "other@example.com".to_string(),
            password: "pw".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            phone_number: Some("020-0000-0001".to_string()),
            role: UserRole::IndividualDriver,
        },
    )
    .await;
    assert_eq!(
        duplicate_phone.unwrap_err().status(),
        axum::http::StatusCode::CONFLICT
    );

    // Failed inserts roll back their provisioning too
    assert_eq!(user::Entity::find().count(&app.state.db).await.unwrap(), 1);
    assert_eq!(
        driver_profile::Entity::find().count(&app.state.db).await.unwrap(),
        1
    );
}

async fn join(db: &DatabaseConnection, driver: Uuid, company: Uuid) -> Result<company_driver::Model, sea_orm::DbErr> {
    let now = Utc::now();
    company_driver::ActiveModel {
        id: Set(Uuid::new_v4()),
        driver_id: Set(driver),
        company_id: Set(company),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
}

#[tokio::test]
async fn membership_pair_is_unique() {
    let app = TestApp::new().await;
    let db = &app.state.db;
    let (owner, _) = app.user("owner@example.com", UserRole::CompanyOwner).await;
    let (member, _) = app.user("member@example.com", UserRole::CompanyDriver).await;
    let owned = fleet_backend::services::companies::find_owned(db, owner.id)
        .await
        .unwrap()
        .unwrap();

    join(db, member.id, owned.id).await.unwrap();
    let second = join(db, member.id, owned.id).await;
    assert!(second.is_err());
}

#[tokio::test]
async fn deleting_a_user_cascades() {
    let app = TestApp::new().await;
    let db = &app.state.db;
    let (owner, _) = app.user("owner@example.com", UserRole::CompanyOwner).await;
    let (member, _) = app.user("member@example.com", UserRole::CompanyDriver).await;
    let owned = fleet_backend::services::companies::find_owned(db, owner.id)
        .await
        .unwrap()
        .unwrap();
    join(db, member.id, owned.id).await.unwrap();

    vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        driver_id: Set(owner.id),
        brand: Set("Toyota".to_string()),
        model: Set("Hiace".to_string()),
        year: Set(2019),
        license_number: Set("L-1".to_string()),
        registration_number: Set("GR-1".to_string()),
        expiry_date: Set(chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()),
        colour: Set("White".to_string()),
        road_worthiness_certificate: Set("road_worthiness/a.pdf".to_string()),
        vehicle_insurance: Set("vehicle_insurances/b.pdf".to_string()),
        inspection_report: Set("inspection_reports/c.pdf".to_string()),
    }
    .insert(db)
    .await
    .unwrap();

    let now = Utc::now();
    trip::ActiveModel {
        id: Set(Uuid::new_v4()),
        recipient_name: Set("Ama".to_string()),
        recipient_phone: Set("02412345678".to_string()),
        driver_id: Set(None),
        company_id: Set(owner.id),
        vehicle_type: Set(trip::VehicleType::Van),
        pickup_address: Set("Depot".to_string()),
        delivery_address: Set("Market".to_string()),
        pickup_latitude: Set(5.6),
        pickup_longitude: Set(-0.18),
        delivery_latitude: Set(5.55),
        delivery_longitude: Set(-0.2),
        pickup_time: Set(now.into()),
        assigned_at: Set(None),
        started_at: Set(None),
        completed_at: Set(None),
        cancelled_at: Set(None),
        otp_code: Set(None),
        status: Set(trip::TripStatus::Pending),
        rating: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .unwrap();

    user::Entity::delete_by_id(owner.id).exec(db).await.unwrap();

    assert_eq!(counts(db, owner.id).await, (0, 0, 0));
    assert_eq!(company_driver::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(vehicle::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(trip::Entity::find().count(db).await.unwrap(), 0);
    // The member keeps their own account and profile
    assert_eq!(counts(db, member.id).await, (0, 1, 0));
}

#[tokio::test]
async fn deleting_a_company_removes_memberships() {
    let app = TestApp::new().await;
    let db = &app.state.db;
    let (owner, _) = app.user("owner@example.com", UserRole::CompanyOwner).await;
    let (member, _) = app.user("member@example.com", UserRole::CompanyDriver).await;
    let owned = fleet_backend::services::companies::find_owned(db, owner.id)
        .await
        .unwrap()
        .unwrap();
    join(db, member.id, owned.id).await.unwrap();

    company::Entity::delete_by_id(owned.id).exec(db).await.unwrap();

    assert_eq!(company_driver::Entity::find().count(db).await.unwrap(), 0);
    assert!(user::Entity::find_by_id(member.id).one(db).await.unwrap().is_some());
}

#[tokio::test]
async fn invite_code_draws_past_taken_codes() {
    let app = TestApp::new().await;
    let db = &app.state.db;
    let (owner, _) = app.user("owner@example.com", UserRole::CompanyOwner).await;
    let taken = companies::find_owned(db, owner.id)
        .await
        .unwrap()
        .unwrap()
        .invite_code;

    let mut draws = vec![taken.clone(), taken.clone(), "FRESHCODE234".to_string()].into_iter();
    let code = companies::unique_invite_code_from(db, || draws.next().unwrap())
        .await
        .unwrap();
    assert_eq!(code, "FRESHCODE234");

    let err = companies::unique_invite_code_from(db, || taken.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
}

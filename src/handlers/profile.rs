use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{driver_profile, profile};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::extract::AppJson;
use crate::handlers::double_option;
use crate::handlers::uploads::read_form;
use crate::middleware::auth::CurrentUser;
use crate::utils::dates;
use crate::utils::validation::validate_max_len;
use crate::AppState;

const PROFILE_IMAGE_DIR: &str = "profile/images";

// ============ Shared profile fields ============

#[derive(Debug, Default, Deserialize)]
pub struct CommonProfileUpdate {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_of_birth: Option<Option<NaiveDate>>,
}

/// Plain profile fields, detached from the table they live in.
struct CommonFields<'a> {
    address: &'a mut String,
    city: &'a mut String,
    state: &'a mut String,
    zip_code: &'a mut String,
    country: &'a mut String,
    date_of_birth: &'a mut Option<NaiveDate>,
}

impl CommonProfileUpdate {
    fn apply(self, target: CommonFields<'_>, errors: &mut FieldErrors) {
        let text_fields = [
            ("address", self.address, target.address, usize::MAX),
            ("city", self.city, target.city, 128),
            ("state", self.state, target.state, 128),
            ("zip_code", self.zip_code, target.zip_code, 10),
            ("country", self.country, target.country, 128),
        ];
        for (name, value, slot, max) in text_fields {
            if let Some(value) = value {
                if let Err(msg) = validate_max_len(&value, max) {
                    errors.add(name, msg);
                }
                *slot = value;
            }
        }
        if let Some(dob) = self.date_of_birth {
            *target.date_of_birth = dob;
        }
    }
}

async fn store_image(state: &AppState, multipart: Multipart) -> AppResult<String> {
    let mut form = read_form(multipart).await?;
    let upload = form
        .take_file("image")
        .ok_or_else(|| AppError::field("image", "No file was submitted."))?;
    state
        .media
        .save(PROFILE_IMAGE_DIR, &upload.file_name, &upload.bytes)
        .await
}

// ============ Admin profile ============

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub image: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileResponse {
    fn new(state: &AppState, p: profile::Model) -> Self {
        Self {
            age: p.age(),
            image: p.image.as_deref().map(|path| state.media.url(path)),
            id: p.id,
            user: p.user_id,
            address: p.address,
            city: p.city,
            state: p.state,
            zip_code: p.zip_code,
            country: p.country,
            date_of_birth: p.date_of_birth,
            created_at: p.created_at.with_timezone(&Utc),
            updated_at: p.updated_at.with_timezone(&Utc),
        }
    }
}

async fn load_profile(state: &AppState, user_id: Uuid) -> AppResult<profile::Model> {
    profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// Get own admin profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<ProfileResponse>> {
    let p = load_profile(&state, user.id).await?;
    Ok(Json(ProfileResponse::new(&state, p)))
}

/// Update own admin profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<CommonProfileUpdate>,
) -> AppResult<Json<ProfileResponse>> {
    let mut p = load_profile(&state, user.id).await?;

    let mut errors = FieldErrors::new();
    payload.apply(
        CommonFields {
            address: &mut p.address,
            city: &mut p.city,
            state: &mut p.state,
            zip_code: &mut p.zip_code,
            country: &mut p.country,
            date_of_birth: &mut p.date_of_birth,
        },
        &mut errors,
    );
    errors.into_result()?;

    p.updated_at = Utc::now().into();
    let active: profile::ActiveModel = p.into();
    let updated = active.reset_all().update(&state.db).await?;

    Ok(Json(ProfileResponse::new(&state, updated)))
}

/// Replace own admin profile image (multipart field `image`)
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<Json<ProfileResponse>> {
    let p = load_profile(&state, user.id).await?;
    let path = store_image(&state, multipart).await?;
    let previous = p.image.clone();

    let mut active: profile::ActiveModel = p.into();
    active.image = Set(Some(path.clone()));
    active.updated_at = Set(Utc::now().into());
    let updated = state.media.commit(&path, active.update(&state.db)).await?;

    if let Some(previous) = previous {
        state.media.remove(&previous).await;
    }
    Ok(Json(ProfileResponse::new(&state, updated)))
}

// ============ Driver profile ============

#[derive(Debug, Serialize)]
pub struct DriverProfileResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub image: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<i32>,
    pub license_number: String,
    pub license_class: String,
    pub license_expiry: Option<NaiveDate>,
    pub is_license_expired: Option<bool>,
    pub license_expiry_days: Option<i64>,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DriverProfileResponse {
    pub fn new(state: &AppState, p: driver_profile::Model) -> Self {
        let today = dates::today();
        Self {
            age: p.age_on(today),
            is_license_expired: p.is_license_expired_on(today),
            license_expiry_days: p.license_expiry_days_on(today),
            image: p.image.as_deref().map(|path| state.media.url(path)),
            id: p.id,
            user: p.user_id,
            address: p.address,
            city: p.city,
            state: p.state,
            zip_code: p.zip_code,
            country: p.country,
            date_of_birth: p.date_of_birth,
            license_number: p.license_number,
            license_class: p.license_class,
            license_expiry: p.license_expiry,
            emergency_contact_name: p.emergency_contact_name,
            emergency_contact_phone: p.emergency_contact_phone,
            verified: p.verified,
            verified_at: p.verified_at.map(|t| t.with_timezone(&Utc)),
            is_online: p.is_online,
            created_at: p.created_at.with_timezone(&Utc),
            updated_at: p.updated_at.with_timezone(&Utc),
        }
    }
}

/// Verification state is not client writable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDriverProfileRequest {
    #[serde(flatten)]
    pub common: CommonProfileUpdate,
    pub license_number: Option<String>,
    pub license_class: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub license_expiry: Option<Option<NaiveDate>>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

pub async fn load_driver_profile(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<driver_profile::Model> {
    driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver profile not found".to_string()))
}

/// Get own driver profile
pub async fn get_driver_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<DriverProfileResponse>> {
    let p = load_driver_profile(&state, user.id).await?;
    Ok(Json(DriverProfileResponse::new(&state, p)))
}

/// Update own driver profile; the result must pass license validation
pub async fn update_driver_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<UpdateDriverProfileRequest>,
) -> AppResult<Json<DriverProfileResponse>> {
    let mut p = load_driver_profile(&state, user.id).await?;

    let mut errors = FieldErrors::new();
    payload.common.apply(
        CommonFields {
            address: &mut p.address,
            city: &mut p.city,
            state: &mut p.state,
            zip_code: &mut p.zip_code,
            country: &mut p.country,
            date_of_birth: &mut p.date_of_birth,
        },
        &mut errors,
    );

    let text_fields = [
        ("license_number", payload.license_number, &mut p.license_number, 64),
        ("license_class", payload.license_class, &mut p.license_class, 32),
        (
            "emergency_contact_name",
            payload.emergency_contact_name,
            &mut p.emergency_contact_name,
            128,
        ),
        (
            "emergency_contact_phone",
            payload.emergency_contact_phone,
            &mut p.emergency_contact_phone,
            20,
        ),
    ];
    for (name, value, slot, max) in text_fields {
        if let Some(value) = value {
            if let Err(msg) = validate_max_len(&value, max) {
                errors.add(name, msg);
            }
            *slot = value;
        }
    }
    if let Some(expiry) = payload.license_expiry {
        p.license_expiry = expiry;
    }

    errors.into_result()?;
    p.validate_on(dates::today()).into_result()?;

    p.updated_at = Utc::now().into();
    let active: driver_profile::ActiveModel = p.into();
    let updated = active.reset_all().update(&state.db).await?;

    tracing::debug!(user_id = %user.id, "Driver profile updated");
    Ok(Json(DriverProfileResponse::new(&state, updated)))
}

/// Replace own driver profile image (multipart field `image`)
pub async fn upload_driver_profile_image(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<Json<DriverProfileResponse>> {
    let p = load_driver_profile(&state, user.id).await?;
    let path = store_image(&state, multipart).await?;
    let previous = p.image.clone();

    let mut active: driver_profile::ActiveModel = p.into();
    active.image = Set(Some(path.clone()));
    active.updated_at = Set(Utc::now().into());
    let updated = state.media.commit(&path, active.update(&state.db)).await?;

    if let Some(previous) = previous {
        state.media.remove(&previous).await;
    }
    Ok(Json(DriverProfileResponse::new(&state, updated)))
}

// ============ Online status ============

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineStatus {
    pub is_online: bool,
}

/// Company driver availability
pub async fn get_online_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<OnlineStatus>> {
    let p = load_driver_profile(&state, user.id).await?;
    Ok(Json(OnlineStatus {
        is_online: p.is_online,
    }))
}

pub async fn update_online_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<OnlineStatus>,
) -> AppResult<Json<OnlineStatus>> {
    let p = load_driver_profile(&state, user.id).await?;

    let mut active: driver_profile::ActiveModel = p.into();
    active.is_online = Set(payload.is_online);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id = %user.id, is_online = updated.is_online, "Driver online status changed");
    Ok(Json(OnlineStatus {
        is_online: updated.is_online,
    }))
}

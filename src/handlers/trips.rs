use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::trip::{self, TripStatus, VehicleType};
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::extract::{AppJson, AppPath};
use crate::middleware::auth::CurrentUser;
use crate::services::companies;
use crate::utils::codes;
use crate::utils::validation::{normalize_phone, validate_phone, validate_required};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub driver: Option<Uuid>,
    pub company: Uuid,
    pub vehicle_type: VehicleType,
    pub pickup_address: String,
    pub delivery_address: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub delivery_latitude: f64,
    pub delivery_longitude: f64,
    pub pickup_time: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_code: Option<String>,
    pub status: TripStatus,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripResponse {
    /// The OTP is the recipient's secret; only the creator sees it.
    fn for_viewer(t: trip::Model, viewer: Uuid) -> Self {
        let utc = |t: sea_orm::prelude::DateTimeWithTimeZone| t.with_timezone(&Utc);
        Self {
            otp_code: t.otp_code.filter(|_| t.company_id == viewer),
            id: t.id,
            recipient_name: t.recipient_name,
            recipient_phone: t.recipient_phone,
            driver: t.driver_id,
            company: t.company_id,
            vehicle_type: t.vehicle_type,
            pickup_address: t.pickup_address,
            delivery_address: t.delivery_address,
            pickup_latitude: t.pickup_latitude,
            pickup_longitude: t.pickup_longitude,
            delivery_latitude: t.delivery_latitude,
            delivery_longitude: t.delivery_longitude,
            pickup_time: utc(t.pickup_time),
            assigned_at: t.assigned_at.map(utc),
            started_at: t.started_at.map(utc),
            completed_at: t.completed_at.map(utc),
            cancelled_at: t.cancelled_at.map(utc),
            status: t.status,
            rating: t.rating,
            created_at: utc(t.created_at),
            updated_at: utc(t.updated_at),
        }
    }
}

/// Trips created by or assigned to `user_id`.
fn visible_to(user_id: Uuid) -> Condition {
    Condition::any()
        .add(trip::Column::CompanyId.eq(user_id))
        .add(trip::Column::DriverId.eq(user_id))
}

async fn visible_trip(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<trip::Model> {
    trip::Entity::find_by_id(id)
        .filter(visible_to(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))
}

fn ensure_creator(t: &trip::Model, user_id: Uuid) -> AppResult<()> {
    if t.company_id != user_id {
        return Err(AppError::Forbidden(
            "Only the trip creator can do this".to_string(),
        ));
    }
    Ok(())
}

fn ensure_assigned_driver(t: &trip::Model, user_id: Uuid) -> AppResult<()> {
    if t.driver_id != Some(user_id) {
        return Err(AppError::Forbidden(
            "Only the assigned driver can do this".to_string(),
        ));
    }
    Ok(())
}

// ============ Creation and listing ============

#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub recipient_name: String,
    pub recipient_phone: String,
    pub vehicle_type: VehicleType,
    pub pickup_address: String,
    pub delivery_address: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub delivery_latitude: f64,
    pub delivery_longitude: f64,
    pub pickup_time: DateTime<Utc>,
    #[serde(default)]
    pub rating: Option<i32>,
}

impl CreateTripRequest {
    fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();

        let text_fields = [
            ("recipient_name", &self.recipient_name),
            ("pickup_address", &self.pickup_address),
            ("delivery_address", &self.delivery_address),
        ];
        for (name, value) in text_fields {
            if let Err(msg) = validate_required(value.trim(), 255) {
                errors.add(name, msg);
            }
        }
        if let Err(msg) = validate_phone(&normalize_phone(&self.recipient_phone)) {
            errors.add("recipient_phone", msg);
        }

        let latitudes = [
            ("pickup_latitude", self.pickup_latitude),
            ("delivery_latitude", self.delivery_latitude),
        ];
        for (name, value) in latitudes {
            if !(-90.0..=90.0).contains(&value) {
                errors.add(name, "Latitude must be between -90 and 90.");
            }
        }
        let longitudes = [
            ("pickup_longitude", self.pickup_longitude),
            ("delivery_longitude", self.delivery_longitude),
        ];
        for (name, value) in longitudes {
            if !(-180.0..=180.0).contains(&value) {
                errors.add(name, "Longitude must be between -180 and 180.");
            }
        }

        if let Some(rating) = self.rating {
            if !(trip::MIN_RATING..=trip::MAX_RATING).contains(&rating) {
                errors.add("rating", "Rating must be between 1 and 5.");
            }
        }

        errors.into_result()
    }
}

/// Create a trip (company owner); it starts out pending and unassigned
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<CreateTripRequest>,
) -> AppResult<(StatusCode, Json<TripResponse>)> {
    if user.role != UserRole::CompanyOwner {
        return Err(AppError::Forbidden(format!(
            "{} access required",
            UserRole::CompanyOwner.label()
        )));
    }
    payload.validate()?;

    let now = Utc::now();
    let created = trip::ActiveModel {
        id: Set(Uuid::new_v4()),
        recipient_name: Set(payload.recipient_name.trim().to_string()),
        recipient_phone: Set(normalize_phone(&payload.recipient_phone)),
        driver_id: Set(None),
        company_id: Set(user.id),
        vehicle_type: Set(payload.vehicle_type),
        pickup_address: Set(payload.pickup_address.trim().to_string()),
        delivery_address: Set(payload.delivery_address.trim().to_string()),
        pickup_latitude: Set(payload.pickup_latitude),
        pickup_longitude: Set(payload.pickup_longitude),
        delivery_latitude: Set(payload.delivery_latitude),
        delivery_longitude: Set(payload.delivery_longitude),
        pickup_time: Set(payload.pickup_time.into()),
        assigned_at: Set(None),
        started_at: Set(None),
        completed_at: Set(None),
        cancelled_at: Set(None),
        otp_code: Set(None),
        status: Set(TripStatus::Pending),
        rating: Set(payload.rating),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(trip_id = %created.id, company_id = %user.id, "Trip created");
    Ok((
        StatusCode::CREATED,
        Json(TripResponse::for_viewer(created, user.id)),
    ))
}

/// Trips the requester created or is assigned to, newest first
pub async fn list_trips(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<TripResponse>>> {
    let trips = trip::Entity::find()
        .filter(visible_to(user.id))
        .order_by_desc(trip::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        trips
            .into_iter()
            .map(|t| TripResponse::for_viewer(t, user.id))
            .collect(),
    ))
}

pub async fn get_trip(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<TripResponse>> {
    let t = visible_trip(&state, user.id, id).await?;
    Ok(Json(TripResponse::for_viewer(t, user.id)))
}

// ============ Lifecycle ============

#[derive(Debug, Deserialize)]
pub struct AssignTripRequest {
    pub driver: Uuid,
}

/// Assign a pending trip to an active driver of the creator's company
pub async fn assign_trip(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<AssignTripRequest>,
) -> AppResult<Json<TripResponse>> {
    let t = visible_trip(&state, user.id, id).await?;
    ensure_creator(&t, user.id)?;

    let driver = user::Entity::find_by_id(payload.driver)
        .one(&state.db)
        .await?
        .filter(|d| d.is_active && d.role == UserRole::CompanyDriver)
        .ok_or_else(|| AppError::field("driver", "Driver must be an active company driver."))?;

    let company = companies::find_owned(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    if companies::active_membership(&state.db, company.id, driver.id)
        .await?
        .is_none()
    {
        return Err(AppError::field(
            "driver",
            "Driver is not an active member of your company.",
        ));
    }

    let updated = t
        .assign(driver.id, codes::otp_code(), Utc::now().into())?
        .update(&state.db)
        .await?;

    tracing::info!(trip_id = %updated.id, driver_id = %driver.id, "Trip assigned");
    Ok(Json(TripResponse::for_viewer(updated, user.id)))
}

/// Assigned driver picks the delivery up
pub async fn start_trip(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<TripResponse>> {
    let t = visible_trip(&state, user.id, id).await?;
    ensure_assigned_driver(&t, user.id)?;

    let updated = t.start(Utc::now().into())?.update(&state.db).await?;

    tracing::info!(trip_id = %updated.id, driver_id = %user.id, "Trip started");
    Ok(Json(TripResponse::for_viewer(updated, user.id)))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmTripRequest {
    #[serde(default)]
    pub otp: String,
}

/// Assigned driver completes the delivery with the recipient's OTP
pub async fn confirm_trip(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<ConfirmTripRequest>,
) -> AppResult<Json<TripResponse>> {
    let t = visible_trip(&state, user.id, id).await?;
    ensure_assigned_driver(&t, user.id)?;

    let updated = t
        .confirm(payload.otp.trim(), Utc::now().into())?
        .update(&state.db)
        .await?;

    tracing::info!(trip_id = %updated.id, driver_id = %user.id, "Trip completed");
    Ok(Json(TripResponse::for_viewer(updated, user.id)))
}

/// Creator cancels a trip that is still pending
pub async fn cancel_trip(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<TripResponse>> {
    let t = visible_trip(&state, user.id, id).await?;
    ensure_creator(&t, user.id)?;

    let updated = t.cancel(Utc::now().into())?.update(&state.db).await?;

    tracing::info!(trip_id = %updated.id, "Trip cancelled");
    Ok(Json(TripResponse::for_viewer(updated, user.id)))
}

use axum::{
    extract::State,
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::entities::{company, driver_profile, profile, vehicle};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::auth::UserInfo;
use crate::handlers::profile::{load_driver_profile, DriverProfileResponse};
use crate::middleware::auth::CurrentUser;
use crate::services::{companies, provisioning::Provisioned, users};
use crate::AppState;

// ============ User Management ============

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,
}

/// List all users, optionally filtered by role (admin)
pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListUsersQuery>,
) -> AppResult<Json<Vec<UserInfo>>> {
    let mut select = user::Entity::find().order_by_desc(user::Column::DateJoined);
    if let Some(role) = query.role {
        select = select.filter(user::Column::Role.eq(role));
    }

    let users = select.all(&state.db).await?;
    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserInfo,
    pub has_profile: bool,
    pub driver_profile: Option<DriverProfileResponse>,
    pub company: Option<Uuid>,
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// One user with the role records attached to it (admin)
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<UserDetail>> {
    let u = find_user(&state, id).await?;

    let has_profile = profile::Entity::find()
        .filter(profile::Column::UserId.eq(u.id))
        .one(&state.db)
        .await?
        .is_some();
    let driver_profile = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(u.id))
        .one(&state.db)
        .await?
        .map(|p| DriverProfileResponse::new(&state, p));
    let company = companies::find_owned(&state.db, u.id).await?.map(|c| c.id);

    Ok(Json(UserDetail {
        user: u.into(),
        has_profile,
        driver_profile,
        company,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct RoleChangeResponse {
    pub user: UserInfo,
    pub provisioned: Provisioned,
}

/// Change a user's role; missing role records are created, none are removed
pub async fn update_user_role(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> AppResult<Json<RoleChangeResponse>> {
    let u = find_user(&state, user_id).await?;
    let (updated, provisioned) = users::change_role(&state.db, u, payload.role).await?;

    Ok(Json(RoleChangeResponse {
        user: updated.into(),
        provisioned,
    }))
}

/// Delete any user account (admin); dependent rows go with it
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if admin.id == id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    let u = find_user(&state, id).await?;

    // Files outlive rows, collect them before the cascade
    let mut files: Vec<String> = vehicle::Entity::find()
        .filter(vehicle::Column::DriverId.eq(u.id))
        .all(&state.db)
        .await?
        .into_iter()
        .flat_map(|v| {
            [
                v.road_worthiness_certificate,
                v.vehicle_insurance,
                v.inspection_report,
            ]
        })
        .collect();
    if let Some(p) = profile::Entity::find()
        .filter(profile::Column::UserId.eq(u.id))
        .one(&state.db)
        .await?
    {
        files.extend(p.image);
    }
    if let Some(p) = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(u.id))
        .one(&state.db)
        .await?
    {
        files.extend(p.image);
    }
    if let Some(c) = company::Entity::find()
        .filter(company::Column::OwnerId.eq(u.id))
        .one(&state.db)
        .await?
    {
        files.extend(c.logo);
    }

    user::Entity::delete_by_id(u.id).exec(&state.db).await?;
    for file in &files {
        state.media.remove(file).await;
    }

    tracing::info!(user_id = %u.id, email = %u.email, "User deleted");
    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ============ Driver Verification ============

/// Mark a driver profile as verified (admin)
pub async fn verify_driver(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> AppResult<Json<DriverProfileResponse>> {
    let p = load_driver_profile(&state, user_id).await?;

    let mut active: driver_profile::ActiveModel = p.into();
    active.mark_verified();
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id = %user_id, "Driver verified");
    Ok(Json(DriverProfileResponse::new(&state, updated)))
}

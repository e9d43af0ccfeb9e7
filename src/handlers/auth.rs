use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::extract::AppJson;
use crate::middleware::auth::CurrentUser;
use crate::services::users::{self, NewUser};
use crate::utils::jwt::create_token;
use crate::utils::password::verify_password;
use crate::utils::validation::{
    looks_like_email, normalize_phone, validate_max_len, validate_phone, validate_required,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password1: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address or phone number
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub phone_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_driver: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<user::Model> for UserInfo {
    fn from(u: user::Model) -> Self {
        Self {
            full_name: u.full_name(),
            is_driver: u.is_driver(),
            id: u.id,
            email: u.email,
            phone_number: u.phone_number,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            date_joined: u.date_joined.with_timezone(&Utc),
        }
    }
}

/// Roles open to self-registration. Admins are seeded from the environment
/// or promoted by another admin.
fn parse_role(value: &str) -> Option<UserRole> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .ok()
        .filter(|role| *role != UserRole::Admin)
}

/// Field checks plus uniqueness lookups; every problem is reported at once.
async fn validate_registration(
    state: &AppState,
    payload: &RegisterRequest,
) -> AppResult<UserRole> {
    let mut errors = FieldErrors::new();

    let email = users::normalize_email(&payload.email);
    if let Err(msg) = validate_required(&email, 255) {
        errors.add("email", msg);
    } else if !looks_like_email(&email) {
        errors.add("email", "Enter a valid email address.");
    } else {
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(&state.db)
            .await?
            .is_some();
        if taken {
            errors.add("email", "Email already exists");
        }
    }

    if let Err(msg) = validate_required(&payload.first_name, 30) {
        errors.add("first_name", msg);
    }
    if let Err(msg) = validate_required(&payload.last_name, 30) {
        errors.add("last_name", msg);
    }

    if let Some(phone) = payload.phone_number.as_deref().filter(|p| !p.trim().is_empty()) {
        let phone = normalize_phone(phone);
        if let Err(msg) = validate_phone(&phone) {
            errors.add("phone_number", msg);
        } else {
            let taken = user::Entity::find()
                .filter(user::Column::PhoneNumber.eq(&phone))
                .one(&state.db)
                .await?
                .is_some();
            if taken {
                errors.add("phone_number", "Phone number already exists");
            }
        }
    }

    if payload.password1.is_empty() {
        errors.add("password1", "This field is required.");
    } else if let Err(msg) = validate_max_len(&payload.password1, 128) {
        errors.add("password1", msg);
    }
    if payload.password1 != payload.password2 {
        errors.add("password2", "Passwords do not match");
    }

    let role = if payload.role.is_empty() {
        errors.add("role", "This field is required.");
        None
    } else {
        let role = parse_role(&payload.role);
        if role.is_none() {
            errors.add("role", format!("\"{}\" is not a valid choice.", payload.role));
        }
        role
    };

    errors.into_result()?;
    role.ok_or_else(|| AppError::field("role", "This field is required."))
}

fn auth_response(state: &AppState, user: user::Model) -> AppResult<AuthResponse> {
    let token = create_token(
        user.id,
        &user.email,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// Register a new account; role records are provisioned with the user
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let role = validate_registration(&state, &payload).await?;

    let user = users::create_user(
        &state.db,
        NewUser {
            email: payload.email,
            password: payload.password1,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            phone_number: payload.phone_number.filter(|p| !p.trim().is_empty()),
            role,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

/// Login with email or phone number and password
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid credentials.".to_string());

    let user = users::find_by_identifier(&state.db, &payload.identifier)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    tracing::debug!(user_id = %user.id, "User logged in");
    Ok(Json(auth_response(&state, user)?))
}

/// Current user
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserInfo> {
    Json(user.into())
}

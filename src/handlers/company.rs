use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{company, company_driver, user};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::extract::{AppJson, AppPath};
use crate::handlers::double_option;
use crate::handlers::uploads::read_form;
use crate::middleware::auth::CurrentUser;
use crate::services::companies;
use crate::utils::validation::{looks_like_email, validate_max_len};
use crate::AppState;

const LOGO_DIR: &str = "company/logos";

#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub display_name: String,
    pub owner: Uuid,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
    pub invite_code: String,
    pub active_drivers_count: u64,
    pub total_drivers_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyResponse {
    async fn load(state: &AppState, c: company::Model) -> AppResult<Self> {
        let counts = companies::driver_counts(&state.db, c.id).await?;
        Ok(Self {
            display_name: c.display_name(),
            logo: c.logo.as_deref().map(|path| state.media.url(path)),
            id: c.id,
            name: c.name,
            owner: c.owner_id,
            address: c.address,
            phone_number: c.phone_number,
            email: c.email,
            website: c.website,
            invite_code: c.invite_code,
            active_drivers_count: counts.active,
            total_drivers_count: counts.total,
            created_at: c.created_at.with_timezone(&Utc),
            updated_at: c.updated_at.with_timezone(&Utc),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub id: Uuid,
    pub driver: Uuid,
    pub driver_name: Option<String>,
    pub driver_email: Option<String>,
    pub company: Uuid,
    pub company_name: Option<String>,
    pub label: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MembershipResponse {
    fn new(
        m: company_driver::Model,
        driver: Option<&user::Model>,
        company: Option<&company::Model>,
    ) -> Self {
        let label = match (driver, company) {
            (Some(d), Some(c)) => Some(company_driver::describe(d, c)),
            _ => None,
        };
        Self {
            id: m.id,
            driver: m.driver_id,
            driver_name: driver.map(|d| d.full_name()),
            driver_email: driver.map(|d| d.email.clone()),
            company: m.company_id,
            company_name: company.map(|c| c.display_name()),
            label,
            is_active: m.is_active,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

async fn owned_company(state: &AppState, owner: &user::Model) -> AppResult<company::Model> {
    companies::find_owned(&state.db, owner.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
}

// ============ Owner: company ============

/// Get own company with driver counts
pub async fn get_company(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<CompanyResponse>> {
    let c = owned_company(&state, &user).await?;
    Ok(Json(CompanyResponse::load(&state, c).await?))
}

/// The invite code is not client writable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCompanyRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
}

fn check_len(errors: &mut FieldErrors, field: &str, value: &Option<Option<String>>, max: usize) {
    if let Some(Some(value)) = value {
        if let Err(msg) = validate_max_len(value, max) {
            errors.add(field, msg);
        }
    }
}

/// Update own company details
pub async fn update_company(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<UpdateCompanyRequest>,
) -> AppResult<Json<CompanyResponse>> {
    let c = owned_company(&state, &user).await?;

    let mut errors = FieldErrors::new();
    check_len(&mut errors, "name", &payload.name, 255);
    check_len(&mut errors, "phone_number", &payload.phone_number, 20);
    check_len(&mut errors, "website", &payload.website, 200);
    if let Some(Some(email)) = &payload.email {
        if !email.is_empty() && !looks_like_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }
    errors.into_result()?;

    let mut active: company::ActiveModel = c.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(phone_number) = payload.phone_number {
        active.phone_number = Set(phone_number);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(website) = payload.website {
        active.website = Set(website);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    Ok(Json(CompanyResponse::load(&state, updated).await?))
}

/// Replace own company logo (multipart field `logo`)
pub async fn upload_logo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<Json<CompanyResponse>> {
    let c = owned_company(&state, &user).await?;

    let mut form = read_form(multipart).await?;
    let upload = form
        .take_file("logo")
        .ok_or_else(|| AppError::field("logo", "No file was submitted."))?;
    let path = state
        .media
        .save(LOGO_DIR, &upload.file_name, &upload.bytes)
        .await?;
    let previous = c.logo.clone();

    let mut active: company::ActiveModel = c.into();
    active.logo = Set(Some(path.clone()));
    active.updated_at = Set(Utc::now().into());
    let updated = state.media.commit(&path, active.update(&state.db)).await?;

    if let Some(previous) = previous {
        state.media.remove(&previous).await;
    }
    Ok(Json(CompanyResponse::load(&state, updated).await?))
}

// ============ Owner: drivers ============

/// List memberships of own company
pub async fn list_drivers(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<MembershipResponse>>> {
    let c = owned_company(&state, &user).await?;

    let rows = company_driver::Entity::find()
        .filter(company_driver::Column::CompanyId.eq(c.id))
        .order_by_desc(company_driver::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(&state.db)
        .await?;

    let drivers = rows
        .into_iter()
        .map(|(m, driver)| MembershipResponse::new(m, driver.as_ref(), Some(&c)))
        .collect();

    Ok(Json(drivers))
}

async fn membership_in(
    state: &AppState,
    company_id: Uuid,
    driver_id: Uuid,
) -> AppResult<company_driver::Model> {
    company_driver::Entity::find()
        .filter(company_driver::Column::CompanyId.eq(company_id))
        .filter(company_driver::Column::DriverId.eq(driver_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found in company".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMembershipRequest {
    pub is_active: bool,
}

/// Activate or deactivate a driver of own company
pub async fn update_driver(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(driver_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateMembershipRequest>,
) -> AppResult<Json<MembershipResponse>> {
    let c = owned_company(&state, &user).await?;
    let m = membership_in(&state, c.id, driver_id).await?;

    let mut active: company_driver::ActiveModel = m.into();
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    let driver = user::Entity::find_by_id(driver_id).one(&state.db).await?;
    tracing::info!(
        company_id = %c.id,
        driver_id = %driver_id,
        is_active = updated.is_active,
        "Company membership updated"
    );
    Ok(Json(MembershipResponse::new(updated, driver.as_ref(), Some(&c))))
}

/// Remove a driver from own company
pub async fn remove_driver(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(driver_id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let c = owned_company(&state, &user).await?;
    let m = membership_in(&state, c.id, driver_id).await?;
    m.delete(&state.db).await?;

    tracing::info!(company_id = %c.id, driver_id = %driver_id, "Driver removed from company");
    Ok(StatusCode::NO_CONTENT)
}

// ============ Driver: memberships ============

#[derive(Debug, Deserialize)]
pub struct JoinCompanyRequest {
    pub invite_code: String,
}

/// Join a company by invite code
pub async fn join_company(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<JoinCompanyRequest>,
) -> AppResult<(StatusCode, Json<MembershipResponse>)> {
    company_driver::validate_driver_role(user.role)?;

    let code = payload.invite_code.trim();
    let c = company::Entity::find()
        .filter(company::Column::InviteCode.eq(code))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid invite code".to_string()))?;

    let existing = company_driver::Entity::find()
        .filter(company_driver::Column::CompanyId.eq(c.id))
        .filter(company_driver::Column::DriverId.eq(user.id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Already a member of this company".to_string(),
        ));
    }

    let now = Utc::now();
    let m = company_driver::ActiveModel {
        id: Set(Uuid::new_v4()),
        driver_id: Set(user.id),
        company_id: Set(c.id),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        membership = %company_driver::describe(&user, &c),
        "Driver joined company"
    );
    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse::new(m, Some(&user), Some(&c))),
    ))
}

/// Companies the current driver belongs to
pub async fn my_companies(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<MembershipResponse>>> {
    let rows = company_driver::Entity::find()
        .filter(company_driver::Column::DriverId.eq(user.id))
        .order_by_desc(company_driver::Column::CreatedAt)
        .find_also_related(company::Entity)
        .all(&state.db)
        .await?;

    let memberships = rows
        .into_iter()
        .map(|(m, c)| MembershipResponse::new(m, Some(&user), c.as_ref()))
        .collect();

    Ok(Json(memberships))
}

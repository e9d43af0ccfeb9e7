use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use sea_orm::EntityTrait;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::verify_token;
use crate::AppState;

/// The authenticated user, loaded fresh from the database on every request
/// so role changes apply without re-issuing tokens.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(auth) = auth.ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided".to_string())
    })?;

    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;

    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized("User not found or inactive".to_string()))?;

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

fn current_role(request: &Request) -> AppResult<UserRole> {
    request
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(user)| user.role)
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))
}

fn require_exact(request: &Request, role: UserRole) -> AppResult<()> {
    if current_role(request)? != role {
        return Err(AppError::Forbidden(format!("{} access required", role.label())));
    }
    Ok(())
}

/// Require admin role
pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    require_exact(&request, UserRole::Admin)?;
    Ok(next.run(request).await)
}

/// Require company owner role
pub async fn require_company_owner(request: Request, next: Next) -> AppResult<Response> {
    require_exact(&request, UserRole::CompanyOwner)?;
    Ok(next.run(request).await)
}

/// Require company driver role
pub async fn require_company_driver(request: Request, next: Next) -> AppResult<Response> {
    require_exact(&request, UserRole::CompanyDriver)?;
    Ok(next.run(request).await)
}

/// Require any driving role (individual driver, company driver, company owner)
pub async fn require_driver(request: Request, next: Next) -> AppResult<Response> {
    if !current_role(&request)?.is_driver() {
        return Err(AppError::Forbidden("Driver access required".to_string()));
    }
    Ok(next.run(request).await)
}

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::handlers::{admin, auth, company, profile, trips, vehicles};
use crate::middleware::auth::{
    auth_middleware, require_admin, require_company_driver, require_company_owner, require_driver,
};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::storage::MEDIA_URL_PREFIX;
use crate::AppState;

/// Upper bound for multipart bodies (vehicle documents, images, logos)
const UPLOAD_LIMIT_BYTES: usize = 20 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let driver_governor = create_role_governor(RateLimitedRole::Driver);
    let standard_governor = create_role_governor(RateLimitedRole::Standard);
    let public_governor = create_public_governor();

    // Public routes (per IP)
    let public_auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor);

    // Any authenticated user
    let account_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/companies/join", post(company::join_company))
        .layer(standard_governor.clone())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (auth + admin role, global IP limit only)
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", get(admin::get_user).delete(admin::delete_user))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/drivers/{user_id}/verify", post(admin::verify_driver))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_profile_routes = Router::new()
        .route("/", get(profile::get_profile).patch(profile::update_profile))
        .route("/image", put(profile::upload_profile_image))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Any driving role
    let driver_routes = Router::new()
        .route(
            "/profile",
            get(profile::get_driver_profile).patch(profile::update_driver_profile),
        )
        .route("/profile/image", put(profile::upload_driver_profile_image))
        .route("/companies", get(company::my_companies))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(driver_governor.clone())
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Company drivers only
    let company_driver_routes = Router::new()
        .route(
            "/online-status",
            get(profile::get_online_status).patch(profile::update_online_status),
        )
        .layer(driver_governor.clone())
        .layer(middleware::from_fn(require_company_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Company owner: own company and its drivers
    let owner_routes = Router::new()
        .route("/", get(company::get_company).patch(company::update_company))
        .route("/logo", put(company::upload_logo))
        .route("/drivers", get(company::list_drivers))
        .route(
            "/drivers/{driver_id}",
            patch(company::update_driver).delete(company::remove_driver),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(standard_governor)
        .layer(middleware::from_fn(require_company_owner))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let vehicle_routes = Router::new()
        .route(
            "/",
            get(vehicles::list_vehicles).post(vehicles::create_vehicle),
        )
        .route(
            "/{id}",
            get(vehicles::get_vehicle)
                .patch(vehicles::patch_vehicle)
                .put(vehicles::replace_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(driver_governor.clone())
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Creators and assigned drivers; handlers check who may do what
    let trip_routes = Router::new()
        .route("/", get(trips::list_trips).post(trips::create_trip))
        .route("/{id}", get(trips::get_trip))
        .route("/{id}/assign", post(trips::assign_trip))
        .route("/{id}/start", post(trips::start_trip))
        .route("/{id}/confirm", post(trips::confirm_trip))
        .route("/{id}/cancel", post(trips::cancel_trip))
        .layer(driver_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let media = ServeDir::new(state.media.root());

    Router::new()
        .nest("/api/auth", public_auth_routes)
        .nest("/api", account_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/profile", admin_profile_routes)
        .nest("/api/driver", driver_routes.merge(company_driver_routes))
        .nest("/api/company", owner_routes)
        .nest("/api/vehicles", vehicle_routes)
        .nest("/api/trips", trip_routes)
        .nest_service(MEDIA_URL_PREFIX, media)
        .with_state(state)
}

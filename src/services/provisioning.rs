//! Role-dependent side records.
//!
//! Every user needs the records that match its role: admins get a
//! [`profile`], every driving role gets a [`driver_profile`], and company
//! owners additionally own a [`company`]. [`provision`] creates whatever is
//! missing and is called inside the same transaction as the user insert or
//! role update, so a user never exists without its records.
//!
//! Records are never removed when a role changes. A demoted owner keeps
//! the company, an admin promoted to driver keeps the admin profile.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::entities::{driver_profile, profile};
use crate::error::AppResult;
use crate::services::companies;

/// What a [`provision`] call created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Provisioned {
    pub profile: bool,
    pub driver_profile: bool,
    pub company: bool,
}

impl Provisioned {
    pub fn is_empty(&self) -> bool {
        !(self.profile || self.driver_profile || self.company)
    }
}

pub async fn provision<C: ConnectionTrait>(db: &C, user: &user::Model) -> AppResult<Provisioned> {
    let mut created = Provisioned::default();

    match user.role {
        UserRole::Admin => {
            created.profile = ensure_profile(db, user).await?;
        }
        UserRole::IndividualDriver | UserRole::CompanyDriver => {
            created.driver_profile = ensure_driver_profile(db, user).await?;
        }
        UserRole::CompanyOwner => {
            created.driver_profile = ensure_driver_profile(db, user).await?;
            created.company = ensure_company(db, user).await?;
        }
    }

    Ok(created)
}

async fn ensure_profile<C: ConnectionTrait>(db: &C, user: &user::Model) -> AppResult<bool> {
    let existing = profile::Entity::find()
        .filter(profile::Column::UserId.eq(user.id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let now = Utc::now();
    profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        image: Set(None),
        address: Set(String::new()),
        city: Set(String::new()),
        state: Set(String::new()),
        zip_code: Set(String::new()),
        country: Set(String::new()),
        date_of_birth: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Profile created");
    Ok(true)
}

async fn ensure_driver_profile<C: ConnectionTrait>(db: &C, user: &user::Model) -> AppResult<bool> {
    let existing = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(user.id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let now = Utc::now();
    driver_profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        image: Set(None),
        address: Set(String::new()),
        city: Set(String::new()),
        state: Set(String::new()),
        zip_code: Set(String::new()),
        country: Set(String::new()),
        date_of_birth: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        license_number: Set(String::new()),
        license_class: Set(String::new()),
        license_expiry: Set(None),
        emergency_contact_name: Set(String::new()),
        emergency_contact_phone: Set(String::new()),
        verified: Set(false),
        verified_at: Set(None),
        is_online: Set(false),
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Driver profile created");
    Ok(true)
}

async fn ensure_company<C: ConnectionTrait>(db: &C, user: &user::Model) -> AppResult<bool> {
    if companies::find_owned(db, user.id).await?.is_some() {
        return Ok(false);
    }

    let company = companies::create_for_owner(db, user).await?;
    tracing::info!(
        user_id = %user.id,
        company_id = %company.id,
        invite_code = %company.invite_code,
        "Company created"
    );
    Ok(true)
}

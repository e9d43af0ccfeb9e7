use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;
use crate::utils::dates;

/// Profile for every driving role: license, emergency contact and
/// verification state on top of the common profile fields.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "driver_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub image: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub date_of_birth: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub license_number: String,
    pub license_class: String,
    pub license_expiry: Option<Date>,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub verified: bool,
    pub verified_at: Option<DateTimeWithTimeZone>,
    pub is_online: bool,
}

pub const LICENSE_EXPIRED: &str = "License has expired. Please update with valid license.";
pub const VERIFIED_AT_REQUIRED: &str = "Verified date must be set when profile is verified.";

impl Model {
    pub fn validate_on(&self, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.license_expiry.is_some_and(|expiry| expiry < today) {
            errors.add("license_expiry", LICENSE_EXPIRED);
        }
        if self.verified && self.verified_at.is_none() {
            errors.add("verified_at", VERIFIED_AT_REQUIRED);
        }
        errors
    }

    pub fn is_license_expired_on(&self, today: NaiveDate) -> Option<bool> {
        self.license_expiry.map(|expiry| expiry < today)
    }

    /// Negative once the license has expired.
    pub fn license_expiry_days_on(&self, today: NaiveDate) -> Option<i64> {
        self.license_expiry
            .map(|expiry| (expiry - today).num_days())
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.date_of_birth.map(|dob| dates::age_on(dob, today))
    }
}

impl ActiveModel {
    pub fn mark_verified(&mut self) {
        self.verified = sea_orm::Set(true);
        self.verified_at = sea_orm::Set(Some(Utc::now().into()));
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "COMPANY_OWNER")]
    CompanyOwner,
    #[sea_orm(string_value = "INDIVIDUAL_DRIVER")]
    IndividualDriver,
    #[sea_orm(string_value = "COMPANY_DRIVER")]
    CompanyDriver,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::IndividualDriver
    }
}

impl UserRole {
    /// Company owners drive too, so they count as drivers.
    pub fn is_driver(self) -> bool {
        matches!(
            self,
            UserRole::IndividualDriver | UserRole::CompanyDriver | UserRole::CompanyOwner
        )
    }

    pub fn can_join_company(self) -> bool {
        matches!(self, UserRole::CompanyDriver | UserRole::CompanyOwner)
    }

    pub fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::CompanyOwner => "Company Owner",
            UserRole::IndividualDriver => "Individual Driver",
            UserRole::CompanyDriver => "Company Driver",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub date_joined: DateTimeWithTimeZone,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn display_name(&self) -> String {
        if !self.first_name.is_empty() && !self.last_name.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
        } else {
            self.email.clone()
        }
    }

    pub fn is_driver(&self) -> bool {
        self.role.is_driver()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::profile::Entity")]
    Profile,
    #[sea_orm(has_one = "super::driver_profile::Entity")]
    DriverProfile,
    #[sea_orm(has_one = "super::company::Entity")]
    OwnedCompany,
    #[sea_orm(has_many = "super::company_driver::Entity")]
    CompanyMemberships,
    #[sea_orm(has_many = "super::vehicle::Entity")]
    Vehicles,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::driver_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DriverProfile.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OwnedCompany.def()
    }
}

impl Related<super::company_driver::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompanyMemberships.def()
    }
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user::UserRole;
use crate::error::{AppError, AppResult};

pub const ROLE_NOT_ALLOWED: &str =
    "User must have COMPANY_DRIVER or COMPANY_OWNER role to be added to a company.";

/// Membership of a driver in a company. A driver may belong to several
/// companies, once each.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company_driver")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub driver_id: Uuid,
    pub company_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub fn validate_driver_role(role: UserRole) -> AppResult<()> {
    if role.can_join_company() {
        Ok(())
    } else {
        Err(AppError::field("role", ROLE_NOT_ALLOWED))
    }
}

/// "{driver} - {company}" label used in logs and listings.
pub fn describe(driver: &super::user::Model, company: &super::company::Model) -> String {
    let company_name = match company.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => "Company",
    };
    format!("{} - {}", driver.full_name(), company_name)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Driver,
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_roles_may_join() {
        assert!(validate_driver_role(UserRole::CompanyDriver).is_ok());
        assert!(validate_driver_role(UserRole::CompanyOwner).is_ok());
    }

    #[test]
    fn other_roles_are_rejected_on_role_field() {
        for role in [UserRole::IndividualDriver, UserRole::Admin] {
            match validate_driver_role(role) {
                Err(AppError::Validation(fields)) => assert!(fields.contains("role")),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }
}

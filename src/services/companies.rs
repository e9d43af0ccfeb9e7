use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{company, company_driver, user};
use crate::error::{AppError, AppResult};
use crate::utils::codes;

const INVITE_CODE_ATTEMPTS: usize = 8;

/// Draw invite codes until one is not taken.
pub async fn unique_invite_code<C: ConnectionTrait>(db: &C) -> AppResult<String> {
    unique_invite_code_from(db, codes::invite_code).await
}

/// Same as [`unique_invite_code`] with the codes taken from `draw`.
pub async fn unique_invite_code_from<C, F>(db: &C, mut draw: F) -> AppResult<String>
where
    C: ConnectionTrait,
    F: FnMut() -> String,
{
    for _ in 0..INVITE_CODE_ATTEMPTS {
        let code = draw();
        let taken = company::Entity::find()
            .filter(company::Column::InviteCode.eq(&code))
            .one(db)
            .await?
            .is_some();
        if !taken {
            return Ok(code);
        }
        tracing::warn!(code = %code, "Invite code collision, retrying");
    }

    Err(AppError::Internal(
        "Could not generate a unique invite code".to_string(),
    ))
}

/// Company for a new owner, named after them and reachable at their contacts.
pub async fn create_for_owner<C: ConnectionTrait>(
    db: &C,
    owner: &user::Model,
) -> AppResult<company::Model> {
    let now = Utc::now();
    let company = company::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(Some(format!(
            "{} {}'s Company",
            owner.first_name, owner.last_name
        ))),
        owner_id: Set(owner.id),
        address: Set(None),
        phone_number: Set(owner.phone_number.clone()),
        email: Set(Some(owner.email.clone())),
        website: Set(None),
        logo: Set(None),
        invite_code: Set(unique_invite_code(db).await?),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(company.insert(db).await?)
}

pub async fn find_owned<C: ConnectionTrait>(
    db: &C,
    owner_id: Uuid,
) -> AppResult<Option<company::Model>> {
    Ok(company::Entity::find()
        .filter(company::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverCounts {
    pub active: u64,
    pub total: u64,
}

pub async fn driver_counts<C: ConnectionTrait>(db: &C, company_id: Uuid) -> AppResult<DriverCounts> {
    let total = company_driver::Entity::find()
        .filter(company_driver::Column::CompanyId.eq(company_id))
        .count(db)
        .await?;

    let active = company_driver::Entity::find()
        .filter(company_driver::Column::CompanyId.eq(company_id))
        .filter(company_driver::Column::IsActive.eq(true))
        .count(db)
        .await?;

    Ok(DriverCounts { active, total })
}

/// Active membership of `driver_id` in `company_id`, if any.
pub async fn active_membership<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    driver_id: Uuid,
) -> AppResult<Option<company_driver::Model>> {
    Ok(company_driver::Entity::find()
        .filter(company_driver::Column::CompanyId.eq(company_id))
        .filter(company_driver::Column::DriverId.eq(driver_id))
        .filter(company_driver::Column::IsActive.eq(true))
        .one(db)
        .await?)
}

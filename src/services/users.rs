use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::AppResult;
use crate::services::provisioning::{self, Provisioned};
use crate::utils::password::hash_password;
use crate::utils::validation::{looks_like_email, normalize_phone};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
}

/// Emails are compared case-insensitively, so they are stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Insert the user and its role records in one transaction.
pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> AppResult<user::Model> {
    let password_hash = hash_password(&new_user.password)?;

    let txn = db.begin().await?;

    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(normalize_email(&new_user.email)),
        phone_number: Set(new_user.phone_number.as_deref().map(normalize_phone)),
        password_hash: Set(password_hash),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        role: Set(new_user.role),
        is_active: Set(true),
        date_joined: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    let created = provisioning::provision(&txn, &user).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        role = ?user.role,
        ?created,
        "User created"
    );
    Ok(user)
}

/// Update the role and provision whatever the new role is missing.
pub async fn change_role(
    db: &DatabaseConnection,
    user: user::Model,
    role: UserRole,
) -> AppResult<(user::Model, Provisioned)> {
    let old_role = user.role;
    let txn = db.begin().await?;

    let mut active: user::ActiveModel = user.into();
    active.role = Set(role);
    let user = active.update(&txn).await?;

    let created = provisioning::provision(&txn, &user).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.id,
        from = ?old_role,
        to = ?role,
        ?created,
        "User role changed"
    );
    Ok((user, created))
}

/// Look a user up by email (case-insensitive) or by phone number.
pub async fn find_by_identifier(
    db: &DatabaseConnection,
    identifier: &str,
) -> AppResult<Option<user::Model>> {
    let identifier = identifier.trim();
    let query = if looks_like_email(identifier) {
        user::Entity::find().filter(user::Column::Email.eq(normalize_email(identifier)))
    } else {
        user::Entity::find().filter(user::Column::PhoneNumber.eq(normalize_phone(identifier)))
    };

    Ok(query.one(db).await?)
}

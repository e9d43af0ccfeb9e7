use sea_orm_migration::{prelude::*, schema::*};

use super::m20251001_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Columns shared by the admin profile and the driver profile tables.
fn common_profile_table<T>(table: T, fk_name: &str) -> TableCreateStatement
where
    T: IntoIden + Copy + 'static,
{
    Table::create()
        .table(table)
        .if_not_exists()
        .col(uuid(Common::Id).primary_key())
        .col(uuid(Common::UserId).not_null().unique_key())
        .col(string_len_null(Common::Image, 255))
        .col(text(Common::Address).not_null().default(""))
        .col(string_len(Common::City, 128).not_null().default(""))
        .col(string_len(Common::State, 128).not_null().default(""))
        .col(string_len(Common::ZipCode, 10).not_null().default(""))
        .col(string_len(Common::Country, 128).not_null().default(""))
        .col(date_null(Common::DateOfBirth))
        .col(
            timestamp_with_time_zone(Common::CreatedAt)
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            timestamp_with_time_zone(Common::UpdatedAt)
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .foreign_key(
            ForeignKey::create()
                .name(fk_name)
                .from(table, Common::UserId)
                .to(User::Table, User::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(common_profile_table(Profile::Table, "fk_profile_user"))
            .await?;

        let mut driver_profile =
            common_profile_table(DriverProfile::Table, "fk_driver_profile_user");
        driver_profile
            .col(string_len(DriverProfile::LicenseNumber, 64).not_null().default(""))
            .col(string_len(DriverProfile::LicenseClass, 32).not_null().default(""))
            .col(date_null(DriverProfile::LicenseExpiry))
            .col(
                string_len(DriverProfile::EmergencyContactName, 128)
                    .not_null()
                    .default(""),
            )
            .col(
                string_len(DriverProfile::EmergencyContactPhone, 20)
                    .not_null()
                    .default(""),
            )
            .col(boolean(DriverProfile::Verified).not_null().default(false))
            .col(timestamp_with_time_zone_null(DriverProfile::VerifiedAt))
            .col(boolean(DriverProfile::IsOnline).not_null().default(false));

        manager.create_table(driver_profile).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_driver_profile_verified_expiry")
                    .table(DriverProfile::Table)
                    .col(DriverProfile::Verified)
                    .col(DriverProfile::LicenseExpiry)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DriverProfile::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Common {
    Id,
    UserId,
    Image,
    Address,
    City,
    State,
    ZipCode,
    Country,
    DateOfBirth,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Profile {
    Table,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum DriverProfile {
    Table,
    LicenseNumber,
    LicenseClass,
    LicenseExpiry,
    EmergencyContactName,
    EmergencyContactPhone,
    Verified,
    VerifiedAt,
    IsOnline,
}

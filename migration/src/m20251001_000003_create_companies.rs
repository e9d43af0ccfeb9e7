use sea_orm_migration::{prelude::*, schema::*};

use super::m20251001_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(uuid(Company::Id).primary_key())
                    .col(string_len_null(Company::Name, 255))
                    .col(uuid(Company::OwnerId).not_null().unique_key())
                    .col(text_null(Company::Address))
                    .col(string_len_null(Company::PhoneNumber, 20))
                    .col(string_len_null(Company::Email, 255))
                    .col(string_len_null(Company::Website, 255))
                    .col(string_len_null(Company::Logo, 255))
                    .col(string_len(Company::InviteCode, 12).not_null().unique_key())
                    .col(
                        timestamp_with_time_zone(Company::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Company::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_owner")
                            .from(Company::Table, Company::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyDriver::Table)
                    .if_not_exists()
                    .col(uuid(CompanyDriver::Id).primary_key())
                    .col(uuid(CompanyDriver::DriverId).not_null())
                    .col(uuid(CompanyDriver::CompanyId).not_null())
                    .col(boolean(CompanyDriver::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(CompanyDriver::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(CompanyDriver::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_driver_driver")
                            .from(CompanyDriver::Table, CompanyDriver::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_driver_company")
                            .from(CompanyDriver::Table, CompanyDriver::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One membership per (driver, company) pair
        manager
            .create_index(
                Index::create()
                    .name("uq_company_driver_pair")
                    .table(CompanyDriver::Table)
                    .col(CompanyDriver::DriverId)
                    .col(CompanyDriver::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_company_driver_company_active")
                    .table(CompanyDriver::Table)
                    .col(CompanyDriver::CompanyId)
                    .col(CompanyDriver::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_company_driver_driver_active")
                    .table(CompanyDriver::Table)
                    .col(CompanyDriver::DriverId)
                    .col(CompanyDriver::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompanyDriver::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Company::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Company {
    Table,
    Id,
    Name,
    OwnerId,
    Address,
    PhoneNumber,
    Email,
    Website,
    Logo,
    InviteCode,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum CompanyDriver {
    Table,
    Id,
    DriverId,
    CompanyId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

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
                    .table(Trip::Table)
                    .if_not_exists()
                    .col(uuid(Trip::Id).primary_key())
                    .col(string_len(Trip::RecipientName, 255).not_null())
                    .col(string_len(Trip::RecipientPhone, 20).not_null())
                    .col(uuid_null(Trip::DriverId))
                    .col(uuid(Trip::CompanyId).not_null())
                    .col(string_len(Trip::VehicleType, 20).not_null())
                    .col(text(Trip::PickupAddress).not_null())
                    .col(text(Trip::DeliveryAddress).not_null())
                    .col(double(Trip::PickupLatitude).not_null())
                    .col(double(Trip::PickupLongitude).not_null())
                    .col(double(Trip::DeliveryLatitude).not_null())
                    .col(double(Trip::DeliveryLongitude).not_null())
                    .col(timestamp_with_time_zone(Trip::PickupTime).not_null())
                    .col(timestamp_with_time_zone_null(Trip::AssignedAt))
                    .col(timestamp_with_time_zone_null(Trip::StartedAt))
                    .col(timestamp_with_time_zone_null(Trip::CompletedAt))
                    .col(timestamp_with_time_zone_null(Trip::CancelledAt))
                    .col(string_len_null(Trip::OtpCode, 6))
                    .col(string_len(Trip::Status, 20).not_null().default("PENDING"))
                    .col(integer_null(Trip::Rating))
                    .col(
                        timestamp_with_time_zone(Trip::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Trip::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_driver")
                            .from(Trip::Table, Trip::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_company")
                            .from(Trip::Table, Trip::CompanyId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trip::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Trip {
    Table,
    Id,
    RecipientName,
    RecipientPhone,
    DriverId,
    CompanyId,
    VehicleType,
    PickupAddress,
    DeliveryAddress,
    PickupLatitude,
    PickupLongitude,
    DeliveryLatitude,
    DeliveryLongitude,
    PickupTime,
    AssignedAt,
    StartedAt,
    CompletedAt,
    CancelledAt,
    OtpCode,
    Status,
    Rating,
    CreatedAt,
    UpdatedAt,
}

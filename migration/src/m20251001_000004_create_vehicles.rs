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
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(uuid(Vehicle::DriverId).not_null())
                    .col(string_len(Vehicle::Brand, 255).not_null())
                    .col(string_len(Vehicle::Model, 255).not_null())
                    .col(integer(Vehicle::Year).not_null())
                    .col(string_len(Vehicle::LicenseNumber, 255).not_null())
                    .col(string_len(Vehicle::RegistrationNumber, 255).not_null())
                    .col(date(Vehicle::ExpiryDate).not_null())
                    .col(string_len(Vehicle::Colour, 255).not_null())
                    .col(string_len(Vehicle::RoadWorthinessCertificate, 255).not_null())
                    .col(string_len(Vehicle::VehicleInsurance, 255).not_null())
                    .col(string_len(Vehicle::InspectionReport, 255).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_driver")
                            .from(Vehicle::Table, Vehicle::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicle {
    Table,
    Id,
    DriverId,
    Brand,
    Model,
    Year,
    LicenseNumber,
    RegistrationNumber,
    ExpiryDate,
    Colour,
    RoadWorthinessCertificate,
    VehicleInsurance,
    InspectionReport,
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Upload folders for the three vehicle documents, relative to the media root.
pub const ROAD_WORTHINESS_DIR: &str = "road_worthiness";
pub const INSURANCE_DIR: &str = "vehicle_insurances";
pub const INSPECTION_DIR: &str = "inspection_reports";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub driver_id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub license_number: String,
    pub registration_number: String,
    pub expiry_date: Date,
    pub colour: String,
    pub road_worthiness_certificate: String,
    pub vehicle_insurance: String,
    pub inspection_report: String,
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

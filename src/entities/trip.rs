use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Bounds for the optional delivery rating.
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ASSIGNED")]
    Assigned,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    #[sea_orm(string_value = "BIKE")]
    Bike,
    #[sea_orm(string_value = "CAR")]
    Car,
    #[sea_orm(string_value = "VAN")]
    Van,
    #[sea_orm(string_value = "TRUCK")]
    Truck,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trip")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub driver_id: Option<Uuid>,
    /// User that created the trip.
    pub company_id: Uuid,
    pub vehicle_type: VehicleType,
    pub pickup_address: String,
    pub delivery_address: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub delivery_latitude: f64,
    pub delivery_longitude: f64,
    pub pickup_time: DateTimeWithTimeZone,
    pub assigned_at: Option<DateTimeWithTimeZone>,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub otp_code: Option<String>,
    pub status: TripStatus,
    pub rating: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn assign(
        self,
        driver_id: Uuid,
        otp: String,
        now: DateTimeWithTimeZone,
    ) -> AppResult<ActiveModel> {
        if self.status != TripStatus::Pending {
            return Err(AppError::BadRequest("Trip not pending".to_string()));
        }

        let mut active: ActiveModel = self.into();
        active.driver_id = Set(Some(driver_id));
        active.otp_code = Set(Some(otp));
        active.status = Set(TripStatus::Assigned);
        active.assigned_at = Set(Some(now));
        active.updated_at = Set(now);
        Ok(active)
    }

    pub fn start(self, now: DateTimeWithTimeZone) -> AppResult<ActiveModel> {
        if self.status != TripStatus::Assigned {
            return Err(AppError::BadRequest("Trip not assigned".to_string()));
        }

        let mut active: ActiveModel = self.into();
        active.status = Set(TripStatus::InProgress);
        active.started_at = Set(Some(now));
        active.updated_at = Set(now);
        Ok(active)
    }

    pub fn confirm(self, otp: &str, now: DateTimeWithTimeZone) -> AppResult<ActiveModel> {
        match self.otp_code.as_deref() {
            None => return Err(AppError::BadRequest("OTP not sent".to_string())),
            Some(expected) if expected != otp => {
                return Err(AppError::BadRequest("Invalid OTP".to_string()));
            }
            Some(_) => {}
        }

        let mut active: ActiveModel = self.into();
        active.status = Set(TripStatus::Completed);
        active.completed_at = Set(Some(now));
        active.otp_code = Set(None);
        active.updated_at = Set(now);
        Ok(active)
    }

    pub fn cancel(self, now: DateTimeWithTimeZone) -> AppResult<ActiveModel> {
        if self.status != TripStatus::Pending {
            return Err(AppError::BadRequest("Trip not pending".to_string()));
        }

        let mut active: ActiveModel = self.into();
        active.status = Set(TripStatus::Cancelled);
        active.cancelled_at = Set(Some(now));
        active.otp_code = Set(None);
        active.updated_at = Set(now);
        Ok(active)
    }
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
        belongs_to = "super::user::Entity",
        from = "Column::CompanyId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
}

impl ActiveModelBehavior for ActiveModel {}

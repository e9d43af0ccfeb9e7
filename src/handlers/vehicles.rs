use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::vehicle::{self, INSPECTION_DIR, INSURANCE_DIR, ROAD_WORTHINESS_DIR};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::extract::{AppJson, AppPath};
use crate::handlers::uploads::{read_form, MultipartForm, Upload};
use crate::middleware::auth::CurrentUser;
use crate::utils::validation::validate_required;
use crate::AppState;

const TEXT_MAX: usize = 255;

/// Document fields and the media folder each one is stored under.
const DOCUMENTS: [(&str, &str); 3] = [
    ("road_worthiness_certificate", ROAD_WORTHINESS_DIR),
    ("vehicle_insurance", INSURANCE_DIR),
    ("inspection_report", INSPECTION_DIR),
];

#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub driver: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub license_number: String,
    pub registration_number: String,
    pub expiry_date: NaiveDate,
    pub colour: String,
    pub road_worthiness_certificate: String,
    pub vehicle_insurance: String,
    pub inspection_report: String,
}

impl VehicleResponse {
    fn new(state: &AppState, v: vehicle::Model) -> Self {
        Self {
            road_worthiness_certificate: state.media.url(&v.road_worthiness_certificate),
            vehicle_insurance: state.media.url(&v.vehicle_insurance),
            inspection_report: state.media.url(&v.inspection_report),
            id: v.id,
            driver: v.driver_id,
            brand: v.brand,
            model: v.model,
            year: v.year,
            license_number: v.license_number,
            registration_number: v.registration_number,
            expiry_date: v.expiry_date,
            colour: v.colour,
        }
    }
}

/// Text columns of a vehicle, validated.
#[derive(Debug)]
struct VehicleFields {
    brand: String,
    model: String,
    year: i32,
    license_number: String,
    registration_number: String,
    expiry_date: NaiveDate,
    colour: String,
}

fn parse_year(value: &str) -> Result<i32, String> {
    value
        .trim()
        .parse()
        .map_err(|_| "A valid integer is required.".to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.".to_string()
    })
}

impl VehicleFields {
    fn from_form(form: &MultipartForm, errors: &mut FieldErrors) -> Option<Self> {
        let mut text = |name: &str| -> String {
            let value = form.text(name).unwrap_or_default().trim().to_string();
            if let Err(msg) = validate_required(&value, TEXT_MAX) {
                errors.add(name, msg);
            }
            value
        };
        let brand = text("brand");
        let model = text("model");
        let license_number = text("license_number");
        let registration_number = text("registration_number");
        let colour = text("colour");

        let year = match form.text("year") {
            None | Some("") => {
                errors.add("year", "This field is required.");
                None
            }
            Some(v) => parse_year(v).map_err(|msg| errors.add("year", msg)).ok(),
        };
        let expiry_date = match form.text("expiry_date") {
            None | Some("") => {
                errors.add("expiry_date", "This field is required.");
                None
            }
            Some(v) => parse_date(v).map_err(|msg| errors.add("expiry_date", msg)).ok(),
        };

        Some(Self {
            brand,
            model,
            year: year?,
            license_number,
            registration_number,
            expiry_date: expiry_date?,
            colour,
        })
    }
}

/// Pull the three document uploads out of the form; missing ones are
/// reported when `required`.
fn take_documents(
    form: &mut MultipartForm,
    required: bool,
    errors: &mut FieldErrors,
) -> [Option<Upload>; 3] {
    DOCUMENTS.map(|(field, _)| {
        let upload = form.take_file(field);
        if upload.is_none() && required {
            errors.add(field, "No file was submitted.");
        }
        upload
    })
}

/// Store each present upload, returning its media path.
async fn store_documents(
    state: &AppState,
    uploads: [Option<Upload>; 3],
) -> AppResult<[Option<String>; 3]> {
    let mut stored: [Option<String>; 3] = Default::default();
    for (i, upload) in uploads.into_iter().enumerate() {
        if let Some(upload) = upload {
            let dir = DOCUMENTS[i].1;
            match state.media.save(dir, &upload.file_name, &upload.bytes).await {
                Ok(path) => stored[i] = Some(path),
                Err(e) => {
                    discard(state, &stored).await;
                    return Err(e);
                }
            }
        }
    }
    Ok(stored)
}

async fn discard(state: &AppState, paths: &[Option<String>]) {
    for path in paths.iter().flatten() {
        state.media.remove(path).await;
    }
}

/// A vehicle of the requester; anyone else's is not found.
async fn owned_vehicle(state: &AppState, driver_id: Uuid, id: Uuid) -> AppResult<vehicle::Model> {
    vehicle::Entity::find_by_id(id)
        .filter(vehicle::Column::DriverId.eq(driver_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))
}

/// List own vehicles
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<VehicleResponse>>> {
    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::DriverId.eq(user.id))
        .order_by_asc(vehicle::Column::Brand)
        .all(&state.db)
        .await?;

    Ok(Json(
        vehicles
            .into_iter()
            .map(|v| VehicleResponse::new(&state, v))
            .collect(),
    ))
}

/// Register a vehicle with its three documents (multipart)
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<VehicleResponse>)> {
    let mut form = read_form(multipart).await?;

    let mut errors = FieldErrors::new();
    let fields = VehicleFields::from_form(&form, &mut errors);
    let uploads = take_documents(&mut form, true, &mut errors);
    errors.into_result()?;
    let fields = fields.ok_or_else(|| AppError::BadRequest("Invalid vehicle".to_string()))?;

    let stored = store_documents(&state, uploads).await?;
    let [Some(road), Some(insurance), Some(inspection)] = stored.clone() else {
        discard(&state, &stored).await;
        return Err(AppError::Internal("Vehicle documents were not stored".to_string()));
    };

    let created = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        driver_id: Set(user.id),
        brand: Set(fields.brand),
        model: Set(fields.model),
        year: Set(fields.year),
        license_number: Set(fields.license_number),
        registration_number: Set(fields.registration_number),
        expiry_date: Set(fields.expiry_date),
        colour: Set(fields.colour),
        road_worthiness_certificate: Set(road),
        vehicle_insurance: Set(insurance),
        inspection_report: Set(inspection),
    }
    .insert(&state.db)
    .await;

    let created = match created {
        Ok(v) => v,
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e.into());
        }
    };

    tracing::info!(vehicle_id = %created.id, driver_id = %user.id, "Vehicle registered");
    Ok((StatusCode::CREATED, Json(VehicleResponse::new(&state, created))))
}

/// Get one of own vehicles
pub async fn get_vehicle(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<VehicleResponse>> {
    let v = owned_vehicle(&state, user.id, id).await?;
    Ok(Json(VehicleResponse::new(&state, v)))
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchVehicleRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub license_number: Option<String>,
    pub registration_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub colour: Option<String>,
}

/// Partial JSON update of own vehicle; documents are changed through PUT
pub async fn patch_vehicle(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<PatchVehicleRequest>,
) -> AppResult<Json<VehicleResponse>> {
    let v = owned_vehicle(&state, user.id, id).await?;
    let mut active: vehicle::ActiveModel = v.into();

    let mut errors = FieldErrors::new();
    let text_fields = [
        ("brand", payload.brand, &mut active.brand),
        ("model", payload.model, &mut active.model),
        ("license_number", payload.license_number, &mut active.license_number),
        (
            "registration_number",
            payload.registration_number,
            &mut active.registration_number,
        ),
        ("colour", payload.colour, &mut active.colour),
    ];
    for (name, value, slot) in text_fields {
        if let Some(value) = value {
            let value = value.trim().to_string();
            if let Err(msg) = validate_required(&value, TEXT_MAX) {
                errors.add(name, msg);
            }
            *slot = Set(value);
        }
    }
    errors.into_result()?;

    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    if let Some(expiry_date) = payload.expiry_date {
        active.expiry_date = Set(expiry_date);
    }

    let updated = active.update(&state.db).await?;
    Ok(Json(VehicleResponse::new(&state, updated)))
}

/// Full multipart update of own vehicle; uploaded documents replace the stored ones
pub async fn replace_vehicle(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<VehicleResponse>> {
    let v = owned_vehicle(&state, user.id, id).await?;
    let mut form = read_form(multipart).await?;

    let mut errors = FieldErrors::new();
    let fields = VehicleFields::from_form(&form, &mut errors);
    let uploads = take_documents(&mut form, false, &mut errors);
    errors.into_result()?;
    let fields = fields.ok_or_else(|| AppError::BadRequest("Invalid vehicle".to_string()))?;

    let stored = store_documents(&state, uploads).await?;
    let previous = [
        v.road_worthiness_certificate.clone(),
        v.vehicle_insurance.clone(),
        v.inspection_report.clone(),
    ];

    let mut active: vehicle::ActiveModel = v.into();
    active.brand = Set(fields.brand);
    active.model = Set(fields.model);
    active.year = Set(fields.year);
    active.license_number = Set(fields.license_number);
    active.registration_number = Set(fields.registration_number);
    active.expiry_date = Set(fields.expiry_date);
    active.colour = Set(fields.colour);

    let [road, insurance, inspection] = stored.clone();
    if let Some(path) = road {
        active.road_worthiness_certificate = Set(path);
    }
    if let Some(path) = insurance {
        active.vehicle_insurance = Set(path);
    }
    if let Some(path) = inspection {
        active.inspection_report = Set(path);
    }

    let updated = match active.update(&state.db).await {
        Ok(v) => v,
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e.into());
        }
    };

    // Replaced documents are no longer referenced
    for (new, old) in stored.iter().zip(previous.iter()) {
        if new.is_some() {
            state.media.remove(old).await;
        }
    }

    Ok(Json(VehicleResponse::new(&state, updated)))
}

/// Delete own vehicle and its documents
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let v = owned_vehicle(&state, user.id, id).await?;
    let documents = [
        v.road_worthiness_certificate.clone(),
        v.vehicle_insurance.clone(),
        v.inspection_report.clone(),
    ];

    v.delete(&state.db).await?;
    for path in &documents {
        state.media.remove(path).await;
    }

    tracing::info!(vehicle_id = %id, driver_id = %user.id, "Vehicle deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_must_be_an_integer() {
        assert_eq!(parse_year(" 2019 "), Ok(2019));
        assert!(parse_year("twenty").is_err());
    }

    #[test]
    fn expiry_date_is_iso() {
        assert_eq!(
            parse_date("2027-03-01"),
            Ok(NaiveDate::from_ymd_opt(2027, 3, 1).unwrap())
        );
        assert!(parse_date("01/03/2027").is_err());
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let form = MultipartForm::default();
        let mut errors = FieldErrors::new();
        let fields = VehicleFields::from_form(&form, &mut errors);

        assert!(fields.is_none());
        for name in [
            "brand",
            "model",
            "year",
            "license_number",
            "registration_number",
            "expiry_date",
            "colour",
        ] {
            assert!(errors.contains(name), "{name} not reported");
        }
    }

    #[test]
    fn documents_required_on_create_only() {
        let mut errors = FieldErrors::new();
        take_documents(&mut MultipartForm::default(), true, &mut errors);
        assert!(errors.contains("vehicle_insurance"));

        let mut errors = FieldErrors::new();
        take_documents(&mut MultipartForm::default(), false, &mut errors);
        assert!(errors.is_empty());
    }
}

use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Query, State},
    http::{header::USER_AGENT, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use service::tracking::domain::{
    resolve_user_id, ContactExport, LocationRecord, LocationSnapshot, RegisterContactPayload,
    UpdateLocationPayload, INVALID_BODY,
};

use crate::errors::ApiError;
use crate::routes::AppState;

const SUCCESS: &str = "success";

/// Acknowledgement for both write endpoints.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub snapshot: LocationSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MyLocationResponse {
    Found { status: &'static str, location: LocationRecord },
    NotFound { status: &'static str, message: &'static str },
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub export: ContactExport,
}

#[derive(Debug, Deserialize)]
pub struct MyLocationQuery {
    pub user_id: Option<String>,
}

fn caller_id(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

/// Bodies that are not a JSON object of the expected shape (bad syntax, wrong
/// content type, non-string `name`/`phone`/`user_id`) are a plain 400.
fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "undecodable request body");
            Err(ApiError::bad_request(INVALID_BODY))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/register_user",
    tag = "tracking",
    request_body = crate::openapi::RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = crate::openapi::WriteAck),
        (status = 400, description = "Missing name or phone, or undecodable body", body = crate::openapi::ErrorBody),
        (status = 500, description = "Unexpected failure", body = crate::openapi::ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: Result<Json<RegisterContactPayload>, JsonRejection>,
) -> Result<Json<WriteResponse>, ApiError> {
    const FAILURE: &str = "Failed to register user";

    let payload = decode(payload)?;
    let registration = payload.validate().map_err(|e| ApiError::from_service(e, FAILURE))?;
    let user_id = resolve_user_id(payload.user_id.as_deref(), &caller_id(&addr));
    let name = registration.name().to_string();

    let user_id = state
        .store
        .register_contact(user_id, registration)
        .await
        .map_err(|e| ApiError::from_service(e, FAILURE))?;

    info!(%user_id, %name, "user registered");
    Ok(Json(WriteResponse { status: SUCCESS, message: "User registered successfully", user_id }))
}

#[utoipa::path(
    post,
    path = "/api/update_location",
    tag = "tracking",
    request_body = crate::openapi::UpdateLocationRequest,
    responses(
        (status = 200, description = "Location stored", body = crate::openapi::WriteAck),
        (status = 400, description = "Missing or non-numeric coordinates, or undecodable body", body = crate::openapi::ErrorBody),
        (status = 500, description = "Unexpected failure", body = crate::openapi::ErrorBody)
    )
)]
pub async fn update_location(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<UpdateLocationPayload>, JsonRejection>,
) -> Result<Json<WriteResponse>, ApiError> {
    const FAILURE: &str = "Failed to update location";

    let payload = decode(payload)?;
    let update = payload
        .validate(user_agent(&headers))
        .map_err(|e| ApiError::from_service(e, FAILURE))?;
    let user_id = resolve_user_id(payload.user_id.as_deref(), &caller_id(&addr));
    let (lat, lon) = (update.latitude, update.longitude);

    let user_id = state
        .store
        .update_location(user_id, update)
        .await
        .map_err(|e| ApiError::from_service(e, FAILURE))?;

    info!(%user_id, lat, lon, "location updated");
    Ok(Json(WriteResponse { status: SUCCESS, message: "Location updated successfully", user_id }))
}

#[utoipa::path(
    get,
    path = "/api/get_locations",
    tag = "tracking",
    responses(
        (status = 200, description = "Latest location per user, joined with contacts"),
        (status = 500, description = "Unexpected failure", body = crate::openapi::ErrorBody)
    )
)]
pub async fn get_locations(State(state): State<AppState>) -> Result<Json<LocationsResponse>, ApiError> {
    let snapshot = state
        .store
        .get_all_locations()
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to retrieve locations"))?;
    Ok(Json(LocationsResponse { status: SUCCESS, snapshot }))
}

#[utoipa::path(
    get,
    path = "/api/get_my_location",
    tag = "tracking",
    params(
        ("user_id" = Option<String>, Query, description = "Defaults to the caller's address")
    ),
    responses(
        (status = 200, description = "Location, or status `not_found`"),
        (status = 500, description = "Unexpected failure", body = crate::openapi::ErrorBody)
    )
)]
pub async fn get_my_location(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<MyLocationQuery>,
) -> Result<Json<MyLocationResponse>, ApiError> {
    let user_id = resolve_user_id(query.user_id.as_deref(), &caller_id(&addr));
    let location = state
        .store
        .get_location(&user_id)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to retrieve location"))?;

    let body = match location {
        Some(location) => MyLocationResponse::Found { status: SUCCESS, location },
        None => MyLocationResponse::NotFound {
            status: "not_found",
            message: "No location data found for this user",
        },
    };
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/export_contacts",
    tag = "tracking",
    responses(
        (status = 200, description = "Every registered contact with location status"),
        (status = 500, description = "Unexpected failure", body = crate::openapi::ErrorBody)
    )
)]
pub async fn export_contacts(State(state): State<AppState>) -> Result<Json<ExportResponse>, ApiError> {
    let export = state
        .store
        .export_contacts()
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to export contacts"))?;
    info!(total = export.total_registered, "contacts exported");
    Ok(Json(ExportResponse { status: SUCCESS, export }))
}

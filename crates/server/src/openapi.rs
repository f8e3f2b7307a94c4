use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorBody { pub error: String }

#[derive(ToSchema)]
pub struct WriteAck { pub status: String, pub message: String, pub user_id: String }

#[derive(ToSchema)]
pub struct RegisterUserRequest {
    pub name: String,
    pub phone: String,
    /// Defaults to the caller's address
    pub user_id: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateLocationRequest {
    /// Number or numeric string
    pub latitude: f64,
    /// Number or numeric string
    pub longitude: f64,
    /// Meters, or free text; `"unknown"` when omitted
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    /// Defaults to the caller's address
    pub user_id: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::tracking::register_user,
        crate::routes::tracking::update_location,
        crate::routes::tracking::get_locations,
        crate::routes::tracking::get_my_location,
        crate::routes::tracking::export_contacts,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            WriteAck,
            RegisterUserRequest,
            UpdateLocationRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "tracking")
    )
)]
pub struct ApiDoc;

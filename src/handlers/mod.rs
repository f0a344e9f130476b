pub mod ask;
pub mod info;
pub mod sessions;
pub mod speech;
pub mod viz;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;

use crate::error::GatewayError;
use crate::models::response::ErrorResponse;

/// JSON error body for a gateway error: `{error, status_code}`.
pub(crate) fn error_response(error: &GatewayError) -> HttpResponse {
    let status_code = error.status_code();
    let status =
        StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        status_code,
    })
}

pub(crate) fn internal_error(message: impl Into<String>) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: message.into(),
        status_code: 500,
    })
}

pub(crate) fn not_found(message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: message.into(),
        status_code: 404,
    })
}

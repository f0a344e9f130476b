use actix_web::{web, Error, HttpResponse};
use serde::Serialize;

use crate::services::BackendClient;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend_reachable: bool,
}

/// `GET /health` — gateway liveness plus a short-deadline backend probe.
pub async fn health(backend: web::Data<BackendClient>) -> Result<HttpResponse, Error> {
    let backend_reachable = backend.health().await;
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        backend_reachable,
    }))
}

/// `GET /user/role` — passthrough of the backend's role payload.
pub async fn user_role(backend: web::Data<BackendClient>) -> Result<HttpResponse, Error> {
    match backend.user_role().await {
        Ok(role) => Ok(HttpResponse::Ok().json(role)),
        Err(e) => Ok(super::error_response(&e)),
    }
}

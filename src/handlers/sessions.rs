use actix_web::{web, Error, HttpResponse};
use serde::Serialize;

use crate::services::SessionStoreTrait;

#[derive(Debug, Serialize)]
pub struct PinResponse {
    pub success: bool,
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: bool,
}

/// `GET /sessions/` — summaries of every session, pinned first.
pub async fn list_sessions<S>(sessions: web::Data<S>) -> Result<HttpResponse, Error>
where
    S: SessionStoreTrait,
{
    match sessions.list_sessions().await {
        Ok(summaries) => Ok(HttpResponse::Ok().json(summaries)),
        Err(e) => Ok(super::internal_error(e.to_string())),
    }
}

/// `GET /history/{id}` — the full turn history of one session.
pub async fn get_history<S>(
    path: web::Path<String>,
    sessions: web::Data<S>,
) -> Result<HttpResponse, Error>
where
    S: SessionStoreTrait,
{
    let id = path.into_inner();
    match sessions.get_history(&id).await {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(record)),
        Ok(None) => Ok(super::not_found(format!("Session {} not found", id))),
        Err(e) => Ok(super::internal_error(e.to_string())),
    }
}

/// `POST /sessions/{id}/pin` — toggle the pinned flag.
pub async fn toggle_pin<S>(
    path: web::Path<String>,
    sessions: web::Data<S>,
) -> Result<HttpResponse, Error>
where
    S: SessionStoreTrait,
{
    let id = path.into_inner();
    match sessions.toggle_pin(&id).await {
        Ok(Some(pinned)) => Ok(HttpResponse::Ok().json(PinResponse {
            success: true,
            pinned,
        })),
        Ok(None) => Ok(super::not_found(format!("Session {} not found", id))),
        Err(e) => Ok(super::internal_error(e.to_string())),
    }
}

/// `DELETE /sessions/{id}` — drop a session; deleting an unknown id reports
/// `deleted: false` rather than an error.
pub async fn delete_session<S>(
    path: web::Path<String>,
    sessions: web::Data<S>,
) -> Result<HttpResponse, Error>
where
    S: SessionStoreTrait,
{
    let id = path.into_inner();
    match sessions.delete_session(&id).await {
        Ok(deleted) => Ok(HttpResponse::Ok().json(DeleteResponse {
            success: true,
            deleted,
        })),
        Err(e) => Ok(super::internal_error(e.to_string())),
    }
}

use actix_web::{web, Error, HttpResponse};
use log::{error, info, warn};
use serde::Serialize;

use crate::error::GatewayError;
use crate::models::response::AskRequest;
use crate::models::view::RenderedTurn;
use crate::services::classifier::{self, Classification};
use crate::services::{dashboard, BackendClient, SelectionStore, SessionStoreTrait};

/// Response body for `POST /ask`: the session the turn landed in plus the
/// classified, render-ready turn.
#[derive(Debug, Serialize)]
pub struct AskReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub turn: RenderedTurn,
}

/// Forward one question to the backend, classify the raw response and answer
/// with a renderable turn. Transport failures, timeouts and pending-request
/// rejections map to distinct error bodies; classification itself never fails.
pub async fn ask<S>(
    request: web::Json<AskRequest>,
    backend: web::Data<BackendClient>,
    sessions: web::Data<S>,
    selections: web::Data<SelectionStore>,
) -> Result<HttpResponse, Error>
where
    S: SessionStoreTrait,
{
    let request = request.into_inner();

    let response = match backend.ask(&request).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Ask failed before classification: {}", e);
            return Ok(super::error_response(&e));
        }
    };

    let turn = match classifier::classify(&response) {
        Classification::Error(message) => RenderedTurn::Error { message },
        Classification::Unauthorized => RenderedTurn::Unauthorized {
            message: GatewayError::Unauthorized(
                "You are not authorized to access this information.".to_string(),
            )
            .to_string(),
        },
        Classification::Analytics(table) => {
            let view = dashboard::compose(&response, &table);
            // Every analytics turn keeps its table snapshot so header-click
            // re-sorting works; only offered turns enter the chart flow.
            if let (Some(turn_id), Some(conversation_id)) = (
                response.turn_id.as_deref(),
                response.conversation_id.as_deref(),
            ) {
                let stored = if view.chart_offer.is_some() {
                    info!("Registering chart offer for turn {}", turn_id);
                    selections.offer(turn_id, conversation_id, table.clone())
                } else {
                    selections.remember(turn_id, conversation_id, table.clone())
                };
                if let Err(e) = stored {
                    error!("Failed to store turn table: {}", e);
                }
            }
            RenderedTurn::Dashboard {
                view: Box::new(view),
            }
        }
        Classification::Text(answer) => RenderedTurn::Text { answer },
    };

    let session_id = match sessions
        .append_turn(request.session_id.as_deref(), &request.question, turn.clone())
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            // Persistence is best-effort; the turn still goes back to the user.
            error!("Failed to persist turn: {}", e);
            request.session_id.clone()
        }
    };

    Ok(HttpResponse::Ok().json(AskReply { session_id, turn }))
}

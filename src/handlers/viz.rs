use actix_web::{web, Error, HttpResponse};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;
use crate::models::view::{ChartOption, ChartTypeInfo, RenderedTable, SortState};
use crate::services::chart::{self, ChartKind};
use crate::services::selection::{AdvanceError, SelectionEffect, SelectionEvent};
use crate::services::{table, SelectionStore};

#[derive(Debug, Deserialize)]
pub struct TurnRef {
    pub turn_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub turn_id: String,
    pub chart_type: String,
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub turn_id: String,
    /// Header the user clicked.
    pub column: String,
    /// The sort currently applied, echoed back from the last rendered table.
    /// Absent on the first click, in which case the inferred default is used.
    pub current: Option<SortState>,
}

#[derive(Debug, Serialize)]
pub struct ChartTypesResponse {
    pub chart_types: Vec<ChartTypeInfo>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub success: bool,
    pub recommended: String,
    pub options: Vec<ChartOption>,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_config: Option<Value>,
    pub effects: Vec<SelectionEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_alternative: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub success: bool,
    pub effects: Vec<SelectionEffect>,
}

/// `GET /api/viz/chart-types` — the normalized chart vocabulary with display
/// metadata. Static: this is the enum source for clients.
pub async fn chart_types() -> HttpResponse {
    HttpResponse::Ok().json(ChartTypesResponse {
        chart_types: chart::catalog(),
    })
}

/// `POST /api/viz/recommend` — every chart type for the turn's table, with
/// compatibility flags and exactly one primary recommendation.
pub async fn recommend(
    body: web::Json<TurnRef>,
    selections: web::Data<SelectionStore>,
) -> Result<HttpResponse, Error> {
    let selection = match selections.get(&body.turn_id) {
        Ok(Some(selection)) => selection,
        Ok(None) => return Ok(super::not_found(offer_missing(&body.turn_id))),
        Err(e) => return Ok(super::internal_error(e.to_string())),
    };
    if !selection.chart_offered {
        return Ok(super::not_found(offer_missing(&body.turn_id)));
    }

    let (primary, options) = chart::recommend(&selection.table);
    Ok(HttpResponse::Ok().json(RecommendResponse {
        success: true,
        recommended: primary.token().to_string(),
        options,
    }))
}

/// `POST /api/viz/select` — validate the chosen type against the turn's
/// table, advance the state machine and answer with the chart config plus the
/// ordered effects (dispose-before-build on re-selection).
///
/// An incompatible choice is answered with the validation reason and a
/// suggested alternative; the selection state is left untouched so the user
/// can simply pick another type.
pub async fn select(
    body: web::Json<SelectRequest>,
    selections: web::Data<SelectionStore>,
) -> Result<HttpResponse, Error> {
    let kind = match ChartKind::from_token(&body.chart_type) {
        Some(kind) => kind,
        None => {
            return Ok(HttpResponse::BadRequest().json(crate::models::response::ErrorResponse {
                error: format!("Unknown chart type '{}'", body.chart_type),
                status_code: 400,
            }))
        }
    };

    let selection = match selections.get(&body.turn_id) {
        Ok(Some(selection)) => selection,
        Ok(None) => return Ok(super::not_found(offer_missing(&body.turn_id))),
        Err(e) => return Ok(super::internal_error(e.to_string())),
    };
    if !selection.chart_offered {
        return Ok(super::not_found(offer_missing(&body.turn_id)));
    }

    let compat = chart::validate(kind, &selection.table);
    if !compat.compatible {
        let reason = compat.reason.unwrap_or_default();
        warn!(
            "Incompatible chart selection {} for turn {}: {}",
            kind.token(),
            body.turn_id,
            reason
        );
        let error = GatewayError::IncompatibleChart {
            chart: kind.token().to_string(),
            reason,
        };
        return Ok(HttpResponse::Conflict().json(SelectResponse {
            success: false,
            chart_config: None,
            effects: vec![],
            error: Some(error.to_string()),
            suggested_alternative: Some(
                chart::suggest_alternative(&selection.table).token().to_string(),
            ),
        }));
    }

    let (_, effects) = match selections.advance(&body.turn_id, SelectionEvent::Select(kind)) {
        Ok(outcome) => outcome,
        Err(e) => return Ok(advance_failure(&body.turn_id, e)),
    };

    // validate() passed, so build cannot fail on compatibility grounds.
    let chart_config = match chart::build(kind, &selection.table) {
        Ok(config) => config,
        Err(e) => return Ok(super::error_response(&e)),
    };

    Ok(HttpResponse::Ok().json(SelectResponse {
        success: true,
        chart_config: Some(chart_config),
        effects,
        error: None,
        suggested_alternative: None,
    }))
}

/// `POST /api/viz/sort` — re-render the turn's table after a header click.
/// Clicking the active column toggles its direction; clicking a different
/// column switches to it with its type-appropriate default direction.
pub async fn sort(
    body: web::Json<SortRequest>,
    selections: web::Data<SelectionStore>,
) -> Result<HttpResponse, Error> {
    let selection = match selections.get(&body.turn_id) {
        Ok(Some(selection)) => selection,
        Ok(None) => return Ok(super::not_found(table_missing(&body.turn_id))),
        Err(e) => return Ok(super::internal_error(e.to_string())),
    };

    let current = body
        .current
        .clone()
        .unwrap_or_else(|| table::infer_sort(&selection.table));
    let next = table::toggle_sort(&selection.table, &current, &body.column);
    let rendered: RenderedTable = table::render_sorted(&selection.table, next);
    Ok(HttpResponse::Ok().json(rendered))
}

/// `POST /api/viz/rendered` — the client finished painting the chart.
pub async fn render_complete(
    body: web::Json<TurnRef>,
    selections: web::Data<SelectionStore>,
) -> Result<HttpResponse, Error> {
    let (_, effects) = match selections.advance(&body.turn_id, SelectionEvent::RenderComplete) {
        Ok(outcome) => outcome,
        Err(e) => return Ok(advance_failure(&body.turn_id, e)),
    };

    Ok(HttpResponse::Ok().json(StepResponse {
        success: true,
        effects,
    }))
}

/// `POST /api/viz/change-type` — back to the offer without choosing yet. A
/// rendered chart is disposed; the selection itself stays live.
pub async fn change_type(
    body: web::Json<TurnRef>,
    selections: web::Data<SelectionStore>,
) -> Result<HttpResponse, Error> {
    let (_, effects) = match selections.advance(&body.turn_id, SelectionEvent::ChangeType) {
        Ok(outcome) => outcome,
        Err(e) => return Ok(advance_failure(&body.turn_id, e)),
    };

    Ok(HttpResponse::Ok().json(StepResponse {
        success: true,
        effects,
    }))
}

/// `POST /api/viz/cancel` — dismiss the offer and drop the turn's selection
/// state. Idempotent: cancelling an unknown or expired turn succeeds quietly.
pub async fn cancel(
    body: web::Json<TurnRef>,
    selections: web::Data<SelectionStore>,
) -> Result<HttpResponse, Error> {
    let effects = match selections.advance(&body.turn_id, SelectionEvent::Cancel) {
        Ok((_, effects)) => effects,
        Err(e @ AdvanceError::Lock) => return Ok(super::internal_error(e.to_string())),
        Err(_) => vec![],
    };

    if let Err(e) = selections.remove(&body.turn_id) {
        return Ok(super::internal_error(e.to_string()));
    }

    Ok(HttpResponse::Ok().json(StepResponse {
        success: true,
        effects,
    }))
}

fn offer_missing(turn_id: &str) -> String {
    format!(
        "No chart offer for turn {} (it may have expired)",
        turn_id
    )
}

fn table_missing(turn_id: &str) -> String {
    format!(
        "No stored table for turn {} (it may have expired)",
        turn_id
    )
}

fn advance_failure(turn_id: &str, error: AdvanceError) -> HttpResponse {
    match &error {
        AdvanceError::NoSelection(_) => super::not_found(offer_missing(turn_id)),
        AdvanceError::Transition(_) => conflict(error.to_string()),
        AdvanceError::Lock => super::internal_error(error.to_string()),
    }
}

fn conflict(message: String) -> HttpResponse {
    HttpResponse::Conflict().json(crate::models::response::ErrorResponse {
        error: message,
        status_code: 409,
    })
}

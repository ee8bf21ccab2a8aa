//! Axum route handler for the Analysis API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::analysis::service::{analyze_ticket, validate_ticket, AnalysisRequest, AnalysisResult};
use crate::errors::AppError;
use crate::session::Session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub ticket: Option<String>,
}

/// POST /analyze
///
/// Validates the ticket, consumes the session's pending documentation (if any),
/// and returns either the full analysis or `{"error": ...}`. Only a too-short
/// ticket is a 400; model and provider failures are reported in a 200 body.
/// A body that is not JSON, or whose `ticket` is not a string, counts as no
/// ticket at all.
pub async fn handle_analyze(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let ticket_text = match payload {
        Ok(Json(request)) => request.ticket.unwrap_or_default(),
        Err(rejection) => {
            debug!("Unreadable analyze body: {rejection}");
            String::new()
        }
    };
    validate_ticket(&ticket_text).map_err(|msg| AppError::Validation(msg.to_string()))?;

    let documentation_text = if session.is_new {
        String::new()
    } else {
        state.uploads.consume(&session.id).await
    };

    let request = AnalysisRequest {
        ticket_text,
        documentation_text,
    };
    Ok(Json(analyze_ticket(&request, state.llm.as_ref()).await))
}

//! Ticket Analysis — orchestrates one analysis request.
//!
//! Flow: validate → build prompt → complete → coerce → respond.
//!
//! Every failure after validation collapses into `AnalysisResult::Error` carrying
//! the same generic message, whether the provider failed or the model produced
//! unusable output. Details go to the log only.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::analysis::coercion::coerce_response;
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::schema::ANALYSIS_SCHEMA;
use crate::llm_client::CompletionClient;

/// Minimum trimmed ticket length, in characters.
pub const MIN_TICKET_CHARS: usize = 20;

pub const TICKET_TOO_SHORT: &str =
    "Please provide a JIRA ticket description of at least 20 characters.";

pub const ANALYSIS_FAILED: &str = "Failed to get a valid analysis from the AI model. \
    The model might be temporarily unavailable or the request was malformed. Please try again.";

/// One analysis call: the ticket plus any documentation consumed for it.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub ticket_text: String,
    pub documentation_text: String,
}

/// Either a schema-conforming analysis or a single error message. Never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Error { error: String },
    Analysis(Value),
}

impl AnalysisResult {
    pub fn error(message: &str) -> Self {
        AnalysisResult::Error {
            error: message.to_string(),
        }
    }

    /// Wraps a validated analysis. A top-level `error` key is dropped so a
    /// success body can never be mistaken for a failure.
    pub fn analysis(mut value: Value) -> Self {
        if let Some(object) = value.as_object_mut() {
            if object.remove("error").is_some() {
                warn!("Dropped `error` key from model output");
            }
        }
        AnalysisResult::Analysis(value)
    }
}

/// Rejects tickets shorter than `MIN_TICKET_CHARS` once trimmed.
pub fn validate_ticket(ticket_text: &str) -> Result<(), &'static str> {
    if ticket_text.trim().chars().count() < MIN_TICKET_CHARS {
        Err(TICKET_TOO_SHORT)
    } else {
        Ok(())
    }
}

/// Runs build → complete → coerce for an already-validated request.
pub async fn analyze_ticket(
    request: &AnalysisRequest,
    llm: &dyn CompletionClient,
) -> AnalysisResult {
    info!(
        "Analyzing ticket: ticket_chars={}, documentation_chars={}, model={}",
        request.ticket_text.chars().count(),
        request.documentation_text.chars().count(),
        llm.model()
    );

    let prompt = build_analysis_prompt(&request.ticket_text, &request.documentation_text);

    let completion = match llm.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            error!("Completion failed: {e}");
            return AnalysisResult::error(ANALYSIS_FAILED);
        }
    };

    match coerce_response(&completion, ANALYSIS_SCHEMA) {
        Ok(analysis) => {
            info!("Analysis completed");
            AnalysisResult::analysis(analysis)
        }
        Err(e) => {
            warn!("Model output rejected: {e}");
            AnalysisResult::error(ANALYSIS_FAILED)
        }
    }
}

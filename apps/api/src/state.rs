use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::uploads::store::UploadStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable completion backend. Default: `GeminiClient`.
    pub llm: Arc<dyn CompletionClient>,
    /// Pending documentation uploads, keyed by session.
    pub uploads: UploadStore,
    pub config: Config,
}

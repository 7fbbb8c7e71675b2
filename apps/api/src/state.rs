use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::voice::VoiceProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Voice provider client behind a trait so handlers and the webhook
    /// reconciler can be exercised against a fake.
    pub voice: Arc<dyn VoiceProvider>,
    pub config: Config,
}

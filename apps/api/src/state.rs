use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::auth::SupabaseAuth;
use crate::bloom::BloomClassifier;
use crate::cache::KeyValueStore;
use crate::config::Config;
use crate::guidance::GuidanceEngine;
use crate::session::SessionKeys;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Session revocations, OAuth flows and test-drive data (Redis).
    pub cache: Arc<dyn KeyValueStore>,
    /// Archive of uploaded sheets.
    pub s3: S3Client,
    pub config: Config,
    pub auth: SupabaseAuth,
    /// Built once at startup; holds the vector index in memory.
    pub guidance: Arc<GuidanceEngine>,
    pub classifier: Arc<dyn BloomClassifier>,
    pub sessions: SessionKeys,
}

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use compass::auth::SupabaseAuth;
use compass::bloom::{HostedBloomClassifier, LabelMap};
use compass::cache::RedisStore;
use compass::config::Config;
use compass::db::create_pool;
use compass::guidance::GuidanceEngine;
use compass::llm_client;
use compass::routes::build_router;
use compass::session::SessionKeys;
use compass::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Compass API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = Arc::new(RedisStore::new(redis));
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Student records + vector index (built from the research paper on first run)
    let guidance = Arc::new(GuidanceEngine::from_config(&config.guidance).await?);
    info!("Guidance engine ready (model: {})", llm_client::MODEL);

    let labels = LabelMap::load(&config.classifier.label_map_path)?;
    let classifier = Arc::new(HostedBloomClassifier::new(
        config.classifier.model_url.clone(),
        config.classifier.hf_api_token.clone(),
        labels,
    ));
    info!("Bloom classifier initialized");

    let auth = SupabaseAuth::new(&config.supabase);
    let sessions = SessionKeys::new(&config.session.secret, config.session.ttl_hours);

    // Build app state
    let state = AppState {
        db,
        cache,
        s3,
        config: config.clone(),
        auth,
        guidance,
        classifier,
        sessions,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "compass-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub supabase: SupabaseConfig,
    pub guidance: GuidanceConfig,
    pub classifier: ClassifierConfig,
    pub session: SessionConfig,
    pub admin: AdminCredentials,
    pub public_base_url: String,
    pub public_teacher_id: i64,
    pub student_email_domain: String,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
}

/// Everything the guidance engine needs. Loadable on its own for the CLI.
#[derive(Debug, Clone)]
pub struct GuidanceConfig {
    pub groq_api_key: String,
    pub groq_api_url: String,
    pub hf_api_token: String,
    pub embedding_api_url: String,
    pub student_data_path: PathBuf,
    pub research_paper_path: PathBuf,
    pub vector_index_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub model_url: String,
    pub hf_api_token: String,
    pub label_map_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            supabase: SupabaseConfig::from_env()?,
            guidance: GuidanceConfig::from_env()?,
            classifier: ClassifierConfig::from_env()?,
            session: SessionConfig::from_env()?,
            admin: AdminCredentials {
                username: require_env("ADMIN_USERNAME")?,
                password: require_env("ADMIN_PASSWORD")?,
            },
            public_base_url: env_or("PUBLIC_BASE_URL", &format!("http://localhost:{port}")),
            public_teacher_id: env_or("PUBLIC_TEACHER_ID", "7")
                .parse()
                .context("PUBLIC_TEACHER_ID must be an integer")?,
            student_email_domain: env_or("STUDENT_EMAIL_DOMAIN", "mit-university.edu"),
            port,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(SupabaseConfig {
            url: require_env("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            service_key: require_env("SUPABASE_SERVICE_KEY")?,
        })
    }
}

impl GuidanceConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(GuidanceConfig {
            groq_api_key: require_env("GROQ_API_KEY")?,
            groq_api_url: env_or("GROQ_API_URL", crate::llm_client::GROQ_API_URL),
            hf_api_token: require_env("HF_API_TOKEN")?,
            embedding_api_url: env_or(
                "EMBEDDING_API_URL",
                crate::rag::embedder::DEFAULT_EMBEDDING_URL,
            ),
            student_data_path: env_or("STUDENT_DATA_PATH", "data/student_profiles.csv").into(),
            research_paper_path: env_or("RESEARCH_PAPER_PATH", "data/research_paper.pdf").into(),
            vector_index_path: env_or("VECTOR_INDEX_PATH", "embeddings/index").into(),
        })
    }
}

impl ClassifierConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(ClassifierConfig {
            model_url: require_env("BLOOM_MODEL_URL")?,
            hf_api_token: require_env("HF_API_TOKEN")?,
            label_map_path: env_or(
                "BLOOM_LABEL_MAP_PATH",
                "models/bloom/label_mappings.json",
            )
            .into(),
        })
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self> {
        Ok(SessionConfig {
            secret: require_env("SESSION_SECRET")?,
            ttl_hours: env_or("SESSION_TTL_HOURS", "12")
                .parse()
                .context("SESSION_TTL_HOURS must be an integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

//! Sentence embeddings for retrieval.
//!
//! The index and the chain depend on the `Embedder` trait only; the hosted
//! feature-extraction endpoint is the production backend.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

pub const EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_URL: &str = "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction";
const BATCH_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding API returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifies the model so persisted indexes can detect a model change.
    fn model(&self) -> &str;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }
}

/// Hosted feature-extraction backend for `all-MiniLM-L6-v2`.
#[derive(Clone)]
pub struct HostedEmbedder {
    client: Client,
    url: String,
    api_token: String,
}

impl HostedEmbedder {
    pub fn new(url: String, api_token: String) -> Self {
        Self {
            client: Client::new(),
            url,
            api_token,
        }
    }
}

#[async_trait]
impl Embedder for HostedEmbedder {
    fn model(&self) -> &str {
        EMBEDDING_MODEL
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let response = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_token)
                .json(&json!({
                    "inputs": batch,
                    "options": {"wait_for_model": true}
                }))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(EmbedError::Api {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
            }

            let batch_vectors: Vec<Vec<f32>> = response.json().await?;
            if batch_vectors.len() != batch.len() {
                return Err(EmbedError::CountMismatch {
                    expected: batch.len(),
                    got: batch_vectors.len(),
                });
            }
            vectors.extend(batch_vectors);
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_embed_batch_posts_inputs() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/embed")
                .header("authorization", "Bearer hf-token")
                .json_body(json!({
                    "inputs": ["python", "sql"],
                    "options": {"wait_for_model": true}
                }));
            then.status(200).json_body(json!([[0.1, 0.2], [0.3, 0.4]]));
        });

        let embedder = HostedEmbedder::new(server.url("/embed"), "hf-token".to_string());
        let vectors = embedder
            .embed_batch(&["python".to_string(), "sql".to_string()])
            .await
            .unwrap();

        mock.assert();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).json_body(json!([[0.1, 0.2]]));
        });

        let embedder = HostedEmbedder::new(server.url("/embed"), "t".to_string());
        let err = embedder
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EmbedError::CountMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/embed");
            then.status(503).body("loading");
        });

        let embedder = HostedEmbedder::new(server.url("/embed"), "t".to_string());
        let err = embedder.embed("a").await.unwrap_err();
        assert!(matches!(err, EmbedError::Api { status: 503, .. }));
    }
}

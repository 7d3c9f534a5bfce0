use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::embedder::{EmbedError, Embedder};
use super::index::VectorIndex;
use crate::llm_client::prompts::retrieval_qa_system;
use crate::llm_client::{LlmClient, LlmError};

/// Number of chunks stuffed into the prompt.
pub const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Retrieval failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("Generation failed: {0}")]
    Llm(#[from] LlmError),
}

/// "Stuff" retrieval QA: embed the question, take the top-k chunks, put them
/// all in the system prompt, and ask the model the question verbatim.
pub struct RetrievalQa {
    llm: LlmClient,
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    top_k: usize,
}

impl RetrievalQa {
    pub fn new(llm: LlmClient, embedder: Arc<dyn Embedder>, index: VectorIndex) -> Self {
        Self {
            llm,
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub async fn invoke(&self, question: &str) -> Result<String, ChainError> {
        let query = self.embedder.embed(question).await?;
        let hits = self.index.search(&query, self.top_k);
        debug!(
            "Retrieved {} chunks (pages {:?})",
            hits.len(),
            hits.iter().map(|h| h.document.page).collect::<Vec<_>>()
        );

        let context = hits
            .iter()
            .map(|h| h.document.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(self
            .llm
            .complete(question, &retrieval_qa_system(&context))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::index::IndexedChunk;
    use crate::rag::Document;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::json;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model(&self) -> &str {
            "fixed"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[tokio::test]
    async fn test_invoke_stuffs_retrieved_context() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Climbers thrive in senior roles")
                .body_contains("Which roles?");
            then.status(200)
                .json_body(json!({"choices": [{"message": {"content": "1. CTO"}}]}));
        });

        let index = VectorIndex {
            model: "fixed".to_string(),
            chunks: vec![
                IndexedChunk {
                    document: Document {
                        text: "Climbers thrive in senior roles".to_string(),
                        page: 2,
                    },
                    embedding: vec![1.0, 0.0],
                },
                IndexedChunk {
                    document: Document {
                        text: "unrelated".to_string(),
                        page: 3,
                    },
                    embedding: vec![0.0, 1.0],
                },
            ],
        };
        let llm = LlmClient::with_base_url("k".to_string(), server.base_url()).unwrap();
        let chain = RetrievalQa::new(llm, Arc::new(FixedEmbedder), index);

        let answer = chain.invoke("Which roles?").await.unwrap();
        assert_eq!(answer, "1. CTO");
        mock.assert();
    }
}

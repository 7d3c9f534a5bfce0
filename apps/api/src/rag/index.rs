//! Flat in-memory vector index persisted as JSON.
//!
//! The corpus is one research paper, so a linear cosine scan is all the
//! search this needs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::embedder::{EmbedError, Embedder};
use super::loader::{load_and_split, LoadError};
use super::splitter::TextSplitter;
use super::Document;

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub document: Document,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    pub model: String,
    pub chunks: Vec<IndexedChunk>,
}

/// A retrieved chunk and its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

impl VectorIndex {
    pub fn empty(model: &str) -> Self {
        Self {
            model: model.to_string(),
            chunks: Vec::new(),
        }
    }

    pub async fn from_documents(
        documents: Vec<Document>,
        embedder: &dyn Embedder,
    ) -> Result<Self, IndexError> {
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        Ok(Self {
            model: embedder.model().to_string(),
            chunks: documents
                .into_iter()
                .zip(embeddings)
                .map(|(document, embedding)| IndexedChunk {
                    document,
                    embedding,
                })
                .collect(),
        })
    }

    /// Loads the index in `dir` if one exists for the embedder's model,
    /// otherwise builds one from the PDF at `paper` and saves it to `dir`.
    pub async fn load_or_build(
        dir: &Path,
        paper: &Path,
        embedder: &dyn Embedder,
    ) -> Result<Self, IndexError> {
        let file = index_file(dir);
        if file.exists() {
            let index = Self::load(dir)?;
            if index.model == embedder.model() {
                info!(
                    "Loaded vector index from {} ({} chunks)",
                    file.display(),
                    index.chunks.len()
                );
                return Ok(index);
            }
            info!(
                "Vector index at {} was built with {}, rebuilding for {}",
                file.display(),
                index.model,
                embedder.model()
            );
        }

        info!("Building vector index from {}...", paper.display());
        let documents = load_and_split(paper, &TextSplitter::default())?;
        let index = Self::from_documents(documents, embedder).await?;
        index.save(dir)?;
        info!(
            "Vector index built and saved to {} ({} chunks)",
            file.display(),
            index.chunks.len()
        );
        Ok(index)
    }

    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let raw = std::fs::read_to_string(index_file(dir))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, dir: &Path) -> Result<(), IndexError> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(index_file(dir), serde_json::to_vec(self)?)?;
        Ok(())
    }

    /// The `k` chunks most similar to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredDocument> {
        let mut scored: Vec<ScoredDocument> = self
            .chunks
            .iter()
            .map(|chunk| ScoredDocument {
                document: chunk.document.clone(),
                score: cosine_similarity(query, &chunk.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }
}

fn index_file(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// Retrieval-augmented generation plumbing for the guidance engine.
// Load the research paper, chunk it, embed the chunks, search by cosine
// similarity, and stuff the hits into a single chat call.

pub mod chain;
pub mod embedder;
pub mod index;
pub mod loader;
pub mod splitter;

pub use chain::RetrievalQa;
pub use embedder::{Embedder, HostedEmbedder};
pub use index::VectorIndex;

/// A piece of text with the page it came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    pub text: String,
    pub page: usize,
}

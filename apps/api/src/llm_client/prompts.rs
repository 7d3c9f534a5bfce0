// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt of the retrieval QA "stuff" chain.
/// Replace `{context}` with the retrieved chunks joined by blank lines.
pub const RETRIEVAL_QA_SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question. \n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n\
{context}";

/// Fills the retrieval QA system prompt with retrieved context.
pub fn retrieval_qa_system(context: &str) -> String {
    RETRIEVAL_QA_SYSTEM_TEMPLATE.replace("{context}", context)
}

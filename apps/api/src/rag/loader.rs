use std::path::Path;

use thiserror::Error;
use tracing::info;

use super::splitter::TextSplitter;
use super::Document;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Research paper not found: {0}")]
    NotFound(String),

    #[error("Failed to extract text from PDF: {0}")]
    Extract(String),
}

/// Extracts the text of a PDF, one document per non-empty page.
pub fn load_pdf(path: &Path) -> Result<Vec<Document>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }

    let text = pdf_extract::extract_text(path).map_err(|e| LoadError::Extract(e.to_string()))?;
    let pages = split_pages(&text);
    info!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// Loads a PDF and splits every page into chunks.
pub fn load_and_split(path: &Path, splitter: &TextSplitter) -> Result<Vec<Document>, LoadError> {
    let pages = load_pdf(path)?;
    Ok(splitter.split_documents(&pages))
}

/// pdf-extract separates pages with form feeds.
fn split_pages(text: &str) -> Vec<Document> {
    text.split('\u{c}')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| Document {
            text: page.trim().to_string(),
            page: i + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_keeps_page_numbers() {
        let docs = split_pages("first page\u{c}\u{c}third page\u{c}  ");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].page, 1);
        assert_eq!(docs[1].page, 3);
        assert_eq!(docs[1].text, "third page");
    }

    #[test]
    fn test_missing_pdf_is_reported() {
        let err = load_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }
}

//! Recursive character splitter.
//!
//! Tries the coarsest separator first (paragraphs, then lines, then words,
//! then single characters) and greedily packs pieces into chunks of at most
//! `chunk_size` characters, carrying up to `chunk_overlap` characters of
//! trailing context into the next chunk.

use super::Document;

pub const DEFAULT_CHUNK_SIZE: usize = 4000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size),
        }
    }

    pub fn split_documents(&self, docs: &[Document]) -> Vec<Document> {
        docs.iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .map(|text| Document {
                        text,
                        page: doc.page,
                    })
            })
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text; "" always matches.
        let position = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut good: Vec<String> = Vec::new();

        for piece in splits {
            if char_len(&piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                chunks.extend(self.merge_splits(&good, separator));
                good.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good.is_empty() {
            chunks.extend(self.merge_splits(&good, separator));
        }

        chunks
    }

    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.chunk_size {
                if !current.is_empty() {
                    push_joined(&mut docs, &current, separator);

                    // Drop from the front until the carry-over fits the overlap budget.
                    while total > self.chunk_overlap
                        || (total > 0
                            && total + len + if current.is_empty() { 0 } else { sep_len }
                                > self.chunk_size)
                    {
                        let first = current.remove(0);
                        let first_joiner = if current.is_empty() { 0 } else { sep_len };
                        total -= char_len(first) + first_joiner;
                    }
                }
            }

            current.push(piece);
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }

        push_joined(&mut docs, &current, separator);
        docs
    }
}

fn push_joined(docs: &mut Vec<String>, current: &[&str], separator: &str) {
    let doc = current.join(separator);
    let doc = doc.trim();
    if !doc.is_empty() {
        docs.push(doc.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split_text("Adversity quotient predicts resilience.");
        assert_eq!(chunks, vec!["Adversity quotient predicts resilience."]);
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let splitter = TextSplitter::new(20, 5);
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let chunks = splitter.split_text(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn test_chunks_overlap() {
        let splitter = TextSplitter::new(20, 10);
        let chunks = splitter.split_text("alpha beta gamma delta epsilon zeta eta theta");
        // "alpha beta gamma" then "beta gamma delta ..."; the tail is carried over.
        assert_eq!(chunks[0], "alpha beta gamma");
        assert!(chunks[1].starts_with("beta gamma"));
    }

    #[test]
    fn test_paragraphs_split_before_words() {
        let splitter = TextSplitter::new(30, 0);
        let chunks = splitter.split_text("first paragraph here\n\nsecond paragraph here");
        assert_eq!(chunks, vec!["first paragraph here", "second paragraph here"]);
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 0);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_split_documents_keeps_page() {
        let splitter = TextSplitter::new(10, 0);
        let docs = splitter.split_documents(&[Document {
            text: "aaaa bbbb cccc".to_string(),
            page: 4,
        }]);
        assert!(docs.len() >= 2);
        assert!(docs.iter().all(|d| d.page == 4));
    }
}

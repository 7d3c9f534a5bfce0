use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use super::levels::BloomLevel;

/// Class id to label mapping shipped next to the fine-tuned model.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    id2label: BTreeMap<usize, String>,
}

#[derive(Deserialize)]
struct LabelMappingsFile {
    id2label: BTreeMap<String, String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self {
            id2label: BloomLevel::ALL
                .iter()
                .enumerate()
                .map(|(i, level)| (i, level.code().to_string()))
                .collect(),
        }
    }
}

impl LabelMap {
    /// Reads `label_mappings.json`. A missing file yields the L1..L6 default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Label mappings not found at {}, using L1..L6",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let map = Self::from_json(&raw)
            .with_context(|| format!("Invalid label mappings in {}", path.display()))?;
        info!("Loaded {} Bloom labels", map.id2label.len());
        Ok(map)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: LabelMappingsFile = serde_json::from_str(raw)?;
        let id2label = file
            .id2label
            .into_iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|id| (id, label))
                    .with_context(|| format!("Class id '{id}' is not an integer"))
            })
            .collect::<Result<_>>()?;
        Ok(Self { id2label })
    }

    /// Labels in class-id order.
    pub fn labels(&self) -> Vec<&str> {
        self.id2label.values().map(String::as_str).collect()
    }

    /// Resolves `LABEL_n` through the id map; labels already in the map pass through.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        if let Some(id) = raw.strip_prefix("LABEL_").and_then(|n| n.parse::<usize>().ok()) {
            return self.id2label.get(&id).cloned();
        }
        self.id2label.values().find(|label| label.as_str() == raw).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_l1_to_l6() {
        let map = LabelMap::default();
        assert_eq!(map.labels(), vec!["L1", "L2", "L3", "L4", "L5", "L6"]);
    }

    #[test]
    fn test_resolve_index_and_direct_labels() {
        let map = LabelMap::from_json(r#"{"id2label": {"0": "L1", "1": "L2", "10": "L6"}}"#).unwrap();
        assert_eq!(map.resolve("LABEL_1").as_deref(), Some("L2"));
        assert_eq!(map.resolve("LABEL_10").as_deref(), Some("L6"));
        assert_eq!(map.resolve("L1").as_deref(), Some("L1"));
        assert_eq!(map.resolve("LABEL_4"), None);
        assert_eq!(map.resolve("L9"), None);
    }

    #[test]
    fn test_non_integer_ids_are_rejected() {
        assert!(LabelMap::from_json(r#"{"id2label": {"zero": "L1"}}"#).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let map = LabelMap::load(Path::new("/no/such/label_mappings.json")).unwrap();
        assert_eq!(map, LabelMap::default());
    }
}

use serde::{Deserialize, Serialize};

/// Bloom's taxonomy cognitive levels, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloomLevel {
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
}

impl BloomLevel {
    pub const ALL: [BloomLevel; 6] = [
        BloomLevel::L1,
        BloomLevel::L2,
        BloomLevel::L3,
        BloomLevel::L4,
        BloomLevel::L5,
        BloomLevel::L6,
    ];

    pub fn code(self) -> &'static str {
        match self {
            BloomLevel::L1 => "L1",
            BloomLevel::L2 => "L2",
            BloomLevel::L3 => "L3",
            BloomLevel::L4 => "L4",
            BloomLevel::L5 => "L5",
            BloomLevel::L6 => "L6",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BloomLevel::L1 => "Remembering",
            BloomLevel::L2 => "Understanding",
            BloomLevel::L3 => "Applying",
            BloomLevel::L4 => "Analyzing",
            BloomLevel::L5 => "Evaluating",
            BloomLevel::L6 => "Creating",
        }
    }

    /// The thinking skill a level exercises, as shown on reports.
    pub fn skill(self) -> &'static str {
        match self {
            BloomLevel::L1 => "Remembrance",
            BloomLevel::L2 => "Inference",
            BloomLevel::L3 => "Solution-finding",
            BloomLevel::L4 => "Reasoning",
            BloomLevel::L5 => "Judgment",
            BloomLevel::L6 => "Abstract reasoning",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code().eq_ignore_ascii_case(code.trim()))
    }

    /// "L3: Applying"
    pub fn label(self) -> String {
        format!("{}: {}", self.code(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_accepts_any_case() {
        assert_eq!(BloomLevel::from_code("l4"), Some(BloomLevel::L4));
        assert_eq!(BloomLevel::from_code(" L6 "), Some(BloomLevel::L6));
        assert_eq!(BloomLevel::from_code("L7"), None);
    }

    #[test]
    fn test_label() {
        assert_eq!(BloomLevel::L2.label(), "L2: Understanding");
    }
}

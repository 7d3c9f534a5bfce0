//! Skill vocabulary and fuzzy correction of user-entered skills.

use std::collections::BTreeSet;

/// Minimum normalised similarity for a catalog entry to replace a typed skill.
pub const MATCH_CUTOFF: f64 = 0.7;

/// Every skill seen in the student records, capitalised and sorted.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    skills: Vec<String>,
    lowered: Vec<String>,
}

impl SkillCatalog {
    /// Builds the catalog from raw "Final Skills" cells such as `['Python', 'SQL']`.
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let set: BTreeSet<String> = cells.into_iter().flat_map(parse_skill_cell).collect();
        let skills: Vec<String> = set.into_iter().collect();
        let lowered = skills.iter().map(|s| s.to_lowercase()).collect();
        Self { skills, lowered }
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Closest catalog entry (lower-cased) scoring at least `MATCH_CUTOFF`.
    pub fn closest(&self, skill: &str) -> Option<&str> {
        let needle = skill.to_lowercase();
        let mut best: Option<(&str, f64)> = None;
        for candidate in &self.lowered {
            let score = strsim::normalized_levenshtein(&needle, candidate);
            if score < MATCH_CUTOFF {
                continue;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate.as_str(), score));
            }
        }
        best.map(|(c, _)| c)
    }

    /// Replaces each skill with its closest catalog entry, capitalised.
    /// Unmatched skills are kept, capitalised. Order and length are preserved.
    pub fn correct(&self, skills: &[String]) -> Vec<String> {
        skills
            .iter()
            .map(|skill| match self.closest(skill) {
                Some(matched) => capitalize(matched),
                None => capitalize(skill),
            })
            .collect()
    }
}

/// Splits one list-ish cell into capitalised skill names.
pub fn parse_skill_cell(cell: &str) -> Vec<String> {
    let trimmed = |c: char| c.is_whitespace() || matches!(c, '[' | ']' | '\'' | '"');
    cell.trim_matches(trimmed)
        .split(',')
        .map(|s| s.trim_matches(trimmed))
        .filter(|s| !s.is_empty())
        .map(capitalize)
        .collect()
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SkillCatalog {
        SkillCatalog::from_cells([
            "['Python Programming', 'Machine Learning Algorithms']",
            "['C#', 'Unity', 'Blender']",
            "['Backup Software', 'Data Management', 'python programming']",
            "",
        ])
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("machine LEARNING"), "Machine learning");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("c#"), "C#");
    }

    #[test]
    fn test_parse_skill_cell_strips_list_syntax() {
        assert_eq!(
            parse_skill_cell("['C#', 'Unity', 'Blender']"),
            vec!["C#", "Unity", "Blender"]
        );
        assert_eq!(parse_skill_cell("SQL, Excel ,"), vec!["Sql", "Excel"]);
        assert!(parse_skill_cell("[]").is_empty());
    }

    #[test]
    fn test_catalog_is_deduplicated_and_sorted() {
        let catalog = catalog();
        assert_eq!(
            catalog.skills(),
            &[
                "Backup software",
                "Blender",
                "C#",
                "Data management",
                "Machine learning algorithms",
                "Python programming",
                "Unity",
            ]
        );
    }

    #[test]
    fn test_correct_fixes_typos() {
        let corrected = catalog().correct(&["Pyhton Programing".to_string()]);
        assert_eq!(corrected, vec!["Python programming"]);
    }

    #[test]
    fn test_correct_keeps_unknown_skills_capitalised() {
        let corrected = catalog().correct(&["kubernetes".to_string(), "unity".to_string()]);
        assert_eq!(corrected, vec!["Kubernetes", "Unity"]);
    }

    #[test]
    fn test_empty_catalog_matches_nothing() {
        let catalog = SkillCatalog::default();
        assert!(catalog.closest("python").is_none());
        assert_eq!(catalog.correct(&["sql".to_string()]), vec!["Sql"]);
    }
}

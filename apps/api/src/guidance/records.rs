use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// One row of the placement sheet the engine learns vocabulary and known
/// roles from. Other columns in the sheet are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "Enrollment Number", default)]
    pub enrollment_number: String,
    #[serde(rename = "Final Skills", default)]
    pub final_skills: Option<String>,
    #[serde(rename = "Suggested Role", default)]
    pub suggested_role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentRecords {
    rows: Vec<StudentRecord>,
}

impl StudentRecords {
    pub fn new(rows: Vec<StudentRecord>) -> Self {
        Self { rows }
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading student records from {}...", path.display());
        if !path.exists() {
            anyhow::bail!("Student data file not found: {}", path.display());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let rows = reader
            .deserialize()
            .collect::<Result<Vec<StudentRecord>, _>>()
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!("Loaded {} student records", rows.len());
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[StudentRecord] {
        &self.rows
    }

    /// Non-empty "Final Skills" cells.
    pub fn skill_cells(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(|r| r.final_skills.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Trimmed suggested role of the first row with this enrollment number.
    pub fn suggested_role(&self, enrollment: &str) -> Option<String> {
        self.rows
            .iter()
            .find(|r| r.enrollment_number == enrollment)
            .and_then(|r| r.suggested_role.as_deref())
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sheet(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_reads_known_columns() {
        let file = write_sheet(
            "Enrollment Number,Name,Final Skills,Suggested Role\n\
             MITU23BTCS001,Asha,\"['Python', 'SQL']\", Data Analyst \n\
             MITU23BTCS002,Ravi,,\n",
        );
        let records = StudentRecords::load(file.path()).unwrap();

        assert_eq!(records.rows().len(), 2);
        assert_eq!(records.skill_cells().collect::<Vec<_>>(), vec!["['Python', 'SQL']"]);
        assert_eq!(
            records.suggested_role("MITU23BTCS001").as_deref(),
            Some("Data Analyst")
        );
        assert_eq!(records.suggested_role("MITU23BTCS002"), None);
        assert_eq!(records.suggested_role("unknown"), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = StudentRecords::load(Path::new("/no/such/sheet.csv")).unwrap_err();
        assert!(err.to_string().contains("Student data file not found"));
    }
}

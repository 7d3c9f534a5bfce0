//! Bulk student account creation from an uploaded roster sheet.

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{AuthError, SupabaseAuth};
use crate::uploads::SheetTable;

/// Auth accounts need at least this many password characters.
pub const MIN_PASSWORD_LEN: usize = 6;
const PASSWORD_PADDING: &str = "123";

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("File Error: missing column '{0}'")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// As written in the sheet, spaces included.
    pub enrollment_no: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub already_registered: usize,
    pub failed: usize,
}

/// `<enrollment without spaces>@<domain>`
pub fn roster_email(enrollment_no: &str, domain: &str) -> String {
    format!("{}@{domain}", enrollment_no.replace(' ', ""))
}

/// Spreadsheet exports turn numeric passwords into `12345.0`; those are read
/// back as integers. Short passwords are padded. Blank cells yield `None`.
pub fn normalize_password(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut password = match raw.split_once('.') {
        Some((whole, frac))
            if !whole.is_empty()
                && whole.chars().all(|c| c.is_ascii_digit())
                && !frac.is_empty()
                && frac.chars().all(|c| c == '0') =>
        {
            whole.to_string()
        }
        _ => raw.to_string(),
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        password.push_str(PASSWORD_PADDING);
    }
    Some(password)
}

/// Rows without an enrollment number or password are skipped.
pub fn parse_roster(table: &SheetTable, email_domain: &str) -> Result<Vec<RosterEntry>, RosterError> {
    let column = |name: &'static str| table.column(name).ok_or(RosterError::MissingColumn(name));
    let enrollment_col = column("enrollment_no")?;
    let password_col = column("password")?;

    let mut entries = Vec::new();
    for row in &table.rows {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        let enrollment_no = cell(enrollment_col).trim().to_string();
        let Some(password) = normalize_password(cell(password_col)) else {
            continue;
        };
        if enrollment_no.is_empty() {
            continue;
        }

        entries.push(RosterEntry {
            email: roster_email(&enrollment_no, email_domain),
            enrollment_no,
            password,
        });
    }
    Ok(entries)
}

/// Creates confirmed accounts one by one. Existing accounts are skipped
/// quietly; other failures are logged and skipped.
pub async fn import_roster(auth: &SupabaseAuth, entries: &[RosterEntry], teacher_id: i64) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for entry in entries {
        let metadata = json!({
            "enrollment_no": entry.enrollment_no,
            "role": "student",
            "teacher_id": teacher_id,
        });
        match auth
            .admin_create_user(&entry.email, &entry.password, metadata)
            .await
        {
            Ok(_) => summary.created += 1,
            Err(AuthError::AlreadyRegistered) => summary.already_registered += 1,
            Err(e) => {
                warn!("Failed on {}: {e}", entry.enrollment_no);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Roster import for teacher {teacher_id}: {} created, {} existing, {} failed",
        summary.created, summary.already_registered, summary.failed
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_normalize_password() {
        assert_eq!(normalize_password("123456.0").as_deref(), Some("123456"));
        assert_eq!(normalize_password("12.0").as_deref(), Some("12123"));
        assert_eq!(normalize_password("12.5").as_deref(), Some("12.5123"));
        assert_eq!(normalize_password(" abc ").as_deref(), Some("abc123"));
        assert_eq!(normalize_password("secret99").as_deref(), Some("secret99"));
        assert_eq!(normalize_password("   "), None);
    }

    #[test]
    fn test_roster_email_strips_spaces() {
        assert_eq!(
            roster_email("MITU23 BTCSD015", "mit-university.edu"),
            "MITU23BTCSD015@mit-university.edu"
        );
    }

    fn expected_roster() -> Vec<RosterEntry> {
        vec![
            RosterEntry {
                enrollment_no: "MITU23 BTCSD015".to_string(),
                email: "MITU23BTCSD015@mit-university.edu".to_string(),
                password: "98765123".to_string(),
            },
            RosterEntry {
                enrollment_no: "MITU23BTCSD017".to_string(),
                email: "MITU23BTCSD017@mit-university.edu".to_string(),
                password: "pw123".to_string(),
            },
        ]
    }

    #[test]
    fn test_parse_roster_skips_blank_passwords() {
        let csv = b" enrollment_no , password \nMITU23 BTCSD015,98765.0\nMITU23BTCSD016,\nMITU23BTCSD017,pw\n";
        let table = SheetTable::from_csv(csv).unwrap();
        assert_eq!(parse_roster(&table, "mit-university.edu").unwrap(), expected_roster());
    }

    #[test]
    fn test_parse_roster_from_workbook() {
        // numeric password cell, blank password cell
        let raw = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/roster.xlsx"));
        let table = SheetTable::from_xlsx(raw).unwrap();
        assert_eq!(parse_roster(&table, "mit-university.edu").unwrap(), expected_roster());
    }

    #[test]
    fn test_parse_roster_requires_columns() {
        let table = SheetTable::from_csv(b"enrollment_no,pass\nA,1\n").unwrap();
        let err = parse_roster(&table, "x.edu").unwrap_err();
        assert!(matches!(err, RosterError::MissingColumn("password")));
    }

    #[tokio::test]
    async fn test_import_counts_outcomes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/admin/users")
                .body_contains("A@x.edu");
            then.status(200)
                .json_body(json!({"id": "5b0c7f0e-8a7d-4c61-9d8c-1f1e2a3b4c5d", "email": "A@x.edu"}));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/admin/users")
                .body_contains("B@x.edu");
            then.status(422)
                .json_body(json!({"msg": "User already registered"}));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/admin/users")
                .body_contains("C@x.edu");
            then.status(500).body("down");
        });

        let auth = SupabaseAuth::with_base_url(server.base_url(), "service".to_string());
        let entries: Vec<RosterEntry> = ["A", "B", "C"]
            .iter()
            .map(|e| RosterEntry {
                enrollment_no: e.to_string(),
                email: roster_email(e, "x.edu"),
                password: "secret1".to_string(),
            })
            .collect();

        let summary = import_roster(&auth, &entries, 7).await;
        assert_eq!(
            summary,
            ImportSummary {
                created: 1,
                already_registered: 1,
                failed: 1
            }
        );
    }
}

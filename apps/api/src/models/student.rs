use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::guidance::aq::AqScores;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub enrollment_no: String,
    pub email: Option<String>,
    pub teacher_id: Option<i64>,
    pub user_id: Option<Uuid>,
    pub aq_score: Option<i32>,
    pub control_score: Option<i32>,
    pub ownership_score: Option<i32>,
    pub reach_score: Option<i32>,
    pub endurance_score: Option<i32>,
    pub attitude_score: Option<i32>,
    pub skills: Option<String>,
    pub career_suggestion: Option<String>,
}

impl StudentRow {
    /// Stored scores, if the assessment has been taken. An AQ of 0 counts as
    /// not taken, same as the landing-page stats. Missing sub-scores read as 0.
    pub fn scores(&self) -> Option<AqScores> {
        let aq_score = self.aq_score.filter(|aq| *aq > 0)?;
        Some(AqScores {
            aq_score,
            control_score: self.control_score.unwrap_or(0),
            ownership_score: self.ownership_score.unwrap_or(0),
            reach_score: self.reach_score.unwrap_or(0),
            endurance_score: self.endurance_score.unwrap_or(0),
            attitude_score: self.attitude_score.unwrap_or(0),
        })
    }

    pub fn has_report(&self) -> bool {
        self.career_suggestion
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

/// Row of a teacher's class list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentSummary {
    pub id: i64,
    pub enrollment_no: String,
    pub aq_score: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> StudentRow {
        StudentRow {
            id: 1,
            enrollment_no: "MITU1".to_string(),
            email: None,
            teacher_id: Some(7),
            user_id: None,
            aq_score: None,
            control_score: Some(3),
            ownership_score: None,
            reach_score: None,
            endurance_score: None,
            attitude_score: None,
            skills: None,
            career_suggestion: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_scores_require_aq() {
        let mut student = row();
        assert!(student.scores().is_none());
        student.aq_score = Some(0);
        assert!(student.scores().is_none());
        student.aq_score = Some(6);
        let scores = student.scores().unwrap();
        assert_eq!(scores.control_score, 3);
        assert_eq!(scores.ownership_score, 0);
    }

    #[test]
    fn test_blank_suggestion_is_not_a_report() {
        assert!(!row().has_report());
    }
}

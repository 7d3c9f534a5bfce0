//! The student report: AQ grade, trait breakdown, Bloom mapping and the
//! stored career suggestions.

use serde::{Deserialize, Serialize};

use crate::bloom::levels::BloomLevel;
use crate::errors::AppError;
use crate::guidance::aq::{top_traits, AqCategory, AqScores, Trait};
use crate::models::student::StudentRow;

pub const SUGGESTION_REASON: &str =
    "This path aligns well with your calculated strengths and selected skills.";

/// Cognitive levels each trait draws on.
pub fn bloom_levels(t: Trait) -> &'static [BloomLevel] {
    match t {
        Trait::Control => &[BloomLevel::L1, BloomLevel::L3, BloomLevel::L4],
        Trait::Ownership => &[BloomLevel::L2, BloomLevel::L3, BloomLevel::L4],
        Trait::Reach => &[BloomLevel::L5],
        Trait::Endurance => &[BloomLevel::L5],
        Trait::Attitude => &[BloomLevel::L4, BloomLevel::L6],
    }
}

/// Thinking skills for a trait, de-duplicated in level order.
pub fn trait_skills(t: Trait) -> Vec<&'static str> {
    let mut skills = Vec::new();
    for level in bloom_levels(t) {
        if !skills.contains(&level.skill()) {
            skills.push(level.skill());
        }
    }
    skills
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub career: String,
    pub reason: String,
}

/// Stored in `students.career_suggestion` as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerSuggestions {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl CareerSuggestions {
    pub fn from_careers(careers: Vec<String>) -> Self {
        Self {
            suggestions: careers
                .into_iter()
                .map(|career| Suggestion {
                    career,
                    reason: SUGGESTION_REASON.to_string(),
                })
                .collect(),
        }
    }

    /// Empty when absent or not valid JSON.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.filter(|r| !r.trim().is_empty())
            .and_then(|r| serde_json::from_str(r).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitScore {
    pub name: &'static str,
    pub letter: &'static str,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitBloom {
    pub name: &'static str,
    pub levels: Vec<String>,
    pub skills: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSkill {
    pub level: &'static str,
    pub skill: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentReport {
    pub enrollment_no: String,
    pub aq_score: i32,
    pub aq_category: AqCategory,
    pub trait_scores: Vec<TraitScore>,
    pub top_traits: Vec<TraitScore>,
    pub bloom_map: Vec<TraitBloom>,
    pub bloom_skills: Vec<LevelSkill>,
    pub top_trait_skills: Vec<&'static str>,
    pub skills: Option<String>,
    pub suggestions: Vec<Suggestion>,
    pub viewer_is_teacher: bool,
}

fn trait_score(t: Trait, score: i32) -> TraitScore {
    TraitScore {
        name: t.name(),
        letter: t.letter(),
        score,
    }
}

pub fn build_report(
    enrollment_no: &str,
    scores: &AqScores,
    skills: Option<String>,
    suggestions: CareerSuggestions,
    viewer_is_teacher: bool,
) -> StudentReport {
    let all = scores.trait_scores();
    let top = top_traits(&all, 2);

    let mut top_trait_skills = Vec::new();
    for (t, _) in &top {
        for skill in trait_skills(*t) {
            if !top_trait_skills.contains(&skill) {
                top_trait_skills.push(skill);
            }
        }
    }

    StudentReport {
        enrollment_no: enrollment_no.to_string(),
        aq_score: scores.aq_score,
        aq_category: AqCategory::for_report(scores.aq_score),
        trait_scores: all.iter().map(|(t, s)| trait_score(*t, *s)).collect(),
        top_traits: top.iter().map(|(t, s)| trait_score(*t, *s)).collect(),
        bloom_map: Trait::ALL
            .iter()
            .map(|t| TraitBloom {
                name: t.name(),
                levels: bloom_levels(*t).iter().map(|l| l.label()).collect(),
                skills: trait_skills(*t),
            })
            .collect(),
        bloom_skills: BloomLevel::ALL
            .iter()
            .map(|l| LevelSkill {
                level: l.code(),
                skill: l.skill(),
            })
            .collect(),
        top_trait_skills,
        skills,
        suggestions: suggestions.suggestions,
        viewer_is_teacher,
    }
}

/// Report for a stored student. Students without an AQ score have no report.
pub fn report_for_student(row: &StudentRow, viewer_is_teacher: bool) -> Result<StudentReport, AppError> {
    let scores = row.scores().ok_or_else(|| {
        AppError::NotFound(
            "Report data not found. The student may need to complete the assessment first."
                .to_string(),
        )
    })?;

    Ok(build_report(
        &row.enrollment_no,
        &scores,
        row.skills.clone(),
        CareerSuggestions::parse(row.career_suggestion.as_deref()),
        viewer_is_teacher,
    ))
}

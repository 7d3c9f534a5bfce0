//! Adversity-quotient scoring and grading.
//!
//! The questionnaire has 23 items answered on a 0–5 scale. Items map onto the
//! five CORE-A sub-scales; the composite AQ is twice the sum of all five.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const QUESTION_COUNT: usize = 23;
pub const MAX_ANSWER: i32 = 5;

/// Inclusive question ranges per sub-scale, in questionnaire order.
pub const SUBSCALES: [(Trait, u8, u8); 5] = [
    (Trait::Control, 1, 3),
    (Trait::Ownership, 4, 11),
    (Trait::Reach, 12, 16),
    (Trait::Endurance, 17, 21),
    (Trait::Attitude, 22, 23),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    Control,
    Ownership,
    Reach,
    Endurance,
    Attitude,
}

impl Trait {
    pub const ALL: [Trait; 5] = [
        Trait::Control,
        Trait::Ownership,
        Trait::Reach,
        Trait::Endurance,
        Trait::Attitude,
    ];

    /// Single-letter code used by the trait map and the prompt.
    pub fn letter(self) -> &'static str {
        match self {
            Trait::Control => "C",
            Trait::Ownership => "O",
            Trait::Reach => "R",
            Trait::Endurance => "E",
            Trait::Attitude => "A",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Trait::Control => "Control",
            Trait::Ownership => "Ownership",
            Trait::Reach => "Reach",
            Trait::Endurance => "Endurance",
            Trait::Attitude => "Attitude",
        }
    }
}

/// Raw questionnaire answers keyed `q1`..`q23`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentAnswers(pub HashMap<String, i32>);

impl AssessmentAnswers {
    /// Missing answers count as zero.
    fn answer(&self, question: u8) -> i32 {
        self.0.get(&format!("q{question}")).copied().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (key, value) in &self.0 {
            let number = key
                .strip_prefix('q')
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| (1..=QUESTION_COUNT).contains(n));
            if number.is_none() {
                return Err(AppError::Validation(format!("Unknown question '{key}'")));
            }
            if !(0..=MAX_ANSWER).contains(value) {
                return Err(AppError::Validation(format!(
                    "Answer to {key} must be between 0 and {MAX_ANSWER}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AqScores {
    pub aq_score: i32,
    pub control_score: i32,
    pub ownership_score: i32,
    pub reach_score: i32,
    pub endurance_score: i32,
    pub attitude_score: i32,
}

impl AqScores {
    pub fn trait_score(&self, t: Trait) -> i32 {
        match t {
            Trait::Control => self.control_score,
            Trait::Ownership => self.ownership_score,
            Trait::Reach => self.reach_score,
            Trait::Endurance => self.endurance_score,
            Trait::Attitude => self.attitude_score,
        }
    }

    /// Trait scores in C, O, R, E, A order.
    pub fn trait_scores(&self) -> [(Trait, i32); 5] {
        Trait::ALL.map(|t| (t, self.trait_score(t)))
    }
}

pub fn score_assessment(answers: &AssessmentAnswers) -> AqScores {
    let subscale = |t: Trait| -> i32 {
        SUBSCALES
            .iter()
            .filter(|(s, _, _)| *s == t)
            .flat_map(|(_, from, to)| *from..=*to)
            .map(|q| answers.answer(q))
            .sum()
    };

    let control_score = subscale(Trait::Control);
    let ownership_score = subscale(Trait::Ownership);
    let reach_score = subscale(Trait::Reach);
    let endurance_score = subscale(Trait::Endurance);
    let attitude_score = subscale(Trait::Attitude);

    AqScores {
        aq_score: 2
            * (control_score + ownership_score + reach_score + endurance_score + attitude_score),
        control_score,
        ownership_score,
        reach_score,
        endurance_score,
        attitude_score,
    }
}

/// Top `n` traits by score. Ties keep C, O, R, E, A order.
pub fn top_traits(scores: &[(Trait, i32)], n: usize) -> Vec<(Trait, i32)> {
    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AqCategory {
    pub name: &'static str,
    pub description: &'static str,
}

const CLIMBER: AqCategory = AqCategory {
    name: "Climber",
    description: "You excel at navigating challenges and consistently seek growth. You are highly resilient and resourceful.",
};
const MODERATE_CLIMBER: AqCategory = AqCategory {
    name: "Moderate Climber",
    description: "You are resilient and consistently work to overcome challenges, showing a strong capacity for growth and adaptation.",
};
const CAMPER: AqCategory = AqCategory {
    name: "Camper",
    description: "You are steady and reliable, but may sometimes avoid difficult challenges to stay in a comfortable zone.",
};
const MODERATE_CAMPER: AqCategory = AqCategory {
    name: "Moderate Camper",
    description: "You handle familiar situations well but tend to avoid new or significant challenges. There's a great opportunity to step outside your comfort zone.",
};
const QUITTER: AqCategory = AqCategory {
    name: "Quitter",
    description: "You may feel overwhelmed by adversity and have an opportunity to develop stronger resilience strategies.",
};

impl AqCategory {
    /// Three-bucket grading fed to the recommendation prompt.
    pub fn for_guidance(aq_score: i32) -> Self {
        if aq_score >= 180 {
            CLIMBER
        } else if aq_score >= 140 {
            CAMPER
        } else {
            QUITTER
        }
    }

    /// Five-bucket grading shown on the report.
    pub fn for_report(aq_score: i32) -> Self {
        if aq_score >= 180 {
            CLIMBER
        } else if aq_score >= 160 {
            MODERATE_CLIMBER
        } else if aq_score >= 140 {
            CAMPER
        } else if aq_score >= 120 {
            MODERATE_CAMPER
        } else {
            QUITTER
        }
    }

    /// "<name> - <description>", the form the prompt expects.
    pub fn profile_description(&self) -> String {
        format!("{} - {}", self.name, self.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Low,
    Medium,
    High,
}

impl SkillLevel {
    pub fn for_aq(aq_score: i32) -> Self {
        if aq_score < 140 {
            SkillLevel::Low
        } else if aq_score < 180 {
            SkillLevel::Medium
        } else {
            SkillLevel::High
        }
    }

    fn catalog(self) -> &'static [&'static str] {
        match self {
            SkillLevel::Low => &[
                "Accuracy & Speed",
                "Agile",
                "Attention to Detail",
                "Basic Computer Skills",
                "Basic IT Knowledge",
                "Communication",
                "communication skills",
                "Computer Basics",
                "Customer Service",
            ],
            SkillLevel::Medium => &[
                "Advanced SQL",
                "C++ Programming",
                "CSS Flexbox",
                "Database Management",
                "Git",
                "HTML/CSS/JavaScript",
                "Java",
                "JavaScript",
                "Python",
            ],
            SkillLevel::High => &[
                "AI & Machine Learning",
                "Cloud Computing (AWS/Azure)",
                "Deep Learning",
                "Machine Learning Algorithms",
                "NLP Libraries",
                "System Design & Architecture",
            ],
        }
    }

    /// Selectable skills for this level, sorted.
    pub fn skills(self) -> Vec<&'static str> {
        let mut skills = self.catalog().to_vec();
        skills.sort_unstable();
        skills
    }
}

//! Career recommendation engine: skill correction, AQ grading, retrieval
//! augmented generation and merging with record and trait suggestions.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::aq::AqCategory;
use super::prompts::career_prompt;
use super::records::StudentRecords;
use super::skills::SkillCatalog;
use super::traits::trait_based_suggestions;
use crate::config::GuidanceConfig;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::rag::{Embedder, HostedEmbedder, RetrievalQa, VectorIndex};

/// Maximum number of careers returned to the student.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// What the engine knows about a student before asking the model.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub enrollment: String,
    pub aq_score: i32,
    pub skills: Vec<String>,
    pub suggested_role: Option<String>,
}

pub struct GuidanceEngine {
    records: StudentRecords,
    catalog: SkillCatalog,
    qa: RetrievalQa,
}

impl GuidanceEngine {
    /// Loads the student records, then loads or builds the vector index.
    pub async fn from_config(config: &GuidanceConfig) -> Result<Self> {
        let records = StudentRecords::load(&config.student_data_path)?;

        let embedder: Arc<dyn Embedder> = Arc::new(HostedEmbedder::new(
            config.embedding_api_url.clone(),
            config.hf_api_token.clone(),
        ));
        let index = VectorIndex::load_or_build(
            &config.vector_index_path,
            &config.research_paper_path,
            embedder.as_ref(),
        )
        .await
        .context("Failed to prepare the vector index")?;

        let llm = LlmClient::with_base_url(config.groq_api_key.clone(), config.groq_api_url.clone())
            .context("Failed to build the chat model client")?;

        Ok(Self::from_parts(records, RetrievalQa::new(llm, embedder, index)))
    }

    pub fn from_parts(records: StudentRecords, qa: RetrievalQa) -> Self {
        let catalog = SkillCatalog::from_cells(records.skill_cells());
        info!("Guidance engine ready with {} known skills", catalog.len());
        Self {
            records,
            catalog,
            qa,
        }
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub fn profile(&self, enrollment: &str, aq_score: i32, skills: &[String]) -> StudentProfile {
        let enrollment = enrollment.trim();
        let suggested_role = if enrollment.is_empty() {
            None
        } else {
            self.records.suggested_role(enrollment)
        };

        StudentProfile {
            enrollment: if enrollment.is_empty() {
                "N/A".to_string()
            } else {
                enrollment.to_string()
            },
            aq_score,
            skills: self.catalog.correct(skills),
            suggested_role,
        }
    }

    pub async fn generate_recommendations(
        &self,
        enrollment: &str,
        aq_score: i32,
        skills: &[String],
        traits: &[String],
    ) -> Result<Vec<String>, AppError> {
        let profile = self.profile(enrollment, aq_score, skills);
        let category = AqCategory::for_guidance(aq_score);

        let prompt = career_prompt(
            &category.profile_description(),
            profile.aq_score,
            &format_traits(traits),
            &format_skills(&profile.skills),
        );

        let answer = self
            .qa
            .invoke(&prompt)
            .await
            .map_err(|e| AppError::Llm(e.to_string()))?;
        debug!("Model answer for {}: {answer:?}", profile.enrollment);

        let llm_careers = parse_llm_careers(&answer);
        let trait_careers = trait_based_suggestions(traits);

        Ok(merge_recommendations(
            profile.suggested_role.as_deref(),
            &llm_careers,
            &trait_careers,
        ))
    }
}

/// Sorted traits joined with " + ", or "None".
fn format_traits(traits: &[String]) -> String {
    if traits.is_empty() {
        return "None".to_string();
    }
    let mut sorted = traits.to_vec();
    sorted.sort();
    sorted.join(" + ")
}

/// Skills sorted case-insensitively, comma separated.
fn format_skills(skills: &[String]) -> String {
    let mut sorted = skills.to_vec();
    sorted.sort_by_key(|s| s.to_lowercase());
    sorted.join(", ")
}

/// Pulls career titles out of a numbered list. Lines without a '.' are ignored.
pub fn parse_llm_careers(answer: &str) -> Vec<String> {
    answer
        .trim()
        .lines()
        .filter_map(|line| line.split_once('.'))
        .map(|(_, title)| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .collect()
}

/// Suggested role first, then model careers, then trait careers.
/// Case-insensitive de-duplication keeps the first spelling.
pub fn merge_recommendations(
    suggested_role: Option<&str>,
    llm_careers: &[String],
    trait_careers: &[String],
) -> Vec<String> {
    let mut seen = HashSet::new();
    suggested_role
        .into_iter()
        .chain(llm_careers.iter().map(String::as_str))
        .chain(trait_careers.iter().map(String::as_str))
        .filter(|career| seen.insert(career.to_lowercase()))
        .take(MAX_RECOMMENDATIONS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guidance::records::StudentRecord;
    use crate::rag::embedder::EmbedError;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_llm_careers_takes_text_after_first_dot() {
        let answer = "\n1. Junior Data Analyst\n2. Sr. Engineer\nno number here\n3.\n";
        assert_eq!(
            parse_llm_careers(answer),
            strings(&["Junior Data Analyst", "Engineer"])
        );
    }

    #[test]
    fn test_merge_puts_suggested_role_first_and_dedups() {
        let merged = merge_recommendations(
            Some("Data Analyst"),
            &strings(&["data analyst", "QA Tester"]),
            &strings(&["Researcher", "Business Owner"]),
        );
        assert_eq!(merged, strings(&["Data Analyst", "QA Tester", "Researcher"]));
    }

    #[test]
    fn test_merge_falls_back_to_trait_careers() {
        let merged = merge_recommendations(None, &[], &strings(&["Psychologist", "Teacher"]));
        assert_eq!(merged, strings(&["Psychologist", "Teacher"]));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_traits(&[]), "None");
        assert_eq!(format_traits(&strings(&["O", "E"])), "E + O");
        assert_eq!(
            format_skills(&strings(&["sql", "Blender", "C#"])),
            "Blender, C#, sql"
        );
    }

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        fn model(&self) -> &str {
            "unit"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    fn engine(base_url: String) -> GuidanceEngine {
        let records = StudentRecords::new(vec![StudentRecord {
            enrollment_number: "MITU23BTCS001".to_string(),
            final_skills: Some("['Python Programming', 'SQL']".to_string()),
            suggested_role: Some(" Data Analyst ".to_string()),
        }]);
        let llm = LlmClient::with_base_url("k".to_string(), base_url).unwrap();
        let qa = RetrievalQa::new(llm, Arc::new(UnitEmbedder), VectorIndex::empty("unit"));
        GuidanceEngine::from_parts(records, qa)
    }

    #[test]
    fn test_profile_defaults_enrollment_and_corrects_skills() {
        let engine = engine("http://localhost:1".to_string());
        let profile = engine.profile("", 150, &strings(&["pyhton programing"]));
        assert_eq!(profile.enrollment, "N/A");
        assert_eq!(profile.suggested_role, None);
        assert_eq!(profile.skills, strings(&["Python programming"]));
    }

    #[tokio::test]
    async fn test_generate_recommendations_end_to_end() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Camper - You are steady")
                .body_contains("Python programming, Sql");
            then.status(200).json_body(json!({
                "choices": [{"message": {"content": "1. Junior QA Tester\n2. Data Analyst\n3. Software Trainee"}}]
            }));
        });

        let engine = engine(server.base_url());
        let careers = engine
            .generate_recommendations(
                "MITU23BTCS001",
                150,
                &strings(&["python programming", "sql"]),
                &strings(&["R", "E"]),
            )
            .await
            .unwrap();

        assert_eq!(
            careers,
            strings(&["Data Analyst", "Junior QA Tester", "Software Trainee"])
        );
        mock.assert();
    }
}

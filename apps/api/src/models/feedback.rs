use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub student_id: i64,
    pub aq_accuracy_rating: i32,
    pub career_relevance_rating: i32,
    pub top_trait_agreement: bool,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

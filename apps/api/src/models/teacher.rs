use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherRow {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherSummary {
    pub id: i64,
    pub name: String,
}

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::admin::roster::{import_roster, parse_roster, ImportSummary, RosterError};
use crate::errors::AppError;
use crate::models::teacher::TeacherSummary;
use crate::session::{Claims, IssuedSession, Session};
use crate::state::AppState;
use crate::store;
use crate::uploads::{archive_upload, read_sheet_form};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/v1/admin/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<IssuedSession>, AppError> {
    let admin = &state.config.admin;
    if req.username != admin.username || req.password != admin.password {
        return Err(AppError::Unauthorized(
            "Invalid username or password. Please try again.".to_string(),
        ));
    }
    Ok(Json(state.sessions.issue(Claims::admin())?))
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub students: Vec<String>,
    pub teachers: Vec<TeacherSummary>,
}

/// GET /api/v1/admin/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<AdminDashboard>, AppError> {
    session.require_admin()?;
    Ok(Json(AdminDashboard {
        students: store::all_enrollments(&state.db).await?,
        teachers: store::all_teachers(&state.db).await?,
    }))
}

#[derive(Debug, Serialize)]
pub struct RosterUploadResult {
    pub archive_key: String,
    pub teacher_id: i64,
    #[serde(flatten)]
    pub summary: ImportSummary,
    pub message: String,
}

/// POST /api/v1/admin/students/upload (multipart: `file`, `teacher_id`)
pub async fn handle_upload_roster(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Json<RosterUploadResult>, AppError> {
    session.require_admin()?;

    let form = read_sheet_form(multipart).await?;
    let teacher_id = form
        .fields
        .get("teacher_id")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation("Please select a teacher.".to_string()))?
        .parse::<i64>()
        .map_err(|_| AppError::Validation("Invalid teacher id.".to_string()))?;

    let archive_key = archive_upload(&state.s3, &state.config.s3_bucket, "roster", &form.file).await?;

    let entries = parse_roster(&form.file.table()?, &state.config.student_email_domain)
        .map_err(|e: RosterError| AppError::Validation(e.to_string()))?;
    info!("Importing {} roster rows for teacher {teacher_id}", entries.len());

    let summary = import_roster(&state.auth, &entries, teacher_id).await;
    Ok(Json(RosterUploadResult {
        archive_key,
        teacher_id,
        message: format!(
            "Bulk upload complete: {} accounts created, {} already registered, {} failed.",
            summary.created, summary.already_registered, summary.failed
        ),
        summary,
    }))
}

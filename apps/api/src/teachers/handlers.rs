use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::errors::AppError;
use crate::models::student::{StudentRow, StudentSummary};
use crate::session::{Claims, IssuedSession, Session};
use crate::state::AppState;
use crate::store;
use crate::students::handlers::OtpSent;
use crate::students::report::{report_for_student, StudentReport};

#[derive(Debug, Deserialize)]
pub struct TeacherRegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub subject: String,
}

/// POST /api/v1/teachers/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<TeacherRegisterRequest>,
) -> Result<(StatusCode, Json<OtpSent>), AppError> {
    let name = req.name.trim();
    let email = req.email.trim();
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Please fill out all required fields.".to_string()));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match!".to_string()));
    }

    state
        .auth
        .sign_up(
            email,
            &req.password,
            json!({"name": name, "subject": req.subject.trim(), "role": "teacher"}),
        )
        .await?;

    info!("Teacher {name} registered, OTP sent to {email}");
    Ok((StatusCode::CREATED, Json(OtpSent::new(email))))
}

#[derive(Debug, Deserialize)]
pub struct TeacherLoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/teachers/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<TeacherLoginRequest>,
) -> Result<Json<IssuedSession>, AppError> {
    let failed = || {
        AppError::Unauthorized(
            "Login failed. Check email/password or verify your account.".to_string(),
        )
    };

    let auth_session = state
        .auth
        .sign_in_with_password(req.email.trim(), &req.password)
        .await
        .map_err(|e| {
            tracing::debug!("Teacher sign-in failed: {e}");
            failed()
        })?;

    let teacher = store::teacher_by_user_id(&state.db, auth_session.user.id)
        .await?
        .ok_or_else(failed)?;

    Ok(Json(state.sessions.issue(Claims::teacher(teacher.id, teacher.name))?))
}

#[derive(Debug, Serialize)]
pub struct TeacherDashboard {
    pub teacher: TeacherName,
}

#[derive(Debug, Serialize)]
pub struct TeacherName {
    pub name: String,
}

/// GET /api/v1/teachers/dashboard
pub async fn handle_dashboard(session: Session) -> Result<Json<TeacherDashboard>, AppError> {
    session.teacher_id()?;
    let name = session
        .claims()
        .teacher_name
        .clone()
        .unwrap_or_else(|| "Teacher".to_string());
    Ok(Json(TeacherDashboard {
        teacher: TeacherName { name },
    }))
}

/// GET /api/v1/teachers/students
pub async fn handle_list_students(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<StudentSummary>>, AppError> {
    let teacher_id = session.teacher_id()?;
    Ok(Json(store::students_for_teacher(&state.db, teacher_id).await?))
}

/// GET /api/v1/teachers/students/:id/report
pub async fn handle_student_report(
    State(state): State<AppState>,
    session: Session,
    Path(student_id): Path<i64>,
) -> Result<Json<StudentReport>, AppError> {
    let teacher_id = session.teacher_id()?;

    let student = store::student_by_id(&state.db, student_id).await?;
    let student = own_student(student, teacher_id)?;

    Ok(Json(report_for_student(&student, true)?))
}

/// Teachers only see their own class. Unknown ids get the same answer.
pub fn own_student(student: Option<StudentRow>, teacher_id: i64) -> Result<StudentRow, AppError> {
    student
        .filter(|s| s.teacher_id == Some(teacher_id))
        .ok_or_else(|| {
            AppError::Forbidden(
                "Permission Denied: You can only view reports for students assigned to you."
                    .to_string(),
            )
        })
}

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::report::{build_report, report_for_student, CareerSuggestions, StudentReport};
use crate::cache;
use crate::errors::AppError;
use crate::guidance::aq::{
    score_assessment, top_traits, AqScores, AssessmentAnswers, SkillLevel, MAX_ANSWER,
    QUESTION_COUNT, SUBSCALES,
};
use crate::models::feedback::FeedbackRow;
use crate::models::student::StudentRow;
use crate::session::{Claims, IssuedSession, Session, TEST_DRIVE_ENROLLMENT};
use crate::state::AppState;
use crate::store::{self, NewFeedback};

/// Report generated in a test-drive session, kept in Redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TestDriveReport {
    skills: Vec<String>,
    suggestions: CareerSuggestions,
}

#[derive(Debug, Deserialize)]
pub struct StudentRegisterRequest {
    pub enrollment_no: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct OtpSent {
    pub status: &'static str,
    pub email: String,
    pub message: String,
}

impl OtpSent {
    pub fn new(email: &str) -> Self {
        Self {
            status: "otp_sent",
            email: email.to_string(),
            message: format!("Verification code sent to {email}. Please enter it below."),
        }
    }
}

/// POST /api/v1/students/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<StudentRegisterRequest>,
) -> Result<(StatusCode, Json<OtpSent>), AppError> {
    let enrollment_no = req.enrollment_no.trim();
    let email = req.email.trim();
    if enrollment_no.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Please fill out all fields.".to_string()));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match!".to_string()));
    }

    state
        .auth
        .sign_up(
            email,
            &req.password,
            json!({
                "enrollment_no": enrollment_no,
                "role": "student",
                "teacher_id": state.config.public_teacher_id,
            }),
        )
        .await?;

    info!("Student {enrollment_no} registered, OTP sent to {email}");
    Ok((StatusCode::CREATED, Json(OtpSent::new(email))))
}

#[derive(Debug, Deserialize)]
pub struct StudentLoginRequest {
    pub enrollment_no: String,
    pub password: String,
}

/// POST /api/v1/students/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<StudentLoginRequest>,
) -> Result<Json<IssuedSession>, AppError> {
    if req.enrollment_no == TEST_DRIVE_ENROLLMENT && req.password == TEST_DRIVE_ENROLLMENT {
        info!("Test-drive session started");
        return Ok(Json(state.sessions.issue(Claims::test_drive())?));
    }

    let enrollment_no = req.enrollment_no.trim();
    if enrollment_no.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Please enter both enrollment number and password.".to_string(),
        ));
    }

    let not_found =
        || AppError::Unauthorized("Enrollment number not found or account not verified yet.".to_string());
    let student = store::student_by_enrollment(&state.db, enrollment_no)
        .await?
        .ok_or_else(not_found)?;
    let email = student.email.as_deref().ok_or_else(not_found)?;

    state
        .auth
        .sign_in_with_password(email, &req.password)
        .await
        .map_err(|e| {
            tracing::debug!("Student sign-in failed for {enrollment_no}: {e}");
            AppError::Unauthorized("Invalid credentials or account not verified.".to_string())
        })?;

    Ok(Json(state.sessions.issue(Claims::student(
        student.id,
        student.enrollment_no,
    ))?))
}

async fn current_student(state: &AppState, session: &Session) -> Result<StudentRow, AppError> {
    let id = session.student_id()?;
    store::student_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {id} not found")))
}

/// Scores for the caller, from Redis in test-drive mode.
async fn current_scores(state: &AppState, session: &Session) -> Result<Option<(String, AqScores)>, AppError> {
    if session.is_test_drive() {
        let key = cache::test_drive_key(session.claims().sid, "scores");
        let scores: Option<AqScores> = cache::load_json(state.cache.as_ref(), &key).await?;
        return Ok(scores.map(|s| (TEST_DRIVE_ENROLLMENT.to_string(), s)));
    }

    let student = current_student(state, session).await?;
    Ok(student.scores().map(|s| (student.enrollment_no, s)))
}

/// A student with a generated report must leave feedback before the
/// dashboard opens again.
pub fn dashboard_gate(student: &StudentRow, has_feedback: bool) -> Result<(), AppError> {
    if student.has_report() && !has_feedback {
        return Err(AppError::FeedbackRequired);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub enrollment_no: String,
    pub assessment_taken: bool,
}

/// GET /api/v1/students/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DashboardResponse>, AppError> {
    session.require_student_or_test_drive()?;

    if session.is_test_drive() {
        let scores = current_scores(&state, &session).await?;
        return Ok(Json(DashboardResponse {
            enrollment_no: TEST_DRIVE_ENROLLMENT.to_string(),
            assessment_taken: scores.is_some(),
        }));
    }

    let student = current_student(&state, &session).await?;
    let has_feedback = student.has_report() && store::has_feedback(&state.db, student.id).await?;
    dashboard_gate(&student, has_feedback)?;

    Ok(Json(DashboardResponse {
        assessment_taken: student.scores().is_some(),
        enrollment_no: student.enrollment_no,
    }))
}

/// GET /api/v1/students/assessment
pub async fn handle_assessment_layout(session: Session) -> Result<Json<serde_json::Value>, AppError> {
    session.require_student_or_test_drive()?;

    let subscales: Vec<_> = SUBSCALES
        .iter()
        .map(|(t, from, to)| {
            json!({
                "trait": t.name(),
                "letter": t.letter(),
                "questions": (*from..=*to).map(|q| format!("q{q}")).collect::<Vec<_>>(),
            })
        })
        .collect();

    Ok(Json(json!({
        "question_count": QUESTION_COUNT,
        "min_answer": 0,
        "max_answer": MAX_ANSWER,
        "subscales": subscales,
    })))
}

/// POST /api/v1/students/assessment
pub async fn handle_submit_assessment(
    State(state): State<AppState>,
    session: Session,
    Json(answers): Json<AssessmentAnswers>,
) -> Result<Json<AqScores>, AppError> {
    let claims = session.require_student_or_test_drive()?;
    answers.validate()?;
    let scores = score_assessment(&answers);

    if session.is_test_drive() {
        let key = cache::test_drive_key(claims.sid, "scores");
        cache::store_json(state.cache.as_ref(), &key, &scores, claims.remaining_secs()).await?;
    } else {
        let id = session.student_id()?;
        store::save_scores(&state.db, id, &scores).await?;
        info!("Saved assessment for student {id}: AQ {}", scores.aq_score);
    }

    Ok(Json(scores))
}

#[derive(Debug, Serialize)]
pub struct AssessmentResults {
    pub scores: AqScores,
    pub skill_level: SkillLevel,
    pub skills: Vec<&'static str>,
}

/// GET /api/v1/students/assessment/results
pub async fn handle_assessment_results(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<AssessmentResults>, AppError> {
    session.require_student_or_test_drive()?;

    let (_, scores) = current_scores(&state, &session).await?.ok_or_else(|| {
        AppError::NotFound(
            "Could not retrieve assessment scores. Please take the assessment first.".to_string(),
        )
    })?;
    let skill_level = SkillLevel::for_aq(scores.aq_score);

    Ok(Json(AssessmentResults {
        scores,
        skill_level,
        skills: skill_level.skills(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    #[serde(default)]
    pub skills: Vec<String>,
}

/// POST /api/v1/students/report
pub async fn handle_generate_report(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<GenerateReportRequest>,
) -> Result<Json<StudentReport>, AppError> {
    let claims = session.require_student_or_test_drive()?.clone();

    let skills: Vec<String> = req
        .skills
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        return Err(AppError::Validation("Please select at least one skill.".to_string()));
    }

    let (enrollment_no, scores) = current_scores(&state, &session)
        .await?
        .ok_or_else(|| AppError::NotFound("Could not retrieve student data.".to_string()))?;

    let traits: Vec<String> = top_traits(&scores.trait_scores(), 2)
        .into_iter()
        .map(|(t, _)| t.letter().to_string())
        .collect();

    let careers = state
        .guidance
        .generate_recommendations(&enrollment_no, scores.aq_score, &skills, &traits)
        .await?;
    info!("Generated {} recommendations for {enrollment_no}", careers.len());
    let suggestions = CareerSuggestions::from_careers(careers);

    if session.is_test_drive() {
        let key = cache::test_drive_key(claims.sid, "report");
        let cached = TestDriveReport {
            skills: skills.clone(),
            suggestions: suggestions.clone(),
        };
        cache::store_json(state.cache.as_ref(), &key, &cached, claims.remaining_secs()).await?;
    } else {
        let stored = serde_json::to_string(&suggestions).map_err(anyhow::Error::from)?;
        store::save_report(&state.db, session.student_id()?, &skills.join(", "), &stored).await?;
    }

    Ok(Json(build_report(
        &enrollment_no,
        &scores,
        Some(skills.join(", ")),
        suggestions,
        false,
    )))
}

/// GET /api/v1/students/report
pub async fn handle_view_report(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<StudentReport>, AppError> {
    let claims = session.require_student_or_test_drive()?;

    if session.is_test_drive() {
        let (enrollment_no, scores) = current_scores(&state, &session).await?.ok_or_else(|| {
            AppError::NotFound(
                "Report data not found. The student may need to complete the assessment first."
                    .to_string(),
            )
        })?;
        let key = cache::test_drive_key(claims.sid, "report");
        let cached: Option<TestDriveReport> = cache::load_json(state.cache.as_ref(), &key).await?;
        let (skills, suggestions) = match cached {
            Some(r) => (Some(r.skills.join(", ")), r.suggestions),
            None => (None, CareerSuggestions::default()),
        };
        return Ok(Json(build_report(&enrollment_no, &scores, skills, suggestions, false)));
    }

    let student = current_student(&state, &session).await?;
    Ok(Json(report_for_student(&student, false)?))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub aq_accuracy_rating: i32,
    pub career_relevance_rating: i32,
    #[serde(default)]
    pub top_trait_agreement: bool,
    #[serde(default)]
    pub comments: Option<String>,
}

impl FeedbackRequest {
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("aq_accuracy_rating", self.aq_accuracy_rating),
            ("career_relevance_rating", self.career_relevance_rating),
        ] {
            if !(1..=5).contains(&value) {
                return Err(AppError::Validation(format!("{field} must be between 1 and 5")));
            }
        }
        Ok(())
    }
}

/// POST /api/v1/students/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<Option<FeedbackRow>>), AppError> {
    session.require_student_or_test_drive()?;
    req.validate()?;

    if session.is_test_drive() {
        info!("Test-drive feedback received (not stored)");
        return Ok((StatusCode::ACCEPTED, Json(None)));
    }

    let comments = req.comments.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let row = store::insert_feedback(
        &state.db,
        &NewFeedback {
            student_id: session.student_id()?,
            aq_accuracy_rating: req.aq_accuracy_rating,
            career_relevance_rating: req.career_relevance_rating,
            top_trait_agreement: req.top_trait_agreement,
            comments,
        },
    )
    .await?;

    info!("Feedback {} stored for student {}", row.id, row.student_id);
    Ok((StatusCode::CREATED, Json(Some(row))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_ratings_must_be_one_to_five() {
        let mut req = FeedbackRequest {
            aq_accuracy_rating: 5,
            career_relevance_rating: 1,
            top_trait_agreement: true,
            comments: None,
        };
        assert!(req.validate().is_ok());
        req.career_relevance_rating = 0;
        assert!(req.validate().is_err());
        req.career_relevance_rating = 3;
        req.aq_accuracy_rating = 6;
        assert!(req.validate().is_err());
    }

    fn student(career_suggestion: Option<&str>) -> StudentRow {
        StudentRow {
            id: 3,
            enrollment_no: "MITU23BTCS003".to_string(),
            email: Some("s@x.edu".to_string()),
            teacher_id: Some(7),
            user_id: None,
            aq_score: Some(150),
            control_score: Some(9),
            ownership_score: Some(30),
            reach_score: Some(12),
            endurance_score: Some(20),
            attitude_score: Some(4),
            skills: Some("Python".to_string()),
            career_suggestion: career_suggestion.map(str::to_string),
        }
    }

    #[test]
    fn test_dashboard_locked_until_feedback_after_report() {
        let with_report = student(Some(r#"{"suggestions":[]}"#));
        assert!(matches!(
            dashboard_gate(&with_report, false),
            Err(AppError::FeedbackRequired)
        ));
        assert!(dashboard_gate(&with_report, true).is_ok());
    }

    #[test]
    fn test_dashboard_open_without_report() {
        assert!(dashboard_gate(&student(None), false).is_ok());
        assert!(dashboard_gate(&student(Some("  ")), false).is_ok());
    }

    #[test]
    fn test_otp_sent_message() {
        let sent = OtpSent::new("s@x.edu");
        assert_eq!(sent.status, "otp_sent");
        assert!(sent.message.contains("s@x.edu"));
    }
}

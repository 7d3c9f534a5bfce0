use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::pkce;
use crate::cache;
use crate::errors::AppError;
use crate::session::{Claims, IssuedSession, Session};
use crate::state::AppState;
use crate::store;

/// The profile row is created by a database trigger after confirmation and
/// may lag behind the OTP response.
const PROFILE_LOOKUP_ATTEMPTS: u32 = 3;
const PROFILE_LOOKUP_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
pub struct OAuthStart {
    pub url: String,
    pub flow: String,
}

/// GET /api/v1/auth/google
pub async fn handle_google_login(State(state): State<AppState>) -> Result<Json<OAuthStart>, AppError> {
    let flow = Uuid::new_v4().to_string();
    let verifier = pkce::generate_verifier();
    cache::store_pkce_verifier(state.cache.as_ref(), &flow, &verifier).await?;

    let redirect_to = format!(
        "{}/api/v1/auth/callback?flow={flow}",
        state.config.public_base_url.trim_end_matches('/')
    );
    let url = state
        .auth
        .google_authorize_url(&redirect_to, &pkce::challenge(&verifier))?;

    Ok(Json(OAuthStart { url, flow }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub flow: Option<String>,
}

/// GET /api/v1/auth/callback
pub async fn handle_google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<IssuedSession>, AppError> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Authentication failed: No code provided.".to_string()))?;
    let flow = query
        .flow
        .ok_or_else(|| AppError::Validation("Authentication failed: Unknown sign-in flow.".to_string()))?;

    let verifier = cache::take_pkce_verifier(state.cache.as_ref(), &flow)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Sign-in link expired. Please start again.".to_string()))?;

    let session = state.auth.exchange_code(&code, &verifier).await?;
    let email = session
        .user
        .email
        .ok_or_else(|| AppError::Validation("Google account has no e-mail address".to_string()))?;

    let claims = resolve_profile(&state.db, &email, Some(session.user.id))
        .await?
        .ok_or_else(|| {
            AppError::Forbidden(format!(
                "Your email ({email}) is not registered. Please contact an admin."
            ))
        })?;

    info!("Google sign-in for {email} as {:?}", claims.role);
    Ok(Json(state.sessions.issue(claims)?))
}

/// Teacher first, then student. When `user_id` is given it is linked to the
/// matching row.
async fn resolve_profile(
    pool: &PgPool,
    email: &str,
    user_id: Option<Uuid>,
) -> Result<Option<Claims>, AppError> {
    if let Some(teacher) = store::teacher_by_email(pool, email).await? {
        if let Some(user_id) = user_id {
            store::link_teacher_user(pool, teacher.id, user_id).await?;
        }
        return Ok(Some(Claims::teacher(teacher.id, teacher.name)));
    }

    if let Some(student) = store::student_by_email(pool, email).await? {
        if let Some(user_id) = user_id {
            store::link_student_user(pool, student.id, user_id).await?;
        }
        return Ok(Some(Claims::student(student.id, student.enrollment_no)));
    }

    Ok(None)
}

/// Student first, then teacher, matching the order rows are created in.
async fn resolve_registered_profile(pool: &PgPool, email: &str) -> Result<Option<Claims>, AppError> {
    if let Some(student) = store::student_by_email(pool, email).await? {
        return Ok(Some(Claims::student(student.id, student.enrollment_no)));
    }
    if let Some(teacher) = store::teacher_by_email(pool, email).await? {
        return Ok(Some(Claims::teacher(teacher.id, teacher.name)));
    }
    Ok(None)
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOtpResponse {
    SignedIn { session: IssuedSession },
    Verified { message: String },
}

/// POST /api/v1/auth/verify-otp
pub async fn handle_verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, AppError> {
    let email = req.email.trim();
    let otp = req.otp.trim();
    if email.is_empty() || otp.is_empty() {
        return Err(AppError::Validation(
            "Session expired. Please register again.".to_string(),
        ));
    }

    state.auth.verify_signup_otp(email, otp).await?;
    info!("Verified sign-up for {email}");

    for attempt in 1..=PROFILE_LOOKUP_ATTEMPTS {
        if let Some(claims) = resolve_registered_profile(&state.db, email).await? {
            return Ok(Json(VerifyOtpResponse::SignedIn {
                session: state.sessions.issue(claims)?,
            }));
        }
        if attempt < PROFILE_LOOKUP_ATTEMPTS {
            warn!("Profile for {email} not created yet (attempt {attempt}), retrying");
            tokio::time::sleep(PROFILE_LOOKUP_DELAY).await;
        }
    }

    Ok(Json(VerifyOtpResponse::Verified {
        message: "Account verified! Please log in to continue.".to_string(),
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<StatusCode, AppError> {
    let claims = session.claims();
    cache::revoke_session(state.cache.as_ref(), claims.sid, claims.remaining_secs()).await?;
    if session.is_test_drive() {
        cache::forget_test_drive(state.cache.as_ref(), claims.sid).await?;
    }
    info!("Session {} logged out", claims.sid);
    Ok(StatusCode::NO_CONTENT)
}

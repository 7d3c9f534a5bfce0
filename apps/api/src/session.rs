//! Signed bearer sessions.
//!
//! A session is an HS256 JWT carrying the role and the ids the handlers need.
//! Logout records the session id in Redis until the token would have expired.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    TestDrive,
    Teacher,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sid: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn student(student_id: i64, enrollment_no: String) -> Self {
        Self {
            student_id: Some(student_id),
            enrollment_no: Some(enrollment_no),
            ..Self::bare(Role::Student)
        }
    }

    pub fn test_drive() -> Self {
        Self {
            enrollment_no: Some(TEST_DRIVE_ENROLLMENT.to_string()),
            ..Self::bare(Role::TestDrive)
        }
    }

    pub fn teacher(teacher_id: i64, teacher_name: String) -> Self {
        Self {
            teacher_id: Some(teacher_id),
            teacher_name: Some(teacher_name),
            ..Self::bare(Role::Teacher)
        }
    }

    pub fn admin() -> Self {
        Self::bare(Role::Admin)
    }

    fn bare(role: Role) -> Self {
        Self {
            sid: Uuid::new_v4(),
            role,
            student_id: None,
            teacher_id: None,
            enrollment_no: None,
            teacher_name: None,
            iat: 0,
            exp: 0,
        }
    }

    /// Seconds until expiry, never negative.
    pub fn remaining_secs(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }
}

pub const TEST_DRIVE_ENROLLMENT: &str = "testdrive";

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

#[derive(Debug, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub role: Role,
    pub expires_at: i64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Stamps `iat`/`exp` and signs.
    pub fn issue(&self, mut claims: Claims) -> Result<IssuedSession, AppError> {
        let now = Utc::now();
        claims.iat = now.timestamp();
        claims.exp = (now + self.ttl).timestamp();

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign session: {e}"))?;

        Ok(IssuedSession {
            token,
            role: claims.role,
            expires_at: claims.exp,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected session token: {e}");
                AppError::Unauthorized("Invalid or expired session".to_string())
            })
    }
}

/// Authenticated caller. Rejects missing, invalid, expired or revoked tokens.
#[derive(Debug, Clone)]
pub struct Session(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(AppError::unauthorized)?;

        let claims = state.sessions.verify(token)?;
        if cache::is_session_revoked(state.cache.as_ref(), claims.sid).await? {
            return Err(AppError::Unauthorized("Session has been logged out".to_string()));
        }
        Ok(Session(claims))
    }
}

impl Session {
    pub fn claims(&self) -> &Claims {
        &self.0
    }

    pub fn require(&self, roles: &[Role]) -> Result<&Claims, AppError> {
        if roles.contains(&self.0.role) {
            Ok(&self.0)
        } else {
            Err(AppError::Forbidden(
                "You do not have access to this page".to_string(),
            ))
        }
    }

    pub fn is_test_drive(&self) -> bool {
        self.0.role == Role::TestDrive
    }

    pub fn teacher_id(&self) -> Result<i64, AppError> {
        self.require(&[Role::Teacher])?
            .teacher_id
            .ok_or_else(AppError::unauthorized)
    }

    /// Database id of a real student. Test-drive sessions have none.
    pub fn student_id(&self) -> Result<i64, AppError> {
        self.require(&[Role::Student])?
            .student_id
            .ok_or_else(AppError::unauthorized)
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require(&[Role::Admin]).map(|_| ())
    }

    pub fn require_student_or_test_drive(&self) -> Result<&Claims, AppError> {
        self.require(&[Role::Student, Role::TestDrive])
    }
}

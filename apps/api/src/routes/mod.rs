pub mod health;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, auth, bloom, students, teachers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/stats", get(stats::stats_handler))
        // Auth
        .route(
            "/api/v1/auth/google",
            get(auth::handlers::handle_google_login),
        )
        .route(
            "/api/v1/auth/callback",
            get(auth::handlers::handle_google_callback),
        )
        .route(
            "/api/v1/auth/verify-otp",
            post(auth::handlers::handle_verify_otp),
        )
        .route("/api/v1/auth/logout", post(auth::handlers::handle_logout))
        // Teachers
        .route(
            "/api/v1/teachers/register",
            post(teachers::handlers::handle_register),
        )
        .route(
            "/api/v1/teachers/login",
            post(teachers::handlers::handle_login),
        )
        .route(
            "/api/v1/teachers/dashboard",
            get(teachers::handlers::handle_dashboard),
        )
        .route(
            "/api/v1/teachers/students",
            get(teachers::handlers::handle_list_students),
        )
        .route(
            "/api/v1/teachers/students/:id/report",
            get(teachers::handlers::handle_student_report),
        )
        .route(
            "/api/v1/questions/classify",
            post(bloom::handlers::handle_classify_questions),
        )
        // Admin
        .route("/api/v1/admin/login", post(admin::handlers::handle_login))
        .route(
            "/api/v1/admin/dashboard",
            get(admin::handlers::handle_dashboard),
        )
        .route(
            "/api/v1/admin/students/upload",
            post(admin::handlers::handle_upload_roster),
        )
        // Students
        .route(
            "/api/v1/students/register",
            post(students::handlers::handle_register),
        )
        .route(
            "/api/v1/students/login",
            post(students::handlers::handle_login),
        )
        .route(
            "/api/v1/students/dashboard",
            get(students::handlers::handle_dashboard),
        )
        .route(
            "/api/v1/students/assessment",
            get(students::handlers::handle_assessment_layout)
                .post(students::handlers::handle_submit_assessment),
        )
        .route(
            "/api/v1/students/assessment/results",
            get(students::handlers::handle_assessment_results),
        )
        .route(
            "/api/v1/students/report",
            get(students::handlers::handle_view_report)
                .post(students::handlers::handle_generate_report),
        )
        .route(
            "/api/v1/students/feedback",
            post(students::handlers::handle_feedback),
        )
        .with_state(state)
}

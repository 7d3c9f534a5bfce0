//! Queries against the students, teachers and student_feedback tables.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::guidance::aq::AqScores;
use crate::models::feedback::FeedbackRow;
use crate::models::student::{StudentRow, StudentSummary};
use crate::models::teacher::{TeacherRow, TeacherSummary};

const STUDENT_COLUMNS: &str = "id, enrollment_no, email, teacher_id, user_id, aq_score, \
     control_score, ownership_score, reach_score, endurance_score, attitude_score, \
     skills, career_suggestion";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_students: i64,
    pub assessments_completed: i64,
    pub total_teachers: i64,
}

pub async fn stats(pool: &PgPool) -> Result<Stats, sqlx::Error> {
    let (total_students, assessments_completed, total_teachers): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM students),
            (SELECT COUNT(*) FROM students WHERE aq_score > 0),
            (SELECT COUNT(*) FROM teachers)
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(Stats {
        total_students,
        assessments_completed,
        total_teachers,
    })
}

pub async fn student_by_id(pool: &PgPool, id: i64) -> Result<Option<StudentRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentRow>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1 LIMIT 1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn student_by_email(pool: &PgPool, email: &str) -> Result<Option<StudentRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentRow>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1 ORDER BY id LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn student_by_enrollment(
    pool: &PgPool,
    enrollment_no: &str,
) -> Result<Option<StudentRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentRow>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE enrollment_no = $1 ORDER BY id LIMIT 1"
    ))
    .bind(enrollment_no)
    .fetch_optional(pool)
    .await
}

pub async fn link_student_user(pool: &PgPool, id: i64, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE students SET user_id = $1 WHERE id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn students_for_teacher(
    pool: &PgPool,
    teacher_id: i64,
) -> Result<Vec<StudentSummary>, sqlx::Error> {
    sqlx::query_as::<_, StudentSummary>(
        "SELECT id, enrollment_no, aq_score FROM students WHERE teacher_id = $1 ORDER BY enrollment_no",
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}

pub async fn all_enrollments(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT enrollment_no FROM students ORDER BY enrollment_no")
        .fetch_all(pool)
        .await
}

pub async fn save_scores(pool: &PgPool, id: i64, scores: &AqScores) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE students
        SET aq_score = $1, control_score = $2, ownership_score = $3,
            reach_score = $4, endurance_score = $5, attitude_score = $6
        WHERE id = $7
        "#,
    )
    .bind(scores.aq_score)
    .bind(scores.control_score)
    .bind(scores.ownership_score)
    .bind(scores.reach_score)
    .bind(scores.endurance_score)
    .bind(scores.attitude_score)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn save_report(
    pool: &PgPool,
    id: i64,
    skills: &str,
    career_suggestion: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE students SET skills = $1, career_suggestion = $2 WHERE id = $3")
        .bind(skills)
        .bind(career_suggestion)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn teacher_by_email(pool: &PgPool, email: &str) -> Result<Option<TeacherRow>, sqlx::Error> {
    sqlx::query_as::<_, TeacherRow>(
        "SELECT id, name, email, subject, user_id FROM teachers WHERE email = $1 ORDER BY id LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn teacher_by_user_id(pool: &PgPool, user_id: Uuid) -> Result<Option<TeacherRow>, sqlx::Error> {
    sqlx::query_as::<_, TeacherRow>(
        "SELECT id, name, email, subject, user_id FROM teachers WHERE user_id = $1 LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn link_teacher_user(pool: &PgPool, id: i64, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE teachers SET user_id = $1 WHERE id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn all_teachers(pool: &PgPool) -> Result<Vec<TeacherSummary>, sqlx::Error> {
    sqlx::query_as::<_, TeacherSummary>("SELECT id, name FROM teachers ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn has_feedback(pool: &PgPool, student_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM student_feedback WHERE student_id = $1)")
        .bind(student_id)
        .fetch_one(pool)
        .await
}

pub struct NewFeedback<'a> {
    pub student_id: i64,
    pub aq_accuracy_rating: i32,
    pub career_relevance_rating: i32,
    pub top_trait_agreement: bool,
    pub comments: Option<&'a str>,
}

pub async fn insert_feedback(pool: &PgPool, feedback: &NewFeedback<'_>) -> Result<FeedbackRow, sqlx::Error> {
    sqlx::query_as::<_, FeedbackRow>(
        r#"
        INSERT INTO student_feedback
            (student_id, aq_accuracy_rating, career_relevance_rating, top_trait_agreement, comments)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, student_id, aq_accuracy_rating, career_relevance_rating,
                  top_trait_agreement, comments, created_at
        "#,
    )
    .bind(feedback.student_id)
    .bind(feedback.aq_accuracy_rating)
    .bind(feedback.career_relevance_rating)
    .bind(feedback.top_trait_agreement)
    .bind(feedback.comments)
    .fetch_one(pool)
    .await
}

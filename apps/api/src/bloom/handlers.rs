use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::bloom::sheet::{QuestionSheet, SheetError};
use crate::errors::AppError;
use crate::session::Session;
use crate::state::AppState;
use crate::uploads::{archive_upload, read_sheet_form};

#[derive(Debug, Serialize)]
pub struct ClassifiedSheet {
    pub archive_key: String,
    pub sheet: QuestionSheet,
}

/// POST /api/v1/questions/classify
/// Multipart `file` (.csv or .xlsx) with a `question` column; every row gets a `predicted_level`.
pub async fn handle_classify_questions(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Json<ClassifiedSheet>, AppError> {
    let teacher_id = session.teacher_id()?;

    let form = read_sheet_form(multipart).await?;
    let archive_key = archive_upload(&state.s3, &state.config.s3_bucket, "questions", &form.file).await?;

    let mut sheet = QuestionSheet::from_table(form.file.table()?)
        .map_err(|e: SheetError| AppError::Validation(e.to_string()))?;

    let mut predictions = Vec::with_capacity(sheet.rows.len());
    for question in sheet.questions() {
        let level = state
            .classifier
            .classify(question)
            .await
            .map_err(|e| AppError::Classifier(e.to_string()))?;
        predictions.push(level);
    }
    sheet.set_predictions(predictions);

    info!(
        "Teacher {teacher_id} classified {} questions from {}",
        sheet.rows.len(),
        form.file.filename
    );
    Ok(Json(ClassifiedSheet { archive_key, sheet }))
}

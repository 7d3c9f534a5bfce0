use serde::Serialize;
use thiserror::Error;

use crate::uploads::SheetTable;

pub const QUESTION_COLUMN: &str = "question";
pub const PREDICTION_COLUMN: &str = "predicted_level";

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("The uploaded file must contain a column named \"question\".")]
    MissingQuestionColumn,
}

/// A question sheet as uploaded: headers plus string cells, row order kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionSheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QuestionSheet {
    pub fn from_table(table: SheetTable) -> Result<Self, SheetError> {
        if table.column(QUESTION_COLUMN).is_none() {
            return Err(SheetError::MissingQuestionColumn);
        }
        Ok(Self {
            columns: table.columns,
            rows: table.rows,
        })
    }

    fn question_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c == QUESTION_COLUMN)
    }

    pub fn questions(&self) -> Vec<&str> {
        match self.question_index() {
            Some(i) => self
                .rows
                .iter()
                .map(|row| row.get(i).map(String::as_str).unwrap_or(""))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Appends (or overwrites) the `predicted_level` column.
    pub fn set_predictions(&mut self, predictions: Vec<String>) {
        let index = match self.columns.iter().position(|c| c == PREDICTION_COLUMN) {
            Some(i) => i,
            None => {
                self.columns.push(PREDICTION_COLUMN.to_string());
                self.columns.len() - 1
            }
        };

        for (row, prediction) in self.rows.iter_mut().zip(predictions) {
            if row.len() <= index {
                row.resize(index + 1, String::new());
            }
            row[index] = prediction;
        }
    }
}

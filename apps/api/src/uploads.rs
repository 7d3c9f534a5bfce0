//! Uploaded spreadsheet handling: extension checks, safe names, parsing
//! into a header-plus-rows table, S3 archive.

use std::collections::HashMap;
use std::io::Cursor;

use aws_sdk_s3::primitives::ByteStream;
use axum::extract::Multipart;
use bytes::Bytes;
use calamine::{open_workbook_from_rs, Reader, Xlsx, XlsxError};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

/// A file pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub format: SheetFormat,
    pub bytes: Bytes,
}

pub fn allowed_extension(filename: &str) -> Option<SheetFormat> {
    let (_, ext) = filename.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "csv" => Some(SheetFormat::Csv),
        "xlsx" => Some(SheetFormat::Xlsx),
        _ => None,
    }
}

/// Keeps ASCII alphanumerics, `.`, `_` and `-`; whitespace becomes `_`;
/// leading dots and underscores are stripped.
pub fn secure_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// A multipart form carrying one sheet plus plain text fields.
#[derive(Debug, Clone)]
pub struct SheetForm {
    pub file: UploadedFile,
    pub fields: HashMap<String, String>,
}

/// Reads the `file` field and any text fields. The file must have a name
/// with an allowed extension.
pub async fn read_sheet_form(mut multipart: Multipart) -> Result<SheetForm, AppError> {
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name != "file" {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Malformed field '{name}': {e}")))?;
            fields.insert(name, value);
            continue;
        }

        let filename = field.file_name().map(str::to_string).unwrap_or_default();
        if filename.is_empty() {
            return Err(AppError::Validation("No file selected.".to_string()));
        }
        let format = allowed_extension(&filename).ok_or_else(|| {
            AppError::Validation("Invalid file type. Please upload a .csv or .xlsx file.".to_string())
        })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        file = Some(UploadedFile {
            filename: secure_filename(&filename),
            format,
            bytes,
        });
    }

    let file = file.ok_or_else(|| AppError::Validation("No file part selected in the form.".to_string()))?;
    Ok(SheetForm { file, fields })
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Could not read the sheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not read the workbook: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("The workbook has no worksheets.")]
    NoWorksheet,
}

impl From<TableError> for AppError {
    fn from(e: TableError) -> Self {
        AppError::UnprocessableEntity(e.to_string())
    }
}

/// First row as trimmed headers, the rest as string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn from_csv(bytes: &[u8]) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(bytes);

        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<_, _>>()?;

        Ok(Self { columns, rows })
    }

    /// Reads the first worksheet. Whole-number cells print without a
    /// fraction; blank rows are dropped.
    pub fn from_xlsx(bytes: &[u8]) -> Result<Self, TableError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(TableError::NoWorksheet)??;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());
        let columns = rows
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|header| header.trim().to_string())
            .collect();
        let rows = rows
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

impl UploadedFile {
    pub fn table(&self) -> Result<SheetTable, TableError> {
        match self.format {
            SheetFormat::Csv => SheetTable::from_csv(&self.bytes),
            SheetFormat::Xlsx => SheetTable::from_xlsx(&self.bytes),
        }
    }
}

pub fn archive_key(scope: &str, filename: &str) -> String {
    format!("uploads/{scope}/{}-{filename}", Uuid::new_v4())
}

/// Stores a copy of the upload under `uploads/<scope>/`.
pub async fn archive_upload(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    scope: &str,
    file: &UploadedFile,
) -> Result<String, AppError> {
    let key = archive_key(scope, &file.filename);
    let content_type = match file.format {
        SheetFormat::Csv => "text/csv",
        SheetFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    };

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(file.bytes.clone()))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Upload archive failed: {e}")))?;

    info!("Archived upload to s3://{bucket}/{key}");
    Ok(key)
}

//! Buffered multipart forms for catalog uploads.
//!
//! Product, category and banner forms mix text fields with image files.
//! The whole form is read up front so handlers can validate text before any
//! backend call, and so the files can be replayed after a token refresh.

use std::collections::HashMap;

use axum::extract::Multipart;
use shopbag_backend::FilePart;

use crate::error::{AppError, Result};

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<FilePart>>,
}

impl UploadForm {
    /// Drain every part of the request.
    ///
    /// File inputs the browser submits without a selection (empty name and
    /// body) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for malformed bodies or non-UTF-8 text fields.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(String::from) else {
                continue;
            };
            match field.file_name().map(String::from) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.push_file(
                        name,
                        FilePart {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await?;
                    form.push_text(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: FilePart) {
        self.files.entry(name.into()).or_default().push(file);
    }

    /// First value of a text field, trimmed. Missing fields read as empty.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map_or("", |v| v.trim())
    }

    /// Every value of a repeated field, such as checked checkboxes.
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<String> {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Parse a required integer field.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` naming the field when it is blank or not a number.
    pub fn integer(&self, name: &str, label: &str) -> Result<i64> {
        self.text(name)
            .replace(',', "")
            .parse()
            .map_err(|_| AppError::BadRequest(format!("{label} must be a number")))
    }

    pub fn take_files(&mut self, name: &str) -> Vec<FilePart> {
        self.files.remove(name).unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<FilePart> {
        self.take_files(name).into_iter().next()
    }
}

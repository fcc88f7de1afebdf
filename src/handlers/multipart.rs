/// Multipart form collection for upload endpoints.
///
/// Buffers every field into memory under a configurable size cap; uploads
/// are relayed to the media store straight from the buffer, so there is no
/// temp file to clean up on failure paths.
use crate::error::{AppError, Result};
use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use std::collections::HashMap;

#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A fully-read multipart form: text fields plus uploaded files.
#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    pub fn require_text(&self, name: &str) -> Result<&str> {
        self.text(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation(format!("field '{name}' is required")))
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn require_file(&mut self, name: &str) -> Result<UploadedFile> {
        self.take_file(name)
            .ok_or_else(|| AppError::Validation(format!("file '{name}' is required")))
    }
}

/// Drain a multipart payload into a `FormData`, rejecting any single file
/// larger than `max_bytes`.
pub async fn collect(mut payload: Multipart, max_bytes: usize) -> Result<FormData> {
    let mut form = FormData::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart payload: {e}")))?
    {
        let (name, filename) = {
            let disposition = field.content_disposition().ok_or_else(|| {
                AppError::Validation("multipart field missing content disposition".to_string())
            })?;
            let name = disposition
                .get_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("multipart field missing name".to_string()))?;
            (name, disposition.get_filename().map(str::to_string))
        };
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::Validation(format!("failed reading field '{name}': {e}")))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::Validation(format!(
                    "field '{name}' exceeds the {max_bytes} byte upload limit"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) => {
                form.files.insert(
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        bytes,
                    },
                );
            }
            None => {
                let value = String::from_utf8(bytes).map_err(|_| {
                    AppError::Validation(format!("field '{name}' is not valid UTF-8"))
                })?;
                form.texts.insert(name, value);
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_rejects_blank_values() {
        let mut form = FormData::default();
        form.texts.insert("title".into(), "   ".into());
        assert!(form.require_text("title").is_err());
        assert!(form.require_text("missing").is_err());

        form.texts.insert("name".into(), " ok ".into());
        assert_eq!(form.require_text("name").unwrap(), "ok");
    }

    #[test]
    fn take_file_removes_the_entry() {
        let mut form = FormData::default();
        form.files.insert(
            "avatar".into(),
            UploadedFile {
                filename: "a.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            },
        );
        assert!(form.take_file("avatar").is_some());
        assert!(form.take_file("avatar").is_none());
        assert!(form.require_file("avatar").is_err());
    }
}

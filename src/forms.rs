use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::error::ServiceError;
use crate::files::Upload;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A multipart body read to the end: text fields by name (a name may repeat)
/// and file parts by name.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, Upload>,
}

impl FormData {
    pub async fn read(mut payload: Multipart) -> Result<Self, ServiceError> {
        let mut form = FormData::default();
        let mut total = 0usize;

        while let Some(field) = payload.next().await {
            let mut field = field.map_err(|e| ServiceError::Validation(format!("malformed multipart body: {e}")))?;
            let disposition = field.content_disposition().clone();
            let name = disposition.get_name().unwrap_or_default().to_string();
            let file_name = disposition.get_filename().map(str::to_string);

            let mut content = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| ServiceError::Validation(format!("malformed multipart body: {e}")))?;
                total += chunk.len();
                if total > MAX_UPLOAD_BYTES {
                    return Err(ServiceError::Validation(format!(
                        "request body exceeds {MAX_UPLOAD_BYTES} bytes"
                    )));
                }
                content.extend_from_slice(&chunk);
            }

            match file_name {
                Some(file_name) => form.push_file(&name, Some(file_name), content),
                None => {
                    let text = String::from_utf8(content)
                        .map_err(|_| ServiceError::Validation(format!("{name} is not valid UTF-8")))?;
                    form.push_field(&name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn push_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.entry(name.to_string()).or_default().push(value.into());
    }

    /// Empty file parts (a form submitted without choosing a file) are dropped.
    pub fn push_file(&mut self, name: &str, file_name: Option<String>, content: Vec<u8>) {
        let file_name = file_name.filter(|n| !n.is_empty());
        if file_name.is_none() && content.is_empty() {
            return;
        }
        self.files.insert(name.to_string(), Upload { file_name, content });
    }

    /// The first value of a field, `None` when absent or empty.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .filter(|value| !value.is_empty())
            .cloned()
    }

    pub fn required(&self, name: &str) -> Result<String, ServiceError> {
        self.text(name)
            .ok_or_else(|| ServiceError::Validation(format!("{name} is required")))
    }

    pub fn flag(&self, name: &str) -> Result<Option<bool>, ServiceError> {
        match self.text(name) {
            None => Ok(None),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(ServiceError::Validation(format!("{name} must be a boolean, got {value:?}"))),
            },
        }
    }

    /// Ids sent as comma separated lists, possibly over several fields with
    /// the same name. Duplicates are dropped, first occurrence wins.
    pub fn ids(&self, name: &str) -> Result<Vec<i32>, ServiceError> {
        let mut ids = Vec::new();
        for value in self.fields.get(name).into_iter().flatten() {
            for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let id: i32 = part
                    .parse()
                    .map_err(|_| ServiceError::Validation(format!("{name} contains a non-numeric id: {part:?}")))?;
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }

    pub fn require_file(&mut self, name: &str) -> Result<Upload, ServiceError> {
        self.take_file(name)
            .ok_or_else(|| ServiceError::Validation(format!("{name} is required")))
    }
}

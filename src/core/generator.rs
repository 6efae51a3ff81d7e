//! Document generation: field prefill, render, store

use crate::core::document::{DocumentRenderer, DocumentTemplate};
use crate::core::error::{EstateResult, FieldValidationError, RenderError, ValidationError};
use crate::core::files::FileStore;
use crate::core::filter::FilterParseMode;
use crate::core::store::with_deadline;
use chrono::{Local, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Result of one generation
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    /// `<prefix>_<millis>_<random>.pdf`, unique per call
    pub suggested_file_name: String,
    /// Path in the file store, when one is configured
    pub stored_path: Option<String>,
    /// Template data after prefill
    pub data: Value,
}

/// Renders records into PDFs. Holds no mutable state; share it freely.
#[derive(Clone)]
pub struct DocumentGenerator {
    renderer: Arc<dyn DocumentRenderer>,
    files: Option<Arc<dyn FileStore>>,
    mode: FilterParseMode,
    timeout: Option<Duration>,
}

impl DocumentGenerator {
    pub fn new(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            renderer,
            files: None,
            mode: FilterParseMode::Lenient,
            timeout: None,
        }
    }

    /// Store generated files in `files`
    pub fn with_file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    /// `Strict` rejects data missing template fields instead of blanking them
    pub fn with_mode(mut self, mode: FilterParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fill every field the template reads.
    ///
    /// `date` defaults to today (`dd/mm/yyyy`). Other missing or null fields
    /// become `""` in lenient mode and are reported in strict mode.
    pub fn prefill(&self, template: &DocumentTemplate, data: &Value) -> EstateResult<Value> {
        let Value::Object(given) = data else {
            return Err(ValidationError::InvalidJson {
                message: "document data must be a JSON object".to_string(),
            }
            .into());
        };

        let mut filled: Map<String, Value> = given.clone();
        let mut missing = Vec::new();
        for field in template.fields {
            let present = filled.get(*field).is_some_and(|v| !v.is_null());
            if present {
                continue;
            }
            if *field == "date" {
                filled.insert(
                    field.to_string(),
                    Value::String(Local::now().format("%d/%m/%Y").to_string()),
                );
            } else if self.mode == FilterParseMode::Strict {
                missing.push(FieldValidationError {
                    field: field.to_string(),
                    message: format!("{} is required", field),
                });
            } else {
                filled.insert(field.to_string(), Value::String(String::new()));
            }
        }

        if !missing.is_empty() {
            return Err(ValidationError::FieldErrors(missing).into());
        }
        Ok(Value::Object(filled))
    }

    /// Render `data` with `template` and store the result when a file store
    /// is configured.
    pub async fn generate(
        &self,
        template: &DocumentTemplate,
        data: &Value,
    ) -> EstateResult<GeneratedDocument> {
        let data = self.prefill(template, data)?;
        let operation = format!("render {}", template.id);

        let bytes = with_deadline(self.timeout, &operation, self.renderer.render(template.id, &data))
            .await?;
        if bytes.is_empty() {
            return Err(RenderError::Pdf("renderer produced no output".to_string()).into());
        }

        let suggested_file_name = format!(
            "{}_{}_{}.pdf",
            template.file_prefix,
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8]
        );

        let stored_path = match &self.files {
            Some(files) => {
                let target = format!("{}/{}", template.output_dir, suggested_file_name);
                let path = files
                    .save(&bytes, &target)
                    .await
                    .map_err(|e| RenderError::Output(e.to_string()))?;
                Some(path)
            }
            None => None,
        };

        tracing::info!(
            template = template.id,
            file = %suggested_file_name,
            bytes = bytes.len(),
            "generated document"
        );

        Ok(GeneratedDocument {
            bytes,
            suggested_file_name,
            stored_path,
            data,
        })
    }
}

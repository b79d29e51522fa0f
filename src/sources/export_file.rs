//! JSON export file source.
//!
//! Accepts the helpdesk's RPC dump (`[{"json": {"result": [...]}}]`) as well
//! as a bare array of message records.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::SourceError;
use crate::pipeline::types::{MessageSource, RawMessage};

/// Reads a message export from disk.
#[derive(Debug, Clone)]
pub struct ExportFileSource {
    path: PathBuf,
    name: String,
}

impl ExportFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

#[async_trait]
impl MessageSource for ExportFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawMessage>, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Read {
                path: self.path.clone(),
                source,
            })?;

        let messages = parse_export(&self.path, &contents)?;
        info!(source = %self.name, messages = messages.len(), "Loaded message export");
        Ok(messages)
    }
}

/// Decode export JSON. `path` is only used for error messages.
pub fn parse_export(path: &Path, contents: &str) -> Result<Vec<RawMessage>, SourceError> {
    let decode = |source: serde_json::Error| SourceError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let shape = |reason: &str| SourceError::UnexpectedShape {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let document: Value = serde_json::from_str(contents).map_err(decode)?;
    let Value::Array(mut items) = document else {
        return Err(shape("top level is not an array"));
    };

    let wrapped = items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|o| o.contains_key("json"));

    let records = if wrapped {
        let mut first = items.swap_remove(0);
        match first.pointer_mut("/json/result").map(Value::take) {
            Some(Value::Array(records)) => records,
            _ => return Err(shape("missing json.result array")),
        }
    } else {
        items
    };

    serde_json::from_value(Value::Array(records)).map_err(decode)
}

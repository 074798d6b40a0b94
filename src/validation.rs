use anyhow::{anyhow, Result};
use std::path::Path;

const MAX_RECORD_ID_LEN: usize = 256;
const MAX_QUERY_LEN: usize = 200;
const MAX_PATH_LEN: usize = 4096;

/// Validation utilities for command-line input
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a record id given for deletion
    pub fn validate_record_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(anyhow!("Record id cannot be empty"));
        }

        if id.chars().count() > MAX_RECORD_ID_LEN {
            return Err(anyhow!("Record id too long (max {} characters)", MAX_RECORD_ID_LEN));
        }

        if id.chars().any(char::is_control) {
            return Err(anyhow!("Record id contains invalid characters"));
        }

        Ok(())
    }

    /// Strip control characters and surrounding whitespace from search text
    #[must_use]
    pub fn sanitize_query(query: &str) -> String {
        query
            .chars()
            .filter(|c| !c.is_control())
            .take(MAX_QUERY_LEN)
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate an export destination
    pub fn validate_export_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        // Check for path traversal attempts
        if path_str.contains("..") {
            return Err(anyhow!("File path contains potentially dangerous characters"));
        }

        if path_str.len() > MAX_PATH_LEN {
            return Err(anyhow!("File path too long (max {} characters)", MAX_PATH_LEN));
        }

        Ok(())
    }
}

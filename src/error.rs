use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unreadable file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Missing required column '{column}' in {context}")]
    MissingColumn { column: String, context: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Record validation error: {0}")]
    Validator(#[from] validator::ValidationErrors),
}

impl PipelineError {
    /// Missing-timestamp gate for the reshape stage: reports the offending
    /// 1-based row numbers so the source file can be fixed by hand.
    pub fn null_timestamps(rows: &[usize]) -> Self {
        let shown: Vec<String> = rows.iter().take(20).map(|r| r.to_string()).collect();
        let suffix = if rows.len() > shown.len() {
            format!(" (and {} more)", rows.len() - shown.len())
        } else {
            String::new()
        };
        PipelineError::Validation(format!(
            "{} observation(s) have a missing or unreadable timestamp, rows: {}{}",
            rows.len(),
            shown.join(", "),
            suffix
        ))
    }
}

use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// Checkpoint writer: every stage materializes its output as CSV before the
/// next stage starts, so intermediate tables can be inspected and the
/// pipeline resumed by hand after a failure.
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_records<T: Serialize>(&self, records: &[T], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if records.is_empty() {
            tracing::warn!("{}: writing an empty table", path.display());
        }

        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::info!("{}: wrote {} row(s)", path.display(), records.len());
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Row {
        #[serde(rename = "Code Postal")]
        postal: String,
        #[serde(rename = "Population")]
        population: Option<u64>,
    }

    #[test]
    fn test_writes_renamed_headers_and_empty_for_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![
            Row {
                postal: "75001".to_string(),
                population: Some(100),
            },
            Row {
                postal: "69001".to_string(),
                population: None,
            },
        ];

        CsvWriter::new().write_records(&rows, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Code Postal,Population\n75001,100\n69001,\n");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deep/out.csv");
        let rows = vec![Row {
            postal: "75001".to_string(),
            population: Some(1),
        }];

        CsvWriter::new().write_records(&rows, &path).unwrap();
        assert!(path.exists());
    }
}

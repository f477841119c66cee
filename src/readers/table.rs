use crate::error::{PipelineError, Result};
use encoding_rs::Encoding;
use std::path::{Path, PathBuf};

/// A loaded delimited file: header labels plus string rows. Typed models are
/// built from this by the per-stage `from_table` constructors.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub skipped_rows: usize,
    pub source: PathBuf,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }

    /// Resolve a column that downstream logic cannot do without. Absence means
    /// the rename map upstream no longer matches the source schema.
    pub fn require_column(&self, label: &str) -> Result<usize> {
        self.column_index(label)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: label.to_string(),
                context: self
                    .source
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.source.display().to_string()),
            })
    }

    /// Trimmed field accessor; out-of-range indexes read as empty.
    pub fn field<'a>(&self, row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(|s| s.trim()).unwrap_or("")
    }
}

/// Delimited-file reader with explicit encoding and delimiter. Malformed rows
/// (wrong field count) are skipped and counted, never fatal; a header that
/// collapses into one giant column is treated as a wrong-delimiter load and
/// rejected outright.
pub struct TableReader {
    encoding: &'static Encoding,
    delimiter: u8,
}

impl TableReader {
    /// Comma-delimited UTF-8 source.
    pub fn utf8() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
            delimiter: b',',
        }
    }

    /// Comma-delimited Latin-1-family source (decoded as windows-1252, the
    /// superset pandas' ISO-8859-1 reads collapse into in practice).
    pub fn latin1() -> Self {
        Self {
            encoding: encoding_rs::WINDOWS_1252,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn read(&self, path: &Path) -> Result<RawTable> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path)?;
        // No BOM sniffing: a UTF-8 marker read as Latin-1 must surface as the
        // literal `ï»¿` artifact so the Key Normalizer can strip it, exactly
        // like the source files behave in spreadsheet round-trips.
        let (text, had_errors) = self.encoding.decode_without_bom_handling(&bytes);
        if had_errors {
            tracing::warn!(
                "{}: some bytes could not be decoded as {} and were replaced",
                path.display(),
                self.encoding.name()
            );
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| PipelineError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        self.check_delimiter(&headers, path)?;

        let mut rows = Vec::new();
        let mut skipped_rows = 0usize;
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| PipelineError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            if record.len() != headers.len() {
                skipped_rows += 1;
                tracing::warn!(
                    "{}: skipping malformed row {} ({} fields, expected {})",
                    path.display(),
                    i + 2,
                    record.len(),
                    headers.len()
                );
                continue;
            }
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        if skipped_rows > 0 {
            tracing::warn!(
                "{}: {} malformed row(s) skipped",
                path.display(),
                skipped_rows
            );
        }

        Ok(RawTable {
            headers,
            rows,
            skipped_rows,
            source: path.to_path_buf(),
        })
    }

    /// A single-column header still containing another candidate delimiter
    /// means the whole file parsed into one unusable column.
    fn check_delimiter(&self, headers: &[String], path: &Path) -> Result<()> {
        if headers.len() == 1 {
            let other = [b',', b';']
                .into_iter()
                .find(|d| *d != self.delimiter)
                .unwrap_or(b',') as char;
            if headers[0].contains(other) {
                return Err(PipelineError::Parse {
                    path: path.to_path_buf(),
                    message: format!(
                        "header collapsed to a single column; was the file delimited by '{}' instead of '{}'?",
                        other, self.delimiter as char
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_semicolon_latin1() {
        let mut f = NamedTempFile::new().unwrap();
        // "Café" in Latin-1 plus a semicolon delimiter
        f.write_all(b"Nom;Altitude\nCaf\xe9;120\n").unwrap();

        let table = TableReader::latin1()
            .with_delimiter(b';')
            .read(f.path())
            .unwrap();
        assert_eq!(table.headers, vec!["Nom", "Altitude"]);
        assert_eq!(table.rows, vec![vec!["Café".to_string(), "120".to_string()]]);
    }

    #[test]
    fn test_utf8_bom_surfaces_as_artifact_under_latin1() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"\xef\xbb\xbfCode INSEE;Commune\n75056;Paris\n")
            .unwrap();

        let table = TableReader::latin1()
            .with_delimiter(b';')
            .read(f.path())
            .unwrap();
        assert_eq!(table.headers[0], "ï»¿Code INSEE");
    }

    #[test]
    fn test_malformed_rows_are_skipped_and_counted() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"a,b,c\n1,2,3\n1,2\n4,5,6\n").unwrap();

        let table = TableReader::utf8().read(f.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.skipped_rows, 1);
    }

    #[test]
    fn test_missing_file_is_file_not_found() {
        let err = TableReader::utf8()
            .read(Path::new("/nonexistent/input.csv"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound { .. }));
    }

    #[test]
    fn test_wrong_delimiter_is_a_parse_error() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"a;b;c\n1;2;3\n").unwrap();

        let err = TableReader::utf8().read(f.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }

    #[test]
    fn test_require_column() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"a,b\n1,2\n").unwrap();

        let table = TableReader::utf8().read(f.path()).unwrap();
        assert!(table.require_column("a").is_ok());
        let err = table.require_column("Code INSEE").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }
}

//! CSV import for [`EventLog`]

use std::{
    collections::BTreeMap,
    fmt::Display,
    io::{BufReader, Read},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::event_log_struct::{Activity, EventLog, Trace};
use crate::core::io::{ExtensionWithMime, Importable};

/// Error type for [`EventLog`] IO operations
#[derive(Debug)]
pub enum EventLogIOError {
    /// IO Error
    Io(std::io::Error),
    /// CSV Parsing Error
    Csv(csv::Error),
    /// JSON Parsing Error
    Json(serde_json::Error),
    /// A configured column is not present in a record
    MissingColumn {
        /// Line number of the record (1-based, including a header line)
        line: u64,
        /// Index of the missing column
        column: usize,
    },
    /// Unsupported Format
    UnsupportedFormat(String),
}

impl Display for EventLogIOError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventLogIOError::Io(e) => write!(f, "IO Error: {}", e),
            EventLogIOError::Csv(e) => write!(f, "CSV Error: {}", e),
            EventLogIOError::Json(e) => write!(f, "JSON Error: {}", e),
            EventLogIOError::MissingColumn { line, column } => {
                write!(f, "Missing column {column} at line {line}")
            }
            EventLogIOError::UnsupportedFormat(s) => write!(f, "Unsupported Format: {}", s),
        }
    }
}

impl std::error::Error for EventLogIOError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EventLogIOError::Io(e) => Some(e),
            EventLogIOError::Csv(e) => Some(e),
            EventLogIOError::Json(e) => Some(e),
            EventLogIOError::MissingColumn { .. } | EventLogIOError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for EventLogIOError {
    fn from(e: std::io::Error) -> Self {
        EventLogIOError::Io(e)
    }
}

impl From<csv::Error> for EventLogIOError {
    fn from(e: csv::Error) -> Self {
        EventLogIOError::Csv(e)
    }
}

impl From<serde_json::Error> for EventLogIOError {
    fn from(e: serde_json::Error) -> Self {
        EventLogIOError::Json(e)
    }
}

/// Options for CSV [`EventLog`] import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvImportOptions {
    /// Index of the case identifier column
    pub case_column: usize,
    /// Index of the activity column
    pub activity_column: usize,
    /// Field delimiter
    pub delimiter: u8,
    /// Whether the first record is a header
    pub has_headers: bool,
}

impl Default for CsvImportOptions {
    fn default() -> Self {
        Self {
            case_column: 0,
            activity_column: 1,
            delimiter: b',',
            has_headers: true,
        }
    }
}

///
/// Import an [`EventLog`] from CSV data
///
/// Each record is one event. Events of a case keep the order in which they appear in the file.
///
pub fn import_csv<R: Read>(reader: R, options: CsvImportOptions) -> Result<EventLog, EventLogIOError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_headers)
        .flexible(true)
        .from_reader(reader);
    let mut traces: BTreeMap<String, Trace> = BTreeMap::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let case_id = record
            .get(options.case_column)
            .ok_or(EventLogIOError::MissingColumn {
                line,
                column: options.case_column,
            })?;
        let activity = record
            .get(options.activity_column)
            .ok_or(EventLogIOError::MissingColumn {
                line,
                column: options.activity_column,
            })?;
        traces
            .entry(case_id.to_string())
            .or_default()
            .push(Activity::from(activity));
    }
    Ok(EventLog::from_traces(traces))
}

impl Importable for EventLog {
    type Error = EventLogIOError;
    type ImportOptions = CsvImportOptions;

    fn import_from_reader_with_options<R: Read>(
        reader: R,
        format: &str,
        options: Self::ImportOptions,
    ) -> Result<Self, Self::Error> {
        match format {
            _ if format.ends_with("csv.gz") => {
                let gz = flate2::read::GzDecoder::new(reader);
                import_csv(BufReader::new(gz), options)
            }
            _ if format.ends_with("csv") => import_csv(BufReader::new(reader), options),
            _ if format.ends_with("json") => Ok(serde_json::from_reader(reader)?),
            _ => Err(EventLogIOError::UnsupportedFormat(format!(
                "{format} (supported: {})",
                Self::known_import_formats()
                    .iter()
                    .map(|f| f.extension.as_str())
                    .join(", ")
            ))),
        }
    }

    fn known_import_formats() -> Vec<ExtensionWithMime> {
        vec![
            ExtensionWithMime::new("csv", "text/csv"),
            ExtensionWithMime::new("csv.gz", "application/gzip"),
            ExtensionWithMime::new("json", "application/json"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::utils::test_utils::get_test_data_path;

    const SAMPLE_CSV: &str = "case_id,activity\n1,register\n1,check\n2,register\n1,decide\n2,decide\n";

    #[test]
    fn csv_keeps_event_order_per_case() {
        let log = import_csv(SAMPLE_CSV.as_bytes(), CsvImportOptions::default()).unwrap();
        assert_eq!(log.num_cases(), 2);
        assert_eq!(log.activities.len(), 3);
        assert_eq!(
            log.flat_log["1"],
            vec!["register".into(), "check".into(), "decide".into()]
        );
        assert_eq!(log.flat_log["2"], vec!["register".into(), "decide".into()]);
    }

    #[test]
    fn csv_with_custom_columns_and_delimiter() {
        let data = "ts;activity;case\n0;a;c1\n1;b;c1\n";
        let log = import_csv(
            data.as_bytes(),
            CsvImportOptions {
                case_column: 2,
                activity_column: 1,
                delimiter: b';',
                has_headers: true,
            },
        )
        .unwrap();
        assert_eq!(log.flat_log["c1"], vec!["a".into(), "b".into()]);
    }

    #[test]
    fn csv_missing_column_is_reported() {
        let data = "case_id,activity\n1\n";
        let res = import_csv(data.as_bytes(), CsvImportOptions::default());
        assert!(matches!(
            res,
            Err(EventLogIOError::MissingColumn { column: 1, .. })
        ));
    }

    #[test]
    fn import_gzipped_csv_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(SAMPLE_CSV.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let log = EventLog::import_from_path(&path).unwrap();
        assert_eq!(log.num_cases(), 2);
    }

    #[test]
    fn import_sample_log_from_test_data() {
        let log = EventLog::import_from_path(get_test_data_path().join("loops.csv")).unwrap();
        assert_eq!(log.num_cases(), 2);
        assert_eq!(log.flat_log["A"].len(), 4);
    }

    #[test]
    fn unsupported_format() {
        let res = EventLog::import_from_bytes(b"", "xes");
        let Err(EventLogIOError::UnsupportedFormat(msg)) = res else {
            panic!("expected unsupported format");
        };
        assert!(msg.starts_with("xes"));
        assert!(msg.contains("csv, csv.gz, json"));
    }

    #[test]
    fn format_is_inferred_from_known_extensions() {
        let infer = |p: &str| EventLog::infer_format(std::path::Path::new(p));
        assert_eq!(infer("logs/Repair.CSV.GZ").as_deref(), Some("csv.gz"));
        assert_eq!(infer("log.csv").as_deref(), Some("csv"));
        assert_eq!(infer("log.json").as_deref(), Some("json"));
        assert_eq!(infer("log.xes").as_deref(), Some("xes"));
        assert_eq!(infer("log"), None);
        let formats = EventLog::known_import_formats();
        assert!(formats
            .iter()
            .any(|f| f.extension == "csv.gz" && f.mime == "application/gzip"));
    }
}

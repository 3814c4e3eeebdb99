//! Record export contract and the built-in JSON exporter.
//!
//! # Responsibility
//! - Define the `trigger(format, rows)` contract shared by all exporters.
//! - Report the outcome of every export through a [`Notifier`].
//!
//! Spreadsheet and PDF renderers live outside this crate and implement
//! [`Exporter`] for their formats.

use crate::model::employee::Employee;
use crate::notify::{NoticeKind, Notifier};
use chrono::Utc;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// One pretty-printed JSON array.
    Json,
    /// One compact JSON object per line.
    JsonLines,
    Spreadsheet,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Spreadsheet => "spreadsheet",
            Self::Pdf => "pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Spreadsheet => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "ndjson" | "json_lines" => Some(Self::JsonLines),
            "spreadsheet" | "xlsx" | "excel" => Some(Self::Spreadsheet),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum ExportError {
    UnsupportedFormat(ExportFormat),
    /// Nothing selected to export.
    EmptySelection,
    Encode(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat(format) => write!(f, "export format `{format}` is not available"),
            Self::EmptySelection => write!(f, "no records selected for export"),
            Self::Encode(err) => write!(f, "cannot encode records: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Rendered export ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub row_count: usize,
}

pub trait Exporter {
    fn supports(&self, format: ExportFormat) -> bool;
    /// Renders `rows` in `format`.
    fn render(&self, format: ExportFormat, rows: &[&Employee]) -> Result<Vec<u8>, ExportError>;
}

/// Exporter for [`ExportFormat::Json`] and [`ExportFormat::JsonLines`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn supports(&self, format: ExportFormat) -> bool {
        matches!(format, ExportFormat::Json | ExportFormat::JsonLines)
    }

    fn render(&self, format: ExportFormat, rows: &[&Employee]) -> Result<Vec<u8>, ExportError> {
        let mut out = Vec::new();
        match format {
            ExportFormat::Json => {
                serde_json::to_writer_pretty(&mut out, rows)?;
                out.push(b'\n');
            }
            ExportFormat::JsonLines => {
                for row in rows {
                    serde_json::to_writer(&mut out, row)?;
                    out.push(b'\n');
                }
            }
            other => return Err(ExportError::UnsupportedFormat(other)),
        }
        Ok(out)
    }
}

/// Runs one export and notifies the user of the outcome.
pub fn trigger_export<E, N>(
    exporter: &E,
    format: ExportFormat,
    rows: &[&Employee],
    notifier: &N,
) -> Result<ExportArtifact, ExportError>
where
    E: Exporter + ?Sized,
    N: Notifier + ?Sized,
{
    let result = render_artifact(exporter, format, rows);
    match &result {
        Ok(artifact) => {
            info!(
                "event=export module=export status=ok format={format} row_count={} byte_count={}",
                artifact.row_count,
                artifact.bytes.len()
            );
            notifier.notify(
                &format!("Exported {} record(s) to {}.", artifact.row_count, artifact.file_name),
                NoticeKind::Success,
            );
        }
        Err(err) => {
            error!("event=export module=export status=error format={format} error={err}");
            notifier.notify(&format!("Export failed: {err}"), NoticeKind::Error);
        }
    }
    result
}

fn render_artifact<E>(
    exporter: &E,
    format: ExportFormat,
    rows: &[&Employee],
) -> Result<ExportArtifact, ExportError>
where
    E: Exporter + ?Sized,
{
    if !exporter.supports(format) {
        return Err(ExportError::UnsupportedFormat(format));
    }
    if rows.is_empty() {
        return Err(ExportError::EmptySelection);
    }
    let bytes = exporter.render(format, rows)?;
    Ok(ExportArtifact {
        format,
        file_name: format!(
            "employees-{}.{}",
            Utc::now().format("%Y%m%d-%H%M%S"),
            format.extension()
        ),
        bytes,
        row_count: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::{trigger_export, ExportError, ExportFormat, Exporter, JsonExporter};
    use crate::model::employee::Employee;
    use crate::notify::{NoticeKind, Notifier};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<NoticeKind>>);

    impl Notifier for Recorder {
        fn notify(&self, _message: &str, kind: NoticeKind) {
            self.0.borrow_mut().push(kind);
        }
    }

    fn rows() -> Vec<Employee> {
        (0..3)
            .map(|index| {
                let mut record = Employee::template();
                record.id = uuid::Uuid::new_v4();
                record.employee_number = format!("E{index}");
                record
            })
            .collect()
    }

    #[test]
    fn json_lines_writes_one_object_per_line() {
        let records = rows();
        let refs: Vec<&Employee> = records.iter().collect();
        let bytes = JsonExporter.render(ExportFormat::JsonLines, &refs).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["employee_number"], "E0");
    }

    #[test]
    fn trigger_reports_success_with_artifact() {
        let records = rows();
        let refs: Vec<&Employee> = records.iter().collect();
        let notifier = Recorder::default();
        let artifact = trigger_export(&JsonExporter, ExportFormat::Json, &refs, &notifier).unwrap();
        assert_eq!(artifact.row_count, 3);
        assert!(artifact.file_name.ends_with(".json"));
        let decoded: Vec<Employee> = serde_json::from_slice(&artifact.bytes).unwrap();
        assert_eq!(decoded, records);
        assert_eq!(*notifier.0.borrow(), vec![NoticeKind::Success]);
    }

    #[test]
    fn unsupported_format_and_empty_selection_notify_errors() {
        let notifier = Recorder::default();
        let records = rows();
        let refs: Vec<&Employee> = records.iter().collect();

        let err = trigger_export(&JsonExporter, ExportFormat::Pdf, &refs, &notifier).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(ExportFormat::Pdf)));

        let err = trigger_export(&JsonExporter, ExportFormat::Json, &[], &notifier).unwrap_err();
        assert!(matches!(err, ExportError::EmptySelection));

        assert_eq!(*notifier.0.borrow(), vec![NoticeKind::Error, NoticeKind::Error]);
    }
}

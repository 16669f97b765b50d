//! Export and import of a user's collections.
//!
//! The JSON export document is also the preferred import format. Imports
//! additionally accept a bare array of bookmark candidates.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{visible, Bookmark, DockItem, Settings};
use crate::validate::{validate_all, validate_bookmark, validate_dock_item};

/// Current export document version. Readers only check that it is present.
pub const EXPORT_VERSION: u32 = 1;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Full export of one user's data. Tombstones are never exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub records: Vec<Bookmark>,
    #[serde(default)]
    pub dock_items: Vec<DockItem>,
    #[serde(default)]
    pub settings: Settings,
    pub export_time: i64,
    pub version: u32,
}

impl ExportDocument {
    #[must_use]
    pub fn new(
        bookmarks: &[Bookmark],
        dock_items: &[DockItem],
        settings: &Settings,
        export_time: i64,
    ) -> Self {
        Self {
            records: visible(bookmarks).cloned().collect(),
            dock_items: dock_items.to_vec(),
            settings: settings.clone(),
            export_time,
            version: EXPORT_VERSION,
        }
    }
}

/// Render the export document as pretty-printed JSON.
pub fn render_json_export(document: &ExportDocument) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}

/// Render bookmarks as a Markdown link list.
#[must_use]
pub fn render_markdown_export(document: &ExportDocument) -> String {
    let mut output = String::from("# Bookmarks\n\n");

    for bookmark in &document.records {
        let _ = write!(
            output,
            "- [{}]({})",
            escape_link_text(&bookmark.name),
            bookmark.url
        );
        for tag in &bookmark.tags {
            let _ = write!(output, " `{tag}`");
        }
        output.push('\n');
        if let Some(note) = &bookmark.note {
            for line in note.lines() {
                let _ = writeln!(output, "  > {line}");
            }
        }
    }

    if !document.dock_items.is_empty() {
        let _ = writeln!(output, "\n## Dock\n");
        for item in &document.dock_items {
            let _ = writeln!(output, "- [{}]({})", escape_link_text(&item.name), item.url);
        }
    }

    output
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

pub fn render_export(document: &ExportDocument, format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(document),
        ExportFormat::Markdown => Ok(render_markdown_export(document)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("homebase-export-{timestamp_ms}.{}", format.extension())
}

/// Summary shown to the user after an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// False only when the input was not a recognizable import document
    pub success: bool,
    pub imported_count: usize,
    pub rejected_count: usize,
}

/// Validated import content, ready to merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    pub report: ImportReport,
    pub bookmarks: Vec<Bookmark>,
    pub dock_items: Vec<DockItem>,
    pub settings: Option<Settings>,
}

impl ImportBatch {
    fn malformed(reason: &str) -> Self {
        tracing::warn!("Rejecting import: {reason}");
        Self::default()
    }
}

/// Parse and validate an import file.
///
/// Individual bad records are dropped and counted. Only input that is not
/// JSON, or JSON of the wrong shape, fails the whole import.
#[must_use]
pub fn parse_import(input: &str) -> ImportBatch {
    let value: Value = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(error) => return ImportBatch::malformed(&format!("not valid JSON ({error})")),
    };

    match value {
        Value::Array(candidates) => {
            let bookmarks = validate_all(&candidates, validate_bookmark);
            ImportBatch {
                report: ImportReport {
                    success: true,
                    imported_count: bookmarks.accepted.len(),
                    rejected_count: bookmarks.rejected,
                },
                bookmarks: bookmarks.accepted,
                ..ImportBatch::default()
            }
        }
        Value::Object(document) => {
            let Some(Value::Array(records)) = document.get("records") else {
                return ImportBatch::malformed("document has no records array");
            };
            if !document.contains_key("version") {
                tracing::debug!("Import document has no version field");
            }

            let bookmarks = validate_all(records, validate_bookmark);
            let dock = match document.get("dockItems") {
                Some(Value::Array(items)) => validate_all(items, validate_dock_item),
                _ => Default::default(),
            };
            let settings = document
                .get("settings")
                .and_then(|raw| match serde_json::from_value(raw.clone()) {
                    Ok(settings) => Some(settings),
                    Err(error) => {
                        tracing::warn!("Ignoring malformed settings in import: {error}");
                        None
                    }
                });

            ImportBatch {
                report: ImportReport {
                    success: true,
                    imported_count: bookmarks.accepted.len() + dock.accepted.len(),
                    rejected_count: bookmarks.rejected + dock.rejected,
                },
                bookmarks: bookmarks.accepted,
                dock_items: dock.accepted,
                settings,
            }
        }
        _ => ImportBatch::malformed("expected an export document or an array"),
    }
}

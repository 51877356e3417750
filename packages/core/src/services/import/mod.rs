//! Document Import
//!
//! Brings documents from an external source into the notebook. Every source
//! is first parsed into [`ImportRecord`]s that reference each other through
//! foreign ids (ids that only mean something inside the source). The
//! [`ImportResolver`] then creates the documents and translates the foreign
//! parent references into local ids.
//!
//! Supported sources:
//!
//! - HTML produced by [`export_all_to_html`](crate::services::export_all_to_html)
//!   (one `.document` container per document)
//! - A single HTML page without containers
//! - A JSON array of records
//! - A markdown outline, where heading depth implies nesting
//! - Leveled records built by a host

mod html;
mod markdown;
mod resolver;

pub use resolver::ImportResolver;

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::DocumentId;
use crate::services::error::NotebookError;

/// One document of an import source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Id of the record inside the source
    #[serde(deserialize_with = "deserialize_foreign_id")]
    pub foreign_id: String,

    /// Foreign id of the parent record, `None` for top-level records
    #[serde(default, deserialize_with = "deserialize_optional_foreign_id")]
    pub foreign_parent_id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub position: Option<i64>,
}

impl ImportRecord {
    pub fn new(foreign_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            foreign_id: foreign_id.into(),
            foreign_parent_id: None,
            title: title.into(),
            content: String::new(),
            position: None,
        }
    }

    pub fn with_parent(mut self, foreign_parent_id: impl Into<String>) -> Self {
        self.foreign_parent_id = Some(foreign_parent_id.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Foreign ids may be written as strings or numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum ForeignId {
    Text(String),
    Number(i64),
}

impl From<ForeignId> for String {
    fn from(id: ForeignId) -> Self {
        match id {
            ForeignId::Text(text) => text,
            ForeignId::Number(number) => number.to_string(),
        }
    }
}

fn deserialize_foreign_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ForeignId::deserialize(deserializer)?.into())
}

/// Missing, null and empty-string parents all mean "top level"
fn deserialize_optional_foreign_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<ForeignId>::deserialize(deserializer)?.map(String::from);
    Ok(id.filter(|id| !id.is_empty()))
}

/// A record whose parent is implied by its depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeveledRecord {
    pub level: usize,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Turn a depth-ordered sequence into parent-linked records.
///
/// Each record's parent is the most recent earlier record with a smaller
/// level. Records at the shallowest level seen so far are top level.
pub fn records_from_levels(leveled: Vec<LeveledRecord>) -> Vec<ImportRecord> {
    let mut open: Vec<(usize, String)> = Vec::new();
    let mut records = Vec::with_capacity(leveled.len());

    for (index, entry) in leveled.into_iter().enumerate() {
        while open.last().is_some_and(|(level, _)| *level >= entry.level) {
            open.pop();
        }

        let foreign_id = format!("level-{}", index);
        records.push(ImportRecord {
            foreign_id: foreign_id.clone(),
            foreign_parent_id: open.last().map(|(_, id)| id.clone()),
            title: entry.title,
            content: entry.content,
            position: None,
        });
        open.push((entry.level, foreign_id));
    }

    records
}

/// Where import data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Records(Vec<ImportRecord>),
    Leveled(Vec<LeveledRecord>),
    /// JSON array of [`ImportRecord`] objects
    Json(String),
    /// Bulk export or a single page; `file_name` is the title fallback
    Html {
        markup: String,
        file_name: Option<String>,
    },
    /// Markdown outline; `file_name` titles any text before the first heading
    Markdown {
        text: String,
        file_name: Option<String>,
    },
}

impl ImportSource {
    /// Read a source file, choosing the format by extension
    /// (`.html`/`.htm`, `.md`/`.markdown`, `.json`)
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, NotebookError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let file_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string);

        match extension.as_str() {
            "html" | "htm" => Ok(Self::Html {
                markup: read_source(path).await?,
                file_name,
            }),
            "md" | "markdown" => Ok(Self::Markdown {
                text: read_source(path).await?,
                file_name,
            }),
            "json" => Ok(Self::Json(read_source(path).await?)),
            other => Err(NotebookError::invalid_source(format!(
                "unsupported import format '{}' for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Parse into records plus the per-record failures found while parsing
    pub fn parse(self, default_title: &str) -> Result<ParsedSource, NotebookError> {
        match self {
            Self::Records(records) => Ok(ParsedSource::from_records(records)),
            Self::Leveled(leveled) => Ok(ParsedSource::from_records(records_from_levels(leveled))),
            Self::Json(text) => parse_json(&text),
            Self::Html { markup, file_name } => Ok(html::parse_html(
                &markup,
                file_name.as_deref().unwrap_or(default_title),
            )),
            Self::Markdown { text, file_name } => Ok(ParsedSource::from_records(
                markdown::parse_markdown(&text, file_name.as_deref().unwrap_or(default_title)),
            )),
        }
    }
}

async fn read_source(path: &Path) -> Result<String, NotebookError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| NotebookError::invalid_source(format!("{}: {}", path.display(), e)))
}

/// Records ready for the resolver
#[derive(Debug, Default)]
pub struct ParsedSource {
    pub records: Vec<ImportRecord>,
    pub failures: Vec<ImportRecordError>,
}

impl ParsedSource {
    pub fn from_records(records: Vec<ImportRecord>) -> Self {
        Self {
            records,
            failures: Vec::new(),
        }
    }
}

fn parse_json(text: &str) -> Result<ParsedSource, NotebookError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)
        .map_err(|e| NotebookError::invalid_source(format!("expected a JSON array: {}", e)))?;

    let mut parsed = ParsedSource::default();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<ImportRecord>(value) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                let record = format!("#{}", index);
                tracing::warn!("Skipping import record {}: {}", record, e);
                parsed.failures.push(ImportRecordError {
                    error: NotebookError::import_parse(record.clone(), e.to_string()),
                    record,
                });
            }
        }
    }

    Ok(parsed)
}

/// A record that was skipped
#[derive(Debug)]
pub struct ImportRecordError {
    /// Foreign id, or `#index` when the record had none
    pub record: String,
    pub error: NotebookError,
}

/// Summary of a finished import
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Local ids of created documents, in source order
    pub created_ids: Vec<DocumentId>,
    /// Documents moved under their resolved parent
    pub reparented: usize,
    /// Documents left at the top level because their parent did not resolve
    pub orphaned: Vec<DocumentId>,
    pub failures: Vec<ImportRecordError>,
}

impl ImportReport {
    pub fn created(&self) -> usize {
        self.created_ids.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.orphaned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(level: usize, title: &str) -> LeveledRecord {
        LeveledRecord {
            level,
            title: title.to_string(),
            content: String::new(),
        }
    }

    #[test]
    fn test_records_from_levels() {
        let records = records_from_levels(vec![
            level(1, "A"),
            level(2, "A.1"),
            level(3, "A.1.a"),
            level(2, "A.2"),
            level(1, "B"),
        ]);

        let parents: Vec<_> = records
            .iter()
            .map(|r| r.foreign_parent_id.as_deref())
            .collect();
        assert_eq!(
            parents,
            vec![None, Some("level-0"), Some("level-1"), Some("level-0"), None]
        );
    }

    #[test]
    fn test_records_from_levels_with_skipped_levels() {
        let records = records_from_levels(vec![level(1, "A"), level(3, "Deep"), level(2, "Mid")]);
        assert_eq!(records[1].foreign_parent_id.as_deref(), Some("level-0"));
        // Level 2 closes the level 3 entry and attaches to A
        assert_eq!(records[2].foreign_parent_id.as_deref(), Some("level-0"));
    }

    #[test]
    fn test_json_accepts_numeric_and_string_ids() {
        let json = r#"[
            {"foreign_id": 1, "title": "Root"},
            {"foreign_id": "2", "foreign_parent_id": 1, "title": "Child", "content": "<p>x</p>"},
            {"foreign_id": 3, "foreign_parent_id": null, "title": "Other"},
            {"foreign_id": 4, "foreign_parent_id": "", "title": "Blank parent"}
        ]"#;
        let parsed = parse_json(json).unwrap();
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.records.len(), 4);
        assert_eq!(parsed.records[0].foreign_id, "1");
        assert_eq!(parsed.records[1].foreign_parent_id.as_deref(), Some("1"));
        assert_eq!(parsed.records[2].foreign_parent_id, None);
        assert_eq!(parsed.records[3].foreign_parent_id, None);
    }

    #[test]
    fn test_json_bad_records_are_skipped() {
        let json = r#"[{"foreign_id": 1, "title": "Ok"}, {"title": "No id"}, 7]"#;
        let parsed = parse_json(json).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.failures.len(), 2);
        assert_eq!(parsed.failures[0].record, "#1");
        assert!(matches!(
            parsed.failures[1].error,
            NotebookError::ImportParse { .. }
        ));
    }

    #[test]
    fn test_json_must_be_an_array() {
        assert!(matches!(
            parse_json("{\"foreign_id\": 1}"),
            Err(NotebookError::InvalidSource(_))
        ));
    }

    #[tokio::test]
    async fn test_from_path_rejects_unknown_extension() {
        let result = ImportSource::from_path("notes.docx").await;
        assert!(matches!(result, Err(NotebookError::InvalidSource(_))));
    }
}

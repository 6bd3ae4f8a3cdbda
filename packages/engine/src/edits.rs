//! # Edits
//!
//! Proposed (locate, delete, insert) edits and their ingestion.
//!
//! Two record shapes are accepted:
//!
//! ```json
//! { "id": "cap", "locateText": "6 months", "deleteText": "6 months", "insertText": "12 months" }
//!
//! { "id": "cap", "clause": "Limitation of Liability", "severity": "YELLOW",
//!   "location": { "searchText": "6 months" },
//!   "redline": { "delete": "6 months", "insert": "12 months" } }
//! ```
//!
//! The second is the shape produced by the clause analysis service. Records
//! without an id are numbered `clause-1`, `clause-2`, ... by position.

use crate::errors::EngineResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One proposed edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub id: String,

    /// Text to find; falls back to `delete_text` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locate_text: Option<String>,

    #[serde(default)]
    pub delete_text: String,

    #[serde(default)]
    pub insert_text: String,

    /// Clause label, for logs and reports only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause: Option<String>,
}

impl Edit {
    pub fn new(
        id: impl Into<String>,
        locate_text: impl Into<String>,
        delete_text: impl Into<String>,
        insert_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            locate_text: Some(locate_text.into()),
            delete_text: delete_text.into(),
            insert_text: insert_text.into(),
            clause: None,
        }
    }

    /// Replace `old` with `new`, locating by `old`
    pub fn replace(id: impl Into<String>, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locate_text: None,
            delete_text: old.into(),
            insert_text: new.into(),
            clause: None,
        }
    }

    pub fn with_clause(mut self, clause: impl Into<String>) -> Self {
        self.clause = Some(clause.into());
        self
    }

    /// Text the locator searches for
    pub fn target(&self) -> &str {
        match self.locate_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => &self.delete_text,
        }
    }

    /// Both sides empty: nothing to apply
    pub fn is_noop(&self) -> bool {
        self.delete_text.is_empty() && self.insert_text.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AnalysisLocation {
    #[serde(default, rename = "searchText")]
    search_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AnalysisRedline {
    #[serde(default)]
    delete: Option<String>,
    #[serde(default)]
    insert: Option<String>,
}

/// Record as emitted by the clause analysis service
#[derive(Debug, Clone, Deserialize)]
struct AnalysisRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    clause: Option<String>,
    #[serde(default)]
    location: Option<AnalysisLocation>,
    redline: AnalysisRedline,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    locate_text: Option<String>,
    #[serde(default)]
    delete_text: String,
    #[serde(default)]
    insert_text: String,
    #[serde(default)]
    clause: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EditRecord {
    Analysis(AnalysisRecord),
    Flat(FlatRecord),
}

impl EditRecord {
    fn into_edit(self, index: usize) -> Edit {
        let default_id = || format!("clause-{}", index + 1);
        match self {
            EditRecord::Analysis(record) => Edit {
                id: record.id.filter(|id| !id.is_empty()).unwrap_or_else(default_id),
                locate_text: record.location.and_then(|l| l.search_text),
                delete_text: record.redline.delete.unwrap_or_default(),
                insert_text: record.redline.insert.unwrap_or_default(),
                clause: record.clause,
            },
            EditRecord::Flat(record) => Edit {
                id: record.id.filter(|id| !id.is_empty()).unwrap_or_else(default_id),
                locate_text: record.locate_text,
                delete_text: record.delete_text,
                insert_text: record.insert_text,
                clause: record.clause,
            },
        }
    }
}

/// Ordered list of edits for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new(edits: Vec<Edit>) -> Self {
        Self { edits }
    }

    /// Parse a JSON array of edit records
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let records: Vec<EditRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Read a JSON array of edit records from disk
    pub fn load(path: &Path) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn from_records(records: Vec<EditRecord>) -> Self {
        let edits = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_edit(index))
            .collect();
        Self { edits }
    }

    /// Keep only accepted edits, in their original order
    pub fn retain_accepted<S: AsRef<str>>(&mut self, accepted: &[S]) {
        self.edits
            .retain(|edit| accepted.iter().any(|id| id.as_ref() == edit.id));
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edit> {
        self.edits.iter()
    }

    pub fn as_slice(&self) -> &[Edit] {
        &self.edits
    }
}

impl From<Vec<Edit>> for EditSet {
    fn from(edits: Vec<Edit>) -> Self {
        Self::new(edits)
    }
}

impl<'a> IntoIterator for &'a EditSet {
    type Item = &'a Edit;
    type IntoIter = std::slice::Iter<'a, Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}

//! # Archive Rewriter
//!
//! A document package is a set of named parts. The engine reads the main
//! document part, patches it, writes it back and switches on revision
//! tracking in the settings part:
//!
//! ```text
//! word/document.xml  ──→ Patcher ──→ word/document.xml
//! word/settings.xml  ──→ <w:trackRevisions/> ──→ word/settings.xml
//! ```
//!
//! Packaging (zip) is left to the caller. [`Archive`] holds parts in memory
//! and can be loaded from and written to an unpacked package directory.

use crate::edits::EditSet;
use crate::errors::{EngineResult, PatchError};
use crate::patcher::{PatchOptions, PatchResult, Patcher};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Main document part
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Document settings part
pub const SETTINGS_PART: &str = "word/settings.xml";

const TRACK_REVISIONS: &str = "<w:trackRevisions";
const SETTINGS_CLOSE: &str = "</w:settings>";

/// Key-value store of named parts
pub trait PartStore {
    fn get(&self, name: &str) -> Option<&[u8]>;
    fn put(&mut self, name: &str, bytes: Vec<u8>);
}

/// In-memory document package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every file under `root`; part names are `/`-separated relative paths
    pub fn load_dir(root: &Path) -> EngineResult<Self> {
        let mut archive = Self::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            archive.parts.insert(name, std::fs::read(entry.path())?);
        }

        tracing::debug!(root = %root.display(), parts = archive.parts.len(), "loaded package");
        Ok(archive)
    }

    /// Write every part under `root`, creating directories as needed
    pub fn write_dir(&self, root: &Path) -> EngineResult<()> {
        for (name, bytes) in &self.parts {
            let path = name.split('/').fold(root.to_path_buf(), |path, segment| path.join(segment));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)?;
        }
        Ok(())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl PartStore for Archive {
    fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    fn put(&mut self, name: &str, bytes: Vec<u8>) {
        self.parts.insert(name.to_string(), bytes);
    }
}

impl<K: Into<String>, V: Into<Vec<u8>>> FromIterator<(K, V)> for Archive {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Read a part as UTF-8 text
pub fn read_text_part<S: PartStore + ?Sized>(store: &S, name: &str) -> EngineResult<Option<String>> {
    match store.get(name) {
        None => Ok(None),
        Some(bytes) => String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| PatchError::InvalidEncoding { part: name.to_string() }),
    }
}

/// Ensure settings carry `<w:trackRevisions/>`; returns the settings and
/// whether they changed.
///
/// An existing element switched off with `w:val="false"` (or `0`, `off`)
/// loses that attribute.
pub fn enable_track_revisions(settings: &str) -> (String, bool) {
    if let Some(start) = settings.find(TRACK_REVISIONS) {
        let Some(len) = settings[start..].find('>') else {
            return (settings.to_string(), false);
        };
        let end = start + len + 1;
        let tag = &settings[start..end];
        if !is_switched_off(tag) {
            return (settings.to_string(), false);
        }
        tracing::info!("settings switched revision tracking off; switching it on");
        let enabled = if tag.ends_with("/>") {
            "<w:trackRevisions/>"
        } else {
            "<w:trackRevisions>"
        };
        return ([&settings[..start], enabled, &settings[end..]].concat(), true);
    }
    match settings.find(SETTINGS_CLOSE) {
        Some(pos) => {
            let mut updated = String::with_capacity(settings.len() + 20);
            updated.push_str(&settings[..pos]);
            updated.push_str("<w:trackRevisions/>");
            updated.push_str(&settings[pos..]);
            (updated, true)
        }
        None => {
            tracing::warn!("settings part has no closing tag; revision tracking left unchanged");
            (settings.to_string(), false)
        }
    }
}

fn is_switched_off(tag: &str) -> bool {
    ["false", "0", "off"].iter().any(|value| {
        tag.contains(&format!("w:val=\"{value}\"")) || tag.contains(&format!("w:val='{value}'"))
    })
}

/// Patch the document part of `store` and enable revision tracking.
///
/// Nothing is written unless every edit was either applied or reported.
pub fn redline_archive<S: PartStore + ?Sized>(
    store: &mut S,
    edits: &EditSet,
    options: &PatchOptions,
) -> EngineResult<PatchResult> {
    if edits.is_empty() {
        return Err(PatchError::EmptyEditList);
    }

    let document = read_text_part(store, DOCUMENT_PART)?
        .ok_or_else(|| PatchError::MissingPart { part: DOCUMENT_PART.to_string() })?;
    let settings = read_text_part(store, SETTINGS_PART)?;

    let result = Patcher::new(options)?.run(document, edits)?;
    store.put(DOCUMENT_PART, result.final_content.clone().into_bytes());

    match settings {
        Some(settings) => {
            let (settings, changed) = enable_track_revisions(&settings);
            if changed {
                store.put(SETTINGS_PART, settings.into_bytes());
            }
        }
        None => tracing::warn!("no {} part; tracked changes will not be highlighted by default", SETTINGS_PART),
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_revisions_added_before_close() {
        let (settings, changed) = enable_track_revisions("<w:settings><w:zoom w:percent=\"100\"/></w:settings>");
        assert!(changed);
        assert_eq!(settings, "<w:settings><w:zoom w:percent=\"100\"/><w:trackRevisions/></w:settings>");
    }

    #[test]
    fn test_track_revisions_is_idempotent() {
        let once = enable_track_revisions("<w:settings></w:settings>").0;
        let (twice, changed) = enable_track_revisions(&once);
        assert!(!changed);
        assert_eq!(twice, once);
        assert_eq!(twice.matches("<w:trackRevisions").count(), 1);
    }

    #[test]
    fn test_track_revisions_with_attributes_counts_as_present() {
        let settings = r#"<w:settings><w:trackRevisions w:val="true"/></w:settings>"#;
        assert_eq!(enable_track_revisions(settings), (settings.to_string(), false));
    }

    #[test]
    fn test_switched_off_track_revisions_is_turned_on() {
        let (settings, changed) =
            enable_track_revisions(r#"<w:settings><w:trackRevisions w:val="false"/><w:zoom/></w:settings>"#);
        assert!(changed);
        assert_eq!(settings, "<w:settings><w:trackRevisions/><w:zoom/></w:settings>");

        let (settings, changed) = enable_track_revisions("<w:settings><w:trackRevisions w:val='0'/></w:settings>");
        assert!(changed);
        assert_eq!(settings.matches("<w:trackRevisions").count(), 1);
        assert!(!settings.contains("w:val"));
    }

    #[test]
    fn test_settings_without_close_tag_unchanged() {
        assert_eq!(enable_track_revisions("<w:settings/>"), ("<w:settings/>".to_string(), false));
    }

    #[test]
    fn test_invalid_utf8_part() {
        let archive: Archive = [(DOCUMENT_PART, vec![0xffu8, 0xfe])].into_iter().collect();
        let err = read_text_part(&archive, DOCUMENT_PART).unwrap_err();
        assert!(matches!(err, PatchError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_put_replaces_part() {
        let mut archive = Archive::new();
        archive.put("a.xml", b"one".to_vec());
        archive.put("a.xml", b"two".to_vec());
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.get("a.xml"), Some(&b"two"[..]));
    }
}

//! # Change Renderer
//!
//! Turns a (delete, insert) pair into tracked-change markup.
//!
//! ```text
//! <w:del w:id="N"   w:author=".." w:date=".."><w:r><w:delText>old</w:delText></w:r></w:del>
//! <w:ins w:id="N+1" w:author=".." w:date=".."><w:r><w:t>new</w:t></w:r></w:ins>
//! ```
//!
//! Every edit reserves two identities even when one side is empty, so the
//! identity sequence only depends on how many edits were applied.

use crate::errors::{EngineResult, PatchError};
use crate::markup::escape_text;
use chrono::{DateTime, SecondsFormat, Utc};

/// Identities consumed by one edit
pub const IDENTITIES_PER_EDIT: u64 = 2;

/// Largest `w:id` word processors accept (signed 32-bit)
pub const MAX_IDENTITY: u64 = i32::MAX as u64;

/// Identity after the pair reserved at `identity`.
///
/// Fails when the pair would not fit below [`MAX_IDENTITY`].
pub fn next_identity(identity: u64) -> EngineResult<u64> {
    identity
        .checked_add(IDENTITIES_PER_EDIT)
        .filter(|next| next - 1 <= MAX_IDENTITY)
        .ok_or(PatchError::IdentityOutOfRange { identity })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Deletion,
    Insertion,
}

/// One attributable tracked change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub text: String,
    pub identity: u64,
    pub author: String,
    pub timestamp: String,
}

impl ChangeRecord {
    pub fn to_markup(&self, typographic_apostrophes: bool) -> String {
        let text = escape_text(&self.text, typographic_apostrophes);
        let author = escape_text(&self.author, false);
        match self.kind {
            ChangeKind::Deletion => format!(
                r#"<w:del w:id="{}" w:author="{}" w:date="{}"><w:r><w:delText xml:space="preserve">{}</w:delText></w:r></w:del>"#,
                self.identity, author, self.timestamp, text
            ),
            ChangeKind::Insertion => format!(
                r#"<w:ins w:id="{}" w:author="{}" w:date="{}"><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:ins>"#,
                self.identity, author, self.timestamp, text
            ),
        }
    }
}

/// Attribution shared by every change in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub author: String,
    pub timestamp: String,
}

impl Attribution {
    pub fn new(author: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            author: author.into(),
            timestamp: format_timestamp(at),
        }
    }
}

/// Whole-second UTC instant, e.g. `2024-03-01T09:30:00Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Change records for one edit, deletion first
pub fn change_records(
    delete_text: &str,
    insert_text: &str,
    identity: u64,
    attribution: &Attribution,
) -> EngineResult<Vec<ChangeRecord>> {
    let insertion = next_identity(identity)? - 1;
    let sides = [
        (ChangeKind::Deletion, delete_text, identity),
        (ChangeKind::Insertion, insert_text, insertion),
    ];

    let records = sides
        .into_iter()
        .filter(|(_, text, _)| !text.is_empty())
        .map(|(kind, text, identity)| ChangeRecord {
            kind,
            text: text.to_string(),
            identity,
            author: attribution.author.clone(),
            timestamp: attribution.timestamp.clone(),
        })
        .collect();
    Ok(records)
}

/// Render the markup for one edit
pub fn render_change(
    delete_text: &str,
    insert_text: &str,
    identity: u64,
    attribution: &Attribution,
    typographic_apostrophes: bool,
) -> EngineResult<String> {
    let records = change_records(delete_text, insert_text, identity, attribution)?;
    Ok(records
        .iter()
        .map(|record| record.to_markup(typographic_apostrophes))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn attribution() -> Attribution {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Attribution::new("Reviewer", at)
    }

    #[test]
    fn test_timestamp_is_whole_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 5).unwrap()
            + chrono::Duration::milliseconds(789);
        assert_eq!(format_timestamp(at), "2024-03-01T09:30:05Z");
    }

    #[test]
    fn test_replacement_renders_deletion_then_insertion() {
        let markup = render_change("6 months", "12 months", 7, &attribution(), true).unwrap();
        assert_eq!(
            markup,
            concat!(
                r#"<w:del w:id="7" w:author="Reviewer" w:date="2024-03-01T09:30:00Z"><w:r><w:delText xml:space="preserve">6 months</w:delText></w:r></w:del>"#,
                r#"<w:ins w:id="8" w:author="Reviewer" w:date="2024-03-01T09:30:00Z"><w:r><w:t xml:space="preserve">12 months</w:t></w:r></w:ins>"#,
            )
        );
    }

    #[test]
    fn test_insert_only_still_uses_second_identity() {
        let records = change_records("", "new clause", 3, &attribution()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::Insertion);
        assert_eq!(records[0].identity, 4);
    }

    #[test]
    fn test_delete_only() {
        let records = change_records("old clause", "", 3, &attribution()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::Deletion);
        assert_eq!(records[0].identity, 3);
    }

    #[test]
    fn test_text_is_escaped() {
        let markup = render_change("", "<b> & \"c\"", 1, &attribution(), true).unwrap();
        assert!(markup.contains("&lt;b&gt; &amp; &quot;c&quot;"));
        assert!(!markup.contains("<b>"));
    }

    #[test]
    fn test_identity_pair_must_fit_in_word_range() {
        assert_eq!(next_identity(1).unwrap(), 3);
        assert_eq!(next_identity(MAX_IDENTITY - 1).unwrap(), MAX_IDENTITY + 1);
        assert!(matches!(
            next_identity(MAX_IDENTITY),
            Err(PatchError::IdentityOutOfRange { identity }) if identity == MAX_IDENTITY
        ));
        assert!(next_identity(u64::MAX).is_err());
    }

    #[test]
    fn test_overflowing_identity_is_an_error() {
        let err = render_change("old", "new", u64::MAX, &attribution(), true).unwrap_err();
        assert!(matches!(err, PatchError::IdentityOutOfRange { .. }));
    }
}

//! # Patch Orchestrator
//!
//! Applies an ordered list of edits to one document part.
//!
//! ## Run lifecycle
//!
//! ```text
//! Init ──→ Locating(edit) ──→ Applying(edit) ──┐
//!               │    ↑                          │
//!               │    └──────────────────────────┤
//!               └──→ Skipping(edit) ────────────┘
//!                                               ↓
//!                                             Done
//! ```
//!
//! The content and the identity counter are threaded through each step by
//! value: [`Patcher::apply_edit`] takes both and hands back their successors,
//! so identity allocation is a pure function of the edit history.
//!
//! An edit is either applied whole (both change blocks, recorded applied) or
//! not at all (content and counter unchanged, recorded failed). Later edits
//! see the content as rewritten by earlier ones.

use crate::edits::{Edit, EditSet};
use crate::errors::{EngineResult, PatchError};
use crate::locator::{contains_raw, locate, Location};
use crate::markup::FragmentScanner;
use crate::renderer::{next_identity, render_change, Attribution};
use crate::replacer::{replace_first, SpanMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest target prefix quoted in log lines
const PREVIEW_CHARS: usize = 50;

/// Run-wide settings
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOptions {
    /// Author attributed on every change
    pub author: String,

    /// Identity of the first change in the run
    pub first_identity: u64,

    /// Change date; `None` stamps the current time
    pub timestamp: Option<DateTime<Utc>>,

    /// Render `'` as U+2019 in inserted text
    pub typographic_apostrophes: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            author: "Reviewer".to_string(),
            first_identity: 1,
            timestamp: None,
            typographic_apostrophes: true,
        }
    }
}

impl PatchOptions {
    /// Reject a first identity that leaves no room for a change pair
    pub fn validate(&self) -> EngineResult<()> {
        next_identity(self.first_identity).map(|_| ())
    }
}

/// What happened to one edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EditOutcome {
    /// Applied with deletion identity `identity` and insertion `identity + 1`
    Applied { identity: u64 },
    NotFound,
    /// Present only across several text fragments
    SplitAcrossFragments,
    /// No text to locate
    InvalidTarget,
    /// The deleted text is not part of the located text
    DeleteOutsideTarget,
    /// Both sides empty
    Skipped,
}

impl EditOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EditOutcome::NotFound
                | EditOutcome::SplitAcrossFragments
                | EditOutcome::InvalidTarget
                | EditOutcome::DeleteOutsideTarget
        )
    }
}

/// Outcome of one edit, tagged with its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReport {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause: Option<String>,
    #[serde(flatten)]
    pub outcome: EditOutcome,
}

/// Result of a single edit step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub content: String,
    pub outcome: EditOutcome,
    pub next_identity: u64,
}

/// Result of a whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchResult {
    pub applied_ids: Vec<String>,
    pub failed_ids: Vec<String>,
    pub skipped_ids: Vec<String>,
    pub outcomes: Vec<EditReport>,
    pub final_content: String,
}

impl PatchResult {
    pub fn report(&self) -> PatchReport {
        PatchReport {
            applied: self.applied_ids.len(),
            failed: self.failed_ids.len(),
            skipped: self.skipped_ids.len(),
            applied_ids: self.applied_ids.clone(),
            failed_ids: self.failed_ids.clone(),
            skipped_ids: self.skipped_ids.clone(),
            edits: self.outcomes.clone(),
        }
    }
}

/// Serializable summary of a run, without the content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchReport {
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub applied_ids: Vec<String>,
    pub failed_ids: Vec<String>,
    pub skipped_ids: Vec<String>,
    pub edits: Vec<EditReport>,
}

/// Applies edits to document content
#[derive(Debug, Clone)]
pub struct Patcher {
    scanner: FragmentScanner,
    attribution: Attribution,
    first_identity: u64,
    typographic_apostrophes: bool,
}

impl Patcher {
    pub fn new(options: &PatchOptions) -> EngineResult<Self> {
        options.validate()?;
        let at = options.timestamp.unwrap_or_else(Utc::now);
        Ok(Self {
            scanner: FragmentScanner::new(),
            attribution: Attribution::new(options.author.clone(), at),
            first_identity: options.first_identity,
            typographic_apostrophes: options.typographic_apostrophes,
        })
    }

    /// Apply every edit in order
    pub fn run(&self, content: String, edits: &EditSet) -> EngineResult<PatchResult> {
        if edits.is_empty() {
            return Err(PatchError::EmptyEditList);
        }

        let mut content = content;
        let mut identity = self.first_identity;
        let mut result = PatchResult {
            applied_ids: Vec::new(),
            failed_ids: Vec::new(),
            skipped_ids: Vec::new(),
            outcomes: Vec::with_capacity(edits.len()),
            final_content: String::new(),
        };

        for edit in edits {
            let step = self.apply_edit(content, edit, identity)?;
            content = step.content;
            identity = step.next_identity;

            match step.outcome {
                EditOutcome::Applied { .. } => result.applied_ids.push(edit.id.clone()),
                EditOutcome::Skipped => result.skipped_ids.push(edit.id.clone()),
                _ => result.failed_ids.push(edit.id.clone()),
            }
            result.outcomes.push(EditReport {
                id: edit.id.clone(),
                clause: edit.clause.clone(),
                outcome: step.outcome,
            });
        }

        tracing::info!(
            applied = result.applied_ids.len(),
            failed = result.failed_ids.len(),
            skipped = result.skipped_ids.len(),
            "patch run complete"
        );

        result.final_content = content;
        Ok(result)
    }

    /// Apply one edit, consuming the current content and identity.
    ///
    /// Fails on an internal inconsistency between locator and replacer, or
    /// when `identity` has no room for another change pair; every other
    /// problem is reported through [`Step::outcome`].
    pub fn apply_edit(&self, content: String, edit: &Edit, identity: u64) -> EngineResult<Step> {
        if edit.is_noop() {
            tracing::debug!(edit_id = %edit.id, "skipping edit with nothing to delete or insert");
            return Ok(Step { content, outcome: EditOutcome::Skipped, next_identity: identity });
        }

        let target = edit.target();
        if !target.contains(edit.delete_text.as_str()) {
            tracing::warn!(
                edit_id = %edit.id,
                "could not apply edit: deleted text {:?} is not part of {:?}",
                preview(&edit.delete_text),
                preview(target)
            );
            return Ok(Step { content, outcome: EditOutcome::DeleteOutsideTarget, next_identity: identity });
        }

        let location = match locate(&self.scanner, &content, target, &edit.id) {
            Ok(location) => location,
            Err(PatchError::EmptyTarget { .. }) => {
                tracing::warn!(edit_id = %edit.id, "skipping edit: no search text");
                return Ok(Step { content, outcome: EditOutcome::InvalidTarget, next_identity: identity });
            }
            Err(err) => return Err(err),
        };

        let outcome = match location {
            Location::Direct { .. } => None,
            Location::Reconstructed => Some(EditOutcome::SplitAcrossFragments),
            Location::NotFound => Some(EditOutcome::NotFound),
        };
        if let Some(outcome) = outcome {
            tracing::warn!(
                edit_id = %edit.id,
                ?outcome,
                raw_hit = contains_raw(&content, target),
                "could not apply edit: {:?}",
                preview(target)
            );
            return Ok(Step { content, outcome, next_identity: identity });
        }

        let next = next_identity(identity)?;
        let markup = render_change(
            &edit.delete_text,
            &edit.insert_text,
            identity,
            &self.attribution,
            self.typographic_apostrophes,
        )?;
        // Insert-only edits anchor on the located text instead of removing it
        let mode = if edit.delete_text.is_empty() {
            SpanMode::InsertAfter
        } else {
            SpanMode::Replace(&edit.delete_text)
        };
        let content = replace_first(&self.scanner, &content, target, &markup, mode).ok_or_else(|| {
            PatchError::InvariantViolation {
                edit_id: edit.id.clone(),
                target: target.to_string(),
            }
        })?;

        tracing::info!(
            edit_id = %edit.id,
            clause = edit.clause.as_deref().unwrap_or("-"),
            identity,
            "applied edit"
        );

        Ok(Step {
            content,
            outcome: EditOutcome::Applied { identity },
            next_identity: next,
        })
    }
}

/// Apply `edits` to `content` with a fresh [`Patcher`]
pub fn patch_document(content: String, edits: &EditSet, options: &PatchOptions) -> EngineResult<PatchResult> {
    Patcher::new(options)?.run(content, edits)
}

fn preview(target: &str) -> String {
    if target.chars().count() <= PREVIEW_CHARS {
        target.to_string()
    } else {
        let head: String = target.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MAX_IDENTITY;
    use chrono::TimeZone;

    const CONTENT: &str = "<w:body><w:p><w:r><w:t>Cap Amount: 6 months</w:t></w:r></w:p></w:body>";

    fn patcher() -> Patcher {
        Patcher::new(&PatchOptions {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
            ..PatchOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_apply_edit_advances_identity() {
        let edit = Edit::new("cap", "6 months", "6 months", "12 months");
        let step = patcher().apply_edit(CONTENT.to_string(), &edit, 5).unwrap();

        assert_eq!(step.outcome, EditOutcome::Applied { identity: 5 });
        assert_eq!(step.next_identity, 7);
        assert!(step.content.contains(r#"<w:del w:id="5""#));
        assert!(step.content.contains(r#"<w:ins w:id="6""#));
    }

    #[test]
    fn test_missing_target_keeps_identity_and_content() {
        let edit = Edit::replace("cap", "9 months", "12 months");
        let step = patcher().apply_edit(CONTENT.to_string(), &edit, 5).unwrap();

        assert_eq!(step.outcome, EditOutcome::NotFound);
        assert_eq!(step.next_identity, 5);
        assert_eq!(step.content, CONTENT);
    }

    #[test]
    fn test_noop_edit_is_skipped() {
        let edit = Edit::new("noop", "6 months", "", "");
        let step = patcher().apply_edit(CONTENT.to_string(), &edit, 1).unwrap();

        assert_eq!(step.outcome, EditOutcome::Skipped);
        assert!(!step.outcome.is_failure());
        assert_eq!(step.content, CONTENT);
    }

    #[test]
    fn test_insert_without_locate_text_is_invalid() {
        let edit = Edit::replace("insert-only", "", "new text");
        let step = patcher().apply_edit(CONTENT.to_string(), &edit, 1).unwrap();

        assert_eq!(step.outcome, EditOutcome::InvalidTarget);
        assert!(step.outcome.is_failure());
        assert_eq!(step.next_identity, 1);
    }

    #[test]
    fn test_delete_outside_locate_text_is_a_failure() {
        let edit = Edit::new("cap", "Cap Amount", "6 months", "12 months");
        let step = patcher().apply_edit(CONTENT.to_string(), &edit, 5).unwrap();

        assert_eq!(step.outcome, EditOutcome::DeleteOutsideTarget);
        assert!(step.outcome.is_failure());
        assert_eq!(step.next_identity, 5);
        assert_eq!(step.content, CONTENT);
    }

    #[test]
    fn test_first_identity_validated_at_construction() {
        let options = PatchOptions {
            first_identity: u64::MAX,
            ..PatchOptions::default()
        };
        let err = Patcher::new(&options).unwrap_err();
        assert!(matches!(err, PatchError::IdentityOutOfRange { identity: u64::MAX }));
        assert!(err.is_fatal_input());
    }

    #[test]
    fn test_exhausted_identity_fails_before_rewriting() {
        let edit = Edit::replace("cap", "6 months", "12 months");
        let err = patcher()
            .apply_edit(CONTENT.to_string(), &edit, MAX_IDENTITY)
            .unwrap_err();
        assert!(matches!(err, PatchError::IdentityOutOfRange { .. }));

        let step = patcher().apply_edit(CONTENT.to_string(), &edit, MAX_IDENTITY - 1).unwrap();
        assert_eq!(step.outcome, EditOutcome::Applied { identity: MAX_IDENTITY - 1 });
    }

    #[test]
    fn test_empty_edit_list_is_rejected() {
        let err = patcher().run(CONTENT.to_string(), &EditSet::default()).unwrap_err();
        assert!(matches!(err, PatchError::EmptyEditList));
    }

    #[test]
    fn test_report_serialization() {
        let edits = EditSet::new(vec![
            Edit::replace("cap", "6 months", "12 months").with_clause("Limitation of Liability"),
            Edit::replace("law", "Ohio", "Delaware"),
        ]);
        let result = patcher().run(CONTENT.to_string(), &edits).unwrap();
        let json = serde_json::to_value(result.report()).unwrap();

        assert_eq!(json["applied"], 1);
        assert_eq!(json["failedIds"][0], "law");
        assert_eq!(json["edits"][0]["status"], "applied");
        assert_eq!(json["edits"][0]["identity"], 1);
        assert_eq!(json["edits"][0]["clause"], "Limitation of Liability");
        assert_eq!(json["edits"][1]["status"], "notFound");
    }

    #[test]
    fn test_preview_truncates_long_targets() {
        let long = "x".repeat(80);
        assert_eq!(preview(&long).len(), PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }
}

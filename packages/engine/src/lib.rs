//! # Redline Engine
//!
//! Tracked-change patching for word-processing documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ archive: read document + settings parts     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ patcher: edits applied strictly in order    │
//! │  - locator: direct / reconstructed / absent │
//! │  - renderer: <w:del> + <w:ins> markup       │
//! │  - replacer: split the matched fragment     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ archive: write document, trackRevisions on  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Never corrupt**: a run returns a complete result or a single error
//! 2. **Never drop silently**: every edit ends applied, failed or skipped
//! 3. **Whole edits only**: an edit contributes both change blocks or nothing
//! 4. **Literal targets**: locate text is plain text, never a pattern
//!
//! ## Usage
//!
//! ```rust,ignore
//! use redline_engine::{redline_archive, Archive, Edit, EditSet, PatchOptions};
//!
//! let mut archive = Archive::load_dir("contract".as_ref())?;
//! let edits = EditSet::new(vec![Edit::replace("cap", "6 months", "12 months")]);
//!
//! let result = redline_archive(&mut archive, &edits, &PatchOptions::default())?;
//! for id in &result.failed_ids {
//!     eprintln!("could not place edit {id}");
//! }
//!
//! archive.write_dir("contract-redlined".as_ref())?;
//! ```

mod archive;
mod edits;
mod errors;
mod locator;
mod markup;
mod patcher;
mod renderer;
mod replacer;

pub use archive::{
    enable_track_revisions, read_text_part, redline_archive, Archive, PartStore, DOCUMENT_PART,
    SETTINGS_PART,
};
pub use edits::{Edit, EditSet};
pub use errors::{EngineResult, PatchError};
pub use locator::{contains_raw, locate, Location};
pub use markup::{escape_text, plain_text, unescape_text, FragmentScanner, TextFragment};
pub use patcher::{
    patch_document, EditOutcome, EditReport, PatchOptions, PatchReport, PatchResult, Patcher, Step,
};
pub use renderer::{
    change_records, format_timestamp, next_identity, render_change, Attribution, ChangeKind,
    ChangeRecord, IDENTITIES_PER_EDIT, MAX_IDENTITY,
};
pub use replacer::{replace_first, SpanMode};

//! # Text Locator
//!
//! Decides whether a target string is present in document content and
//! whether a single fragment carries it.
//!
//! Word processors split text into runs at arbitrary points (spell-check
//! marks, revision ids, formatting changes), so a clause the reader sees as
//! one phrase may live in several `<w:t>` elements:
//!
//! ```text
//! <w:t>Lim</w:t> ... <w:t>itation of Liability</w:t>
//! ```
//!
//! Such a target is reported as [`Location::Reconstructed`]: detected, but
//! not replaceable.

use crate::errors::{EngineResult, PatchError};
use crate::markup::FragmentScanner;

/// Where a target was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Intact inside the payload of one fragment
    Direct { fragment: usize },

    /// Only in the concatenated text of several fragments
    Reconstructed,

    NotFound,
}

impl Location {
    pub fn is_direct(&self) -> bool {
        matches!(self, Location::Direct { .. })
    }
}

/// Locate `target` in `content`.
///
/// The target is literal plain text: markup-significant characters in it are
/// compared against decoded fragment text, never against raw markup.
pub fn locate(
    scanner: &FragmentScanner,
    content: &str,
    target: &str,
    edit_id: &str,
) -> EngineResult<Location> {
    if target.is_empty() {
        return Err(PatchError::EmptyTarget { edit_id: edit_id.to_string() });
    }

    let fragments = scanner.fragments(content);

    if let Some(index) = fragments.iter().position(|f| f.text.contains(target)) {
        tracing::debug!(edit_id, fragment = index, "direct match");
        return Ok(Location::Direct { fragment: index });
    }

    let reconstructed: String = fragments.iter().map(|f| f.text.as_str()).collect();
    if reconstructed.contains(target) {
        tracing::debug!(edit_id, "match spans several fragments");
        return Ok(Location::Reconstructed);
    }

    tracing::debug!(edit_id, "no match");
    Ok(Location::NotFound)
}

/// Raw containment check over the undecoded content, markup included.
///
/// Cheap, but only an existence hint: it can match tag names and attribute
/// values, and misses text whose characters are escaped in the markup.
pub fn contains_raw(content: &str, target: &str) -> bool {
    !target.is_empty() && content.contains(target)
}

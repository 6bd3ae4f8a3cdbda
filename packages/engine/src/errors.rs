//! Error types for the redline engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("No edits to apply")]
    EmptyEditList,

    #[error("Invalid document package: missing part {part}")]
    MissingPart { part: String },

    #[error("Part {part} is not valid UTF-8")]
    InvalidEncoding { part: String },

    #[error("Change identity {identity} leaves no room for a deletion and insertion pair (largest w:id is {})", crate::renderer::MAX_IDENTITY)]
    IdentityOutOfRange { identity: u64 },

    #[error("Edit {edit_id} has no text to locate")]
    EmptyTarget { edit_id: String },

    #[error("Edit {edit_id}: locator reported a direct match for {target:?} but no text fragment contains it")]
    InvariantViolation { edit_id: String, target: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PatchError {
    /// Bad input that aborts a run before any content is rewritten
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            PatchError::EmptyEditList
                | PatchError::MissingPart { .. }
                | PatchError::InvalidEncoding { .. }
                | PatchError::IdentityOutOfRange { .. }
        )
    }

    /// An engine bug rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, PatchError::InvariantViolation { .. })
    }
}

/// Result alias used across the engine
pub type EngineResult<T> = Result<T, PatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(PatchError::EmptyEditList.is_fatal_input());
        assert!(PatchError::MissingPart { part: "word/document.xml".into() }.is_fatal_input());
        assert!(!PatchError::EmptyTarget { edit_id: "a".into() }.is_fatal_input());

        let bug = PatchError::InvariantViolation {
            edit_id: "a".into(),
            target: "6 months".into(),
        };
        assert!(bug.is_internal());
        assert!(!bug.is_fatal_input());

        assert!(PatchError::IdentityOutOfRange { identity: u64::MAX }.is_fatal_input());
    }

    #[test]
    fn test_missing_part_message() {
        let err = PatchError::MissingPart { part: "word/document.xml".into() };
        assert_eq!(
            err.to_string(),
            "Invalid document package: missing part word/document.xml"
        );
    }
}

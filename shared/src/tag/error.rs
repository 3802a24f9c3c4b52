use thiserror::Error;

/// Errors that can occur while reading typed values out of a CompoundTag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// The compound has no entry under the requested key
    #[error("Tag `{key}` is missing")]
    MissingKey { key: String },

    /// The entry exists but holds a different tag type
    #[error("Tag `{key}` should be {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A list element did not have the type the reader expected
    #[error("Element {index} of list `{key}` should be {expected}, found {found}")]
    ListElementMismatch {
        key: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

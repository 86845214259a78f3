//! Error type shared by every fallible DOM operation.
//!
//! All preconditions are checked before any tree mutation begins, so a
//! returned error always means the document is unchanged.

use thiserror::Error;

/// Errors raised by DOM operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// An element operation was invoked on a text, comment, or document node.
    #[error("expected an element node")]
    NotAnElement,

    /// A structural index fell outside the target's child list.
    #[error("index {index} out of bounds (node has {len} children)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The reference (or old) child is not a child of the given parent.
    #[error("reference node is not a child of the given parent")]
    ChildNotFound,

    /// An adjacency position token other than beforebegin/afterbegin/beforeend/afterend.
    #[error("invalid insertion position {0:?}")]
    InvalidPosition(String),

    /// beforebegin/afterend requested on a node that has no parent.
    #[error("node has no parent")]
    NoParent,

    /// The insertion would have made a node its own ancestor.
    #[error("insertion would make a node its own ancestor")]
    HierarchyError,

    /// The node handle refers to a slot that has been decomposed.
    #[error("node handle is no longer part of this document")]
    StaleHandle,

    /// The selector string is outside the supported grammar.
    #[error("unsupported selector {0:?}")]
    UnsupportedSelector(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DomError>;

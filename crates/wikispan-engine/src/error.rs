use crate::registry::NodeKind;

/// Errors raised by node accessors and constructors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The node's span was invalidated by an overlapping edit or deleted.
    #[error("{kind:?} node is dead: its text was replaced by an enclosing edit")]
    DeadAccess { kind: NodeKind },

    /// Text given to a constructor cannot denote the requested construct.
    #[error("malformed {kind:?}: {reason}")]
    MalformedInput { kind: NodeKind, reason: String },

    /// The construct cannot express the requested change.
    #[error("{kind:?} does not support {operation}")]
    Unsupported {
        kind: NodeKind,
        operation: &'static str,
    },

    #[error("{kind:?} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: NodeKind,
        index: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(kind: NodeKind, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            kind,
            reason: reason.into(),
        }
    }
}

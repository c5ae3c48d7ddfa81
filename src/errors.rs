use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Index outside `[0, len)`, or `[0, len]` when inserting.
    #[error("index {index} out of range for node with {len} children")]
    OutOfRange { index: usize, len: usize },

    #[error("node is already attached to a parent")]
    AlreadyAttached,

    #[error("cycle detected: cannot attach a node beneath itself or its own descendant")]
    CycleDetected,
}

pub type TreeResult<T> = Result<T, TreeError>;

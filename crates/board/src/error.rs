//! Board error types.

/// Errors produced by board construction and snapshot merging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("snapshot has {actual} squares, board expects {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("unknown board symbol: {0:?}")]
    UnknownSymbol(String),

    #[error("cannot place {mines} mines on a board of {squares} squares")]
    TooManyMines { mines: usize, squares: usize },

    #[error("invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("illegal square transition at index {index}: {reason}")]
    IllegalTransition { index: usize, reason: &'static str },
}

//! Errors for reading game snapshots.

/// Why a FEN string could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// A required space-separated field is missing.
    #[error("FEN is missing the {0} field")]
    MissingField(&'static str),

    /// The placement field doesn't have exactly eight ranks.
    #[error("FEN placement has {0} ranks, expected 8")]
    RankCount(usize),

    /// A rank doesn't describe exactly eight files.
    #[error("FEN rank {rank} describes {files} files, expected 8")]
    FileCount { rank: usize, files: usize },

    /// An unknown piece letter.
    #[error("unknown FEN piece {0:?}")]
    Piece(char),

    /// The active colour is neither `w` nor `b`.
    #[error("unknown active colour {0:?}")]
    Color(String),

    /// A square name that isn't `a1`..`h8`.
    #[error("invalid square {0:?}")]
    Square(String),
}

use crate::types::{PieceId, Square};

/// Domain errors for the chess engine core.
///
/// Every rejection is local and side-effect-free: the board is never
/// partially mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The destination violates the piece's movement rules, targets an
    /// own-color piece, or would leave the mover's king attacked.
    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: Square, to: Square },

    /// Coordinates outside the 8x8 board, rejected before any rule runs.
    #[error("coordinates off the board: ({file}, {rank})")]
    OutOfBounds { file: i16, rank: i16 },

    /// The operation targets a piece id that is unknown or inactive.
    #[error("no active piece {0}")]
    StaleReference(PieceId),

    /// Move or undo attempted in a terminal game, or undo with no history.
    #[error("operation not allowed: {0}")]
    InvalidState(&'static str),

    /// Snapshot data failed a structural invariant; prior state is kept.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

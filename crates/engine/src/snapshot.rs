use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::EngineError;
use crate::types::*;

/// One piece in a saved game. Coordinates are signed and re-validated
/// on restore; nothing in a snapshot is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPiece {
    pub kind: PieceKind,
    pub color: Color,
    pub file: i16,
    pub rank: i16,
    pub has_moved: bool,
    pub double_step: bool,
    pub active: bool,
    pub was_promoted: bool,
}

/// Display-level record of a played move, kept so a restored game can
/// still show its move list. These entries are not replayable; restore
/// rebuilds position state only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMove {
    pub mover: Color,
    pub kind: PieceKind,
    pub from_file: i16,
    pub from_rank: i16,
    pub to_file: i16,
    pub to_rank: i16,
    pub captured: Option<(Color, PieceKind)>,
    pub castled: bool,
    pub promoted: bool,
}

/// Serializable image of a full game: piece table, side to move,
/// outcome and the move list for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    pub pieces: Vec<SavedPiece>,
    pub turn: Color,
    pub outcome: Outcome,
    pub moves: Vec<SavedMove>,
}

impl SavedGame {
    pub fn capture(board: &Board) -> Self {
        let pieces = board
            .pieces()
            .iter()
            .map(|p| SavedPiece {
                kind: p.kind,
                color: p.color,
                file: p.square.file() as i16,
                rank: p.square.rank() as i16,
                has_moved: p.has_moved,
                double_step: p.double_step,
                active: p.active,
                was_promoted: p.was_promoted,
            })
            .collect();

        let moves = board
            .move_history()
            .iter()
            .map(|r| {
                SavedMove {
                    mover: r.mover,
                    kind: r.kind,
                    from_file: r.from.file() as i16,
                    from_rank: r.from.rank() as i16,
                    to_file: r.to.file() as i16,
                    to_rank: r.to.rank() as i16,
                    captured: r.captured.map(|c| {
                        let captured = &board.pieces()[c.index()];
                        (captured.color, captured.kind)
                    }),
                    castled: r.castling.is_some(),
                    promoted: r.promotion.is_some(),
                }
            })
            .collect();

        Self {
            pieces,
            turn: board.turn(),
            outcome: board.outcome(),
            moves,
        }
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::CorruptSnapshot(e.to_string()))
    }

    pub fn from_json(data: &str) -> Result<Self, EngineError> {
        serde_json::from_str(data).map_err(|e| EngineError::CorruptSnapshot(e.to_string()))
    }
}

impl Board {
    /// Builds a board from a snapshot after structural validation. The
    /// history is deliberately left empty: saved move entries are for
    /// display and cannot be reversed, so undo restarts from the loaded
    /// position.
    pub fn restore(saved: &SavedGame) -> Result<Self, EngineError> {
        if saved.pieces.len() > 64 {
            return Err(EngineError::CorruptSnapshot(format!(
                "{} pieces will not fit on the board",
                saved.pieces.len()
            )));
        }

        let mut pieces = Vec::with_capacity(saved.pieces.len());
        for (index, p) in saved.pieces.iter().enumerate() {
            let square = Square::try_from_coords(p.file, p.rank).map_err(|_| {
                EngineError::CorruptSnapshot(format!(
                    "piece off the board at ({}, {})",
                    p.file, p.rank
                ))
            })?;
            pieces.push(Piece {
                id: PieceId(index as u8),
                color: p.color,
                kind: p.kind,
                square,
                has_moved: p.has_moved,
                active: p.active,
                double_step: p.double_step,
                was_promoted: p.was_promoted,
            });
        }

        let active = || pieces.iter().filter(|p| p.active);

        for a in active() {
            for b in active() {
                if a.id != b.id && a.square == b.square {
                    return Err(EngineError::CorruptSnapshot(format!(
                        "two active pieces on {}",
                        a.square
                    )));
                }
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = active()
                .filter(|p| p.kind == PieceKind::King && p.color == color)
                .count();
            if kings > 1 {
                return Err(EngineError::CorruptSnapshot(format!(
                    "{} has {} kings",
                    color, kings
                )));
            }
            if kings == 0 && !matches!(saved.outcome, Outcome::KingCaptured(_)) {
                return Err(EngineError::CorruptSnapshot(format!("{} has no king", color)));
            }
        }

        let windows = active()
            .filter(|p| p.kind == PieceKind::Pawn && p.double_step)
            .count();
        if windows > 1 {
            return Err(EngineError::CorruptSnapshot(
                "more than one pawn holds an en passant window".into(),
            ));
        }

        Ok(Board::from_parts(pieces, saved.turn, saved.outcome))
    }

    /// Replaces this board with the snapshot's state. On error the
    /// current game is kept as-is.
    pub fn load_snapshot(&mut self, saved: &SavedGame) -> Result<(), EngineError> {
        *self = Board::restore(saved)?;
        Ok(())
    }
}

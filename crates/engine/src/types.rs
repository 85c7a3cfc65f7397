use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A board square packed as `rank * 8 + file`, both in 0..8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square(pub u8);

impl Square {
    pub fn new(file: u8, rank: u8) -> Self {
        Self(rank * 8 + file)
    }

    pub fn file(&self) -> u8 {
        self.0 % 8
    }

    pub fn rank(&self) -> u8 {
        self.0 / 8
    }

    /// False for raw index values of 64 and above, which no square on
    /// the 8x8 board packs to.
    pub fn on_board(&self) -> bool {
        self.0 < 64
    }

    /// Builds a square from signed coordinates, rejecting anything outside
    /// the 8x8 board. This is the entry point for untrusted input such as
    /// snapshot data or coordinates coming from a presentation layer.
    pub fn try_from_coords(file: i16, rank: i16) -> Result<Self, EngineError> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Ok(Self::new(file as u8, rank as u8))
        } else {
            Err(EngineError::OutOfBounds { file, rank })
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{}{}", file, rank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank a pawn of this color promotes on.
    pub fn promotion_rank(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Forward direction for a pawn of this color.
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "Pawn",
            PieceKind::Knight => "Knight",
            PieceKind::Bishop => "Bishop",
            PieceKind::Rook => "Rook",
            PieceKind::Queen => "Queen",
            PieceKind::King => "King",
        };
        write!(f, "{}", name)
    }
}

/// Stable handle to a piece for the lifetime of a game. Captured pieces
/// keep their id; they are flagged inactive rather than removed so undo
/// can revive them in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId(pub u8);

impl PieceId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub color: Color,
    pub kind: PieceKind,
    pub square: Square,
    pub has_moved: bool,
    pub active: bool,
    /// True only for a pawn that just advanced two squares; consumable by
    /// en passant for exactly one opposing reply.
    pub double_step: bool,
    pub was_promoted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Checkmate(Color),
    Stalemate,
    KingCaptured(Color),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        *self != Outcome::InProgress
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "in progress"),
            Outcome::Checkmate(winner) => write!(f, "checkmate, {} wins", winner),
            Outcome::Stalemate => write!(f, "stalemate"),
            Outcome::KingCaptured(winner) => write!(f, "king captured, {} wins", winner),
        }
    }
}

/// Rook half of a castling move, recorded so undo can reverse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRecord {
    pub rook: PieceId,
    pub rook_from: Square,
    pub rook_to: Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionRecord {
    pub from_kind: PieceKind,
    pub to_kind: PieceKind,
}

/// Everything needed to exactly reverse one applied move, including the
/// nested rook relocation of a castle and the flag bookkeeping around
/// pawn double steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub piece: PieceId,
    /// The mover's kind when the move was played; stays `Pawn` for the
    /// earlier moves of a pawn that later promotes.
    pub kind: PieceKind,
    pub from: Square,
    pub to: Square,
    pub captured: Option<PieceId>,
    pub was_first_move: bool,
    /// The move itself was a pawn double step.
    pub was_double_step: bool,
    /// Pawn whose double-step flag the end-of-turn sweep cleared; undo
    /// sets it back so the en passant window reopens exactly as before.
    pub cleared_double_step: Option<PieceId>,
    pub castling: Option<CastlingRecord>,
    pub promotion: Option<PromotionRecord>,
    pub mover: Color,
}

/// What a successful `attempt_move` tells the caller. The presentation
/// layer drives sounds, animations and the capture display off these
/// flags without inspecting the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    pub captured: Option<PieceId>,
    pub castling: bool,
    pub promotion: bool,
    pub outcome: Outcome,
}

/// Mirror of `MoveReport` for a reversed move, so a consumer can unwind
/// its own side effects symmetrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoReport {
    pub piece: PieceId,
    pub from: Square,
    pub to: Square,
    pub revived: Option<PieceId>,
    pub castling: bool,
    pub promotion: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_packing() {
        let sq = Square::new(4, 0);
        assert_eq!(sq.file(), 4);
        assert_eq!(sq.rank(), 0);
        assert_eq!(sq.to_string(), "e1");
        assert_eq!(Square::new(7, 7).to_string(), "h8");
    }

    #[test]
    fn square_bounds() {
        assert!(Square::try_from_coords(0, 0).is_ok());
        assert!(Square::try_from_coords(7, 7).is_ok());
        assert!(matches!(
            Square::try_from_coords(8, 0),
            Err(EngineError::OutOfBounds { file: 8, rank: 0 })
        ));
        assert!(Square::try_from_coords(-1, 3).is_err());
    }

    #[test]
    fn raw_index_bounds() {
        assert!(Square(0).on_board());
        assert!(Square(63).on_board());
        assert!(!Square(64).on_board());
        assert!(!Square(68).on_board());
    }

    #[test]
    fn color_opposite() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.opposite(), Color::White);
    }

    #[test]
    fn pawn_directions() {
        assert_eq!(Color::White.pawn_direction(), 1);
        assert_eq!(Color::Black.pawn_direction(), -1);
        assert_eq!(Color::White.promotion_rank(), 7);
        assert_eq!(Color::Black.promotion_rank(), 0);
    }
}

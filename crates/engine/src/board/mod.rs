use std::cell::RefCell;

use crate::logger::GameLogger;
use crate::types::*;

pub mod moves;
pub mod state;
pub mod validation;

use validation::Probe;

/// Canonical game state: the piece table, side to move, move history and
/// outcome. All mutation goes through `attempt_move` and `undo`; the
/// `probe` overlay is a transient configuration used only while the check
/// oracle asks "would this square be attacked after that move".
#[derive(Debug, Clone)]
pub struct Board {
    pieces: Vec<Piece>,
    turn: Color,
    move_history: Vec<MoveRecord>,
    outcome: Outcome,
    probe: RefCell<Option<Probe>>,
    logger: GameLogger,
}

impl Board {
    /// Standard starting layout, White to move.
    pub fn new() -> Self {
        let mut board = Self {
            pieces: Vec::with_capacity(32),
            turn: Color::White,
            move_history: Vec::new(),
            outcome: Outcome::InProgress,
            probe: RefCell::new(None),
            logger: GameLogger::new(),
        };

        board.setup_starting_position();
        board
    }

    fn setup_starting_position(&mut self) {
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for (color, home, pawn_rank) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
            for (file, &kind) in back_rank.iter().enumerate() {
                self.add_piece(kind, color, Square::new(file as u8, home));
            }
            for file in 0..8 {
                self.add_piece(PieceKind::Pawn, color, Square::new(file, pawn_rank));
            }
        }
    }

    fn add_piece(&mut self, kind: PieceKind, color: Color, square: Square) {
        let id = PieceId(self.pieces.len() as u8);
        self.pieces.push(Piece {
            id,
            color,
            kind,
            square,
            has_moved: false,
            active: true,
            double_step: false,
            was_promoted: false,
        });
    }

    /// Rebuilds a board from restored parts. Used by snapshot loading; the
    /// caller is responsible for having validated the invariants.
    pub(crate) fn from_parts(pieces: Vec<Piece>, turn: Color, outcome: Outcome) -> Self {
        Self {
            pieces,
            turn,
            move_history: Vec::new(),
            outcome,
            probe: RefCell::new(None),
            logger: GameLogger::new(),
        }
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn move_history(&self) -> &[MoveRecord] {
        &self.move_history
    }

    pub fn logger(&self) -> &GameLogger {
        &self.logger
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.index())
    }

    /// Where a piece currently stands, seen through the probe overlay.
    pub(crate) fn square_of(&self, id: PieceId) -> Square {
        if let Some(probe) = self.probe.borrow().as_ref() {
            if probe.piece == id {
                return probe.to;
            }
        }
        self.pieces[id.index()].square
    }

    /// Whether a piece is active, seen through the probe overlay (a piece
    /// the probe provisionally captures counts as inactive).
    pub(crate) fn is_active(&self, id: PieceId) -> bool {
        if let Some(probe) = self.probe.borrow().as_ref() {
            if probe.captured == Some(id) {
                return false;
            }
        }
        self.pieces[id.index()].active
    }

    /// The active piece occupying a square, if any, seen through the
    /// probe overlay.
    pub fn piece_at(&self, square: Square) -> Option<PieceId> {
        let probe = self.probe.borrow();
        if let Some(p) = probe.as_ref() {
            if p.to == square {
                return Some(p.piece);
            }
        }
        for piece in &self.pieces {
            if !piece.active {
                continue;
            }
            if let Some(p) = probe.as_ref() {
                if p.piece == piece.id || p.captured == Some(piece.id) {
                    continue;
                }
            }
            if piece.square == square {
                return Some(piece.id);
            }
        }
        None
    }

    /// The active king of a color. `None` only after a king capture.
    pub fn king_of(&self, color: Color) -> Option<PieceId> {
        self.pieces
            .iter()
            .find(|p| p.kind == PieceKind::King && p.color == color && self.is_active(p.id))
            .map(|p| p.id)
    }

    pub(crate) fn piece_ids_of(&self, color: Color) -> impl Iterator<Item = PieceId> + '_ {
        self.pieces
            .iter()
            .filter(move |p| p.color == color)
            .map(|p| p.id)
    }

    /// Zero occupied squares strictly between two aligned squares. The
    /// alignment (rank, file or diagonal) must already hold.
    pub(crate) fn path_is_clear(&self, from: Square, to: Square) -> bool {
        let df = (to.file() as i8 - from.file() as i8).signum();
        let dr = (to.rank() as i8 - from.rank() as i8).signum();

        let mut file = from.file() as i8 + df;
        let mut rank = from.rank() as i8 + dr;
        while file != to.file() as i8 || rank != to.rank() as i8 {
            if self.piece_at(Square::new(file as u8, rank as u8)).is_some() {
                return false;
            }
            file += df;
            rank += dr;
        }
        true
    }

    pub(crate) fn probe_cell(&self) -> &RefCell<Option<Probe>> {
        &self.probe
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        let bytes = s.as_bytes();
        Square::new(bytes[0] - b'a', bytes[1] - b'1')
    }

    #[test]
    fn starting_layout() {
        let board = Board::new();
        assert_eq!(board.pieces().len(), 32);
        assert_eq!(board.turn(), Color::White);
        assert_eq!(board.outcome(), Outcome::InProgress);

        let king = board.piece_at(sq("e1")).unwrap();
        let piece = board.piece(king).unwrap();
        assert_eq!(piece.kind, PieceKind::King);
        assert_eq!(piece.color, Color::White);

        let pawn = board.piece_at(sq("d7")).unwrap();
        let piece = board.piece(pawn).unwrap();
        assert_eq!(piece.kind, PieceKind::Pawn);
        assert_eq!(piece.color, Color::Black);

        assert!(board.piece_at(sq("e4")).is_none());
    }

    #[test]
    fn one_active_king_per_color() {
        let board = Board::new();
        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces()
                .iter()
                .filter(|p| p.kind == PieceKind::King && p.color == color && p.active)
                .count();
            assert_eq!(kings, 1);
        }
    }

    #[test]
    fn no_two_active_pieces_share_a_square() {
        let board = Board::new();
        for a in board.pieces() {
            for b in board.pieces() {
                if a.id != b.id && a.active && b.active {
                    assert_ne!(a.square, b.square);
                }
            }
        }
    }

    #[test]
    fn path_clearance() {
        let board = Board::new();
        // a1 rook blocked by the a2 pawn.
        assert!(!board.path_is_clear(sq("a1"), sq("a5")));
        // Nothing between the rank-2 and rank-7 pawn walls.
        assert!(board.path_is_clear(sq("a3"), sq("a6")));
        // Diagonal from c1 is blocked by the b2 pawn.
        assert!(!board.path_is_clear(sq("c1"), sq("a3")));
        // Diagonal a3-f8 runs into the e7 pawn.
        assert!(!board.path_is_clear(sq("a3"), sq("f8")));
    }
}

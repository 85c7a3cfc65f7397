use std::cell::RefCell;

use super::Board;
use crate::types::*;

/// A provisional move the check oracle evaluates: `piece` stands at `to`
/// and `captured` counts as inactive while the probe is installed. The
/// overlay lives in a `RefCell` on the board; real cells are never
/// touched, so restoration cannot be missed on any exit path.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Probe {
    pub piece: PieceId,
    pub to: Square,
    pub captured: Option<PieceId>,
}

struct ProbeGuard<'a> {
    cell: &'a RefCell<Option<Probe>>,
}

impl<'a> ProbeGuard<'a> {
    fn install(cell: &'a RefCell<Option<Probe>>, probe: Probe) -> Self {
        *cell.borrow_mut() = Some(probe);
        Self { cell }
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        *self.cell.borrow_mut() = None;
    }
}

/// Successful geometric validation. `encountered` is the enemy piece the
/// move would capture; for en passant this is the adjacent pawn, not an
/// occupant of the destination square.
#[derive(Debug, Clone, Copy)]
pub struct PathCheck {
    pub encountered: Option<PieceId>,
}

impl Board {
    /// Geometric legality of moving a piece to `to`: shape, obstruction
    /// and special-move conditions, with no king-safety filtering. This
    /// is the attack-only mode the check oracle scans with, which is why
    /// it must never consult the oracle itself.
    pub(crate) fn validate_path(&self, id: PieceId, to: Square) -> Option<PathCheck> {
        let from = self.square_of(id);
        if from == to {
            return None;
        }

        let piece = &self.pieces[id.index()];
        let mut encountered = self.piece_at(to);
        if let Some(other) = encountered {
            if self.pieces[other.index()].color == piece.color {
                return None;
            }
        }

        let d_file = to.file() as i8 - from.file() as i8;
        let d_rank = to.rank() as i8 - from.rank() as i8;

        let shape_ok = match piece.kind {
            PieceKind::King => {
                if d_file.abs() <= 1 && d_rank.abs() <= 1 {
                    true
                } else {
                    self.castling_path_ok(piece, from, to)
                }
            }
            PieceKind::Rook => self.straight_path_ok(from, to, d_file, d_rank),
            PieceKind::Bishop => self.diagonal_path_ok(from, to, d_file, d_rank),
            PieceKind::Queen => {
                self.straight_path_ok(from, to, d_file, d_rank)
                    || self.diagonal_path_ok(from, to, d_file, d_rank)
            }
            PieceKind::Knight => {
                (d_file.abs() == 1 && d_rank.abs() == 2) || (d_file.abs() == 2 && d_rank.abs() == 1)
            }
            PieceKind::Pawn => {
                let dir = piece.color.pawn_direction();
                if d_rank == dir && d_file == 0 {
                    // Plain push, only onto an empty square.
                    encountered.is_none()
                } else if d_rank == dir && d_file.abs() == 1 {
                    if encountered.is_none() {
                        // En passant: the captured piece is the adjacent
                        // pawn on the origin rank, not the (empty)
                        // destination square's occupant.
                        let beside = Square::new(to.file(), from.rank());
                        if let Some(other) = self.piece_at(beside) {
                            let other_piece = &self.pieces[other.index()];
                            if other_piece.color != piece.color
                                && other_piece.kind == PieceKind::Pawn
                                && other_piece.double_step
                            {
                                encountered = Some(other);
                            }
                        }
                    }
                    encountered.is_some()
                } else if d_rank == 2 * dir && d_file == 0 && !piece.has_moved {
                    let middle = Square::new(from.file(), (from.rank() as i8 + dir) as u8);
                    encountered.is_none() && self.piece_at(middle).is_none()
                } else {
                    false
                }
            }
        };

        if shape_ok {
            Some(PathCheck { encountered })
        } else {
            None
        }
    }

    fn straight_path_ok(&self, from: Square, to: Square, d_file: i8, d_rank: i8) -> bool {
        (d_file == 0 || d_rank == 0) && self.path_is_clear(from, to)
    }

    fn diagonal_path_ok(&self, from: Square, to: Square, d_file: i8, d_rank: i8) -> bool {
        d_file.abs() == d_rank.abs() && self.path_is_clear(from, to)
    }

    /// Castling geometry: two-square king shift on the home rank, king
    /// and rook both unmoved, nothing strictly between them. Attack
    /// constraints on the king's start, transit and destination squares
    /// are layered on in `is_legal_move`.
    fn castling_path_ok(&self, piece: &Piece, from: Square, to: Square) -> bool {
        if piece.has_moved || from.rank() != to.rank() {
            return false;
        }

        let d_file = to.file() as i8 - from.file() as i8;
        let rook_file = match d_file {
            -2 => from.file() as i8 - 4,
            2 => from.file() as i8 + 3,
            _ => return false,
        };
        if !(0..8).contains(&rook_file) {
            return false;
        }

        let rook_square = Square::new(rook_file as u8, from.rank());
        let Some(rook_id) = self.piece_at(rook_square) else {
            return false;
        };
        let rook = &self.pieces[rook_id.index()];

        rook.kind == PieceKind::Rook
            && rook.color == piece.color
            && !rook.has_moved
            && self.path_is_clear(from, rook_square)
    }

    /// Full legality: geometry plus the self-check filter. A move that
    /// leaves the mover's own king attacked is rejected; castling also
    /// requires the king's start, transit and destination squares to be
    /// unattacked.
    pub fn is_legal_move(&self, id: PieceId, to: Square) -> Option<PathCheck> {
        if !to.on_board() {
            return None;
        }
        let piece = self.pieces.get(id.index())?;
        if !piece.active {
            return None;
        }

        let check = self.validate_path(id, to)?;
        let from = piece.square;
        let color = piece.color;

        let is_castling =
            piece.kind == PieceKind::King && (to.file() as i8 - from.file() as i8).abs() == 2;

        if is_castling {
            let step = (to.file() as i8 - from.file() as i8).signum();
            let transit = Square::new((from.file() as i8 + step) as u8, from.rank());
            for target in [from, transit, to] {
                let probe = Probe {
                    piece: id,
                    to: target,
                    captured: None,
                };
                if self.is_attacked_after(probe, color) {
                    return None;
                }
            }
        } else {
            let probe = Probe {
                piece: id,
                to,
                captured: check.encountered,
            };
            if self.is_attacked_after(probe, color) {
                return None;
            }
        }

        Some(check)
    }

    /// Whether the defender's king would be attacked with the probe in
    /// effect. The guard clears the overlay on every exit path.
    pub(crate) fn is_attacked_after(&self, probe: Probe, defender: Color) -> bool {
        let _guard = ProbeGuard::install(self.probe_cell(), probe);

        let Some(king) = self.king_of(defender) else {
            return false;
        };
        let king_square = self.square_of(king);
        self.is_square_attacked(king_square, defender.opposite())
    }

    /// Whether any active piece of `by` could capture on `square` right
    /// now, ignoring the attackers' own king safety.
    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        for id in self.piece_ids_of(by) {
            if !self.is_active(id) {
                continue;
            }
            if self.validate_path(id, square).is_some() {
                return true;
            }
        }
        false
    }

    /// Whether a color's king is attacked on its current square.
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king_of(color) {
            Some(king) => self.is_square_attacked(self.square_of(king), color.opposite()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        let bytes = s.as_bytes();
        Square::new(bytes[0] - b'a', bytes[1] - b'1')
    }

    fn place(board: &mut Board, id: PieceId, at: &str) {
        board.pieces[id.index()].square = sq(at);
    }

    fn deactivate(board: &mut Board, at: &str) {
        let id = board.piece_at(sq(at)).unwrap();
        board.pieces[id.index()].active = false;
    }

    #[test]
    fn knight_shape() {
        let board = Board::new();
        let knight = board.piece_at(sq("b1")).unwrap();
        assert!(board.is_legal_move(knight, sq("a3")).is_some());
        assert!(board.is_legal_move(knight, sq("c3")).is_some());
        // d2 holds an own pawn; b3 is not an L.
        assert!(board.is_legal_move(knight, sq("d2")).is_none());
        assert!(board.is_legal_move(knight, sq("b3")).is_none());
    }

    #[test]
    fn rook_blocked_by_own_pawn() {
        let board = Board::new();
        let rook = board.piece_at(sq("a1")).unwrap();
        assert!(board.is_legal_move(rook, sq("a4")).is_none());
        assert!(board.is_legal_move(rook, sq("b1")).is_none());
    }

    #[test]
    fn no_op_is_illegal() {
        let board = Board::new();
        let rook = board.piece_at(sq("a1")).unwrap();
        assert!(board.is_legal_move(rook, sq("a1")).is_none());
    }

    #[test]
    fn pawn_pushes() {
        let board = Board::new();
        let pawn = board.piece_at(sq("e2")).unwrap();
        assert!(board.is_legal_move(pawn, sq("e3")).is_some());
        assert!(board.is_legal_move(pawn, sq("e4")).is_some());
        // Diagonal without a capture target.
        assert!(board.is_legal_move(pawn, sq("d3")).is_none());
        // Backward or sideways never.
        assert!(board.is_legal_move(pawn, sq("e1")).is_none());
        assert!(board.is_legal_move(pawn, sq("f2")).is_none());
    }

    #[test]
    fn pawn_double_step_needs_clear_path() {
        let mut board = Board::new();
        let pawn = board.piece_at(sq("e2")).unwrap();
        let blocker = board.piece_at(sq("e7")).unwrap();
        place(&mut board, blocker, "e3");
        assert!(board.is_legal_move(pawn, sq("e3")).is_none());
        assert!(board.is_legal_move(pawn, sq("e4")).is_none());
    }

    #[test]
    fn pawn_capture_requires_enemy() {
        let mut board = Board::new();
        let pawn = board.piece_at(sq("e2")).unwrap();
        let enemy = board.piece_at(sq("d7")).unwrap();
        place(&mut board, enemy, "d3");
        let check = board.is_legal_move(pawn, sq("d3")).unwrap();
        assert_eq!(check.encountered, Some(enemy));
    }

    #[test]
    fn en_passant_target_is_the_adjacent_pawn() {
        let mut board = Board::new();
        let white = board.piece_at(sq("e2")).unwrap();
        let black = board.piece_at(sq("d7")).unwrap();
        place(&mut board, white, "e5");
        place(&mut board, black, "d5");
        board.pieces[black.index()].double_step = true;

        let check = board.is_legal_move(white, sq("d6")).unwrap();
        assert_eq!(check.encountered, Some(black));
    }

    #[test]
    fn en_passant_needs_the_double_step_flag() {
        let mut board = Board::new();
        let white = board.piece_at(sq("e2")).unwrap();
        let black = board.piece_at(sq("d7")).unwrap();
        place(&mut board, white, "e5");
        place(&mut board, black, "d5");

        assert!(board.is_legal_move(white, sq("d6")).is_none());
    }

    #[test]
    fn queen_attack_stops_at_blockers() {
        let mut board = Board::new();
        let queen = board.piece_at(sq("d1")).unwrap();
        place(&mut board, queen, "d4");
        assert!(board.is_square_attacked(sq("d6"), Color::White));
        // The black d7 pawn itself is reachable, d8 behind it is not.
        assert!(board.is_square_attacked(sq("d7"), Color::White));
        assert!(!board.is_square_attacked(sq("d8"), Color::White));
    }

    #[test]
    fn pinned_piece_cannot_expose_king() {
        let mut board = Board::new();
        // Black rook pinning the white e-pawn against the king: clear the
        // e7 pawn, drop the a8 rook on e6, lift the e2 pawn to e4.
        let rook = board.piece_at(sq("a8")).unwrap();
        deactivate(&mut board, "e7");
        place(&mut board, rook, "e6");
        let pawn = board.piece_at(sq("e2")).unwrap();
        place(&mut board, pawn, "e4");
        board.pieces[pawn.index()].has_moved = true;

        // Capturing d5 sideways would expose e1; pushing keeps the pin line.
        let enemy = board.piece_at(sq("d7")).unwrap();
        place(&mut board, enemy, "d5");
        assert!(board.is_legal_move(pawn, sq("d5")).is_none());
        assert!(board.is_legal_move(pawn, sq("e5")).is_some());
    }

    #[test]
    fn probe_overlay_is_always_cleared() {
        let mut board = Board::new();
        let pawn = board.piece_at(sq("e2")).unwrap();
        let _ = board.is_legal_move(pawn, sq("e4"));
        assert!(board.probe_cell().borrow().is_none());

        // Also after a move the self-check filter rejects.
        let rook = board.piece_at(sq("a8")).unwrap();
        deactivate(&mut board, "e2");
        place(&mut board, rook, "e6");
        let king = board.piece_at(sq("e1")).unwrap();
        assert!(board.is_legal_move(king, sq("e2")).is_none());
        assert!(board.probe_cell().borrow().is_none());
    }

    #[test]
    fn king_single_steps_only_into_safe_squares() {
        let mut board = Board::new();
        let king = board.piece_at(sq("e1")).unwrap();
        let enemy_rook = board.piece_at(sq("a8")).unwrap();
        deactivate(&mut board, "e2");
        deactivate(&mut board, "f2");
        place(&mut board, enemy_rook, "f4");

        // f2 sits on the enemy rook's file.
        assert!(board.is_legal_move(king, sq("f2")).is_none());
        assert!(board.is_legal_move(king, sq("e2")).is_some());
    }
}

use super::Board;
use crate::types::*;

impl Board {
    /// Every square the piece can legally move to right now. Drives
    /// destination highlighting and the terminal-state scan; empty for
    /// an unknown or inactive id.
    pub fn legal_destinations(&self, id: PieceId) -> Vec<Square> {
        let mut out = Vec::new();
        for cell in 0..64u8 {
            let to = Square(cell);
            if self.is_legal_move(id, to).is_some() {
                out.push(to);
            }
        }
        out
    }

    /// Whether a color has at least one legal move. Short-circuits on
    /// the first hit, so the common mid-game case stays cheap.
    pub fn has_any_legal_move(&self, color: Color) -> bool {
        for id in self.piece_ids_of(color) {
            if !self.is_active(id) {
                continue;
            }
            for cell in 0..64u8 {
                if self.is_legal_move(id, Square(cell)).is_some() {
                    return true;
                }
            }
        }
        false
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
    fn twenty_openings_per_side() {
        let board = Board::new();
        for color in [Color::White, Color::Black] {
            let total: usize = board
                .pieces()
                .iter()
                .filter(|p| p.color == color)
                .map(|p| board.legal_destinations(p.id).len())
                .sum();
            assert_eq!(total, 20);
        }
    }

    #[test]
    fn knight_destinations_from_start() {
        let board = Board::new();
        let knight = board.piece_at(sq("b1")).unwrap();
        let mut dests = board.legal_destinations(knight);
        dests.sort_by_key(|s| s.0);
        assert_eq!(dests, vec![sq("a3"), sq("c3")]);
    }

    #[test]
    fn both_sides_start_with_moves() {
        let board = Board::new();
        assert!(board.has_any_legal_move(Color::White));
        assert!(board.has_any_legal_move(Color::Black));
    }
}

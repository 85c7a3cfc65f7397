use super::Board;
use crate::error::EngineError;
use crate::types::*;

impl Board {
    /// Validates and executes one move for the side to move, then runs
    /// end-of-turn bookkeeping: the double-step flag sweep, the turn
    /// flip and the terminal-state scan. On any `Err` the board is
    /// untouched.
    pub fn attempt_move(&mut self, id: PieceId, to: Square) -> Result<MoveReport, EngineError> {
        if !to.on_board() {
            return Err(EngineError::OutOfBounds {
                file: to.file() as i16,
                rank: to.rank() as i16,
            });
        }
        if self.outcome.is_terminal() {
            return Err(EngineError::InvalidState("game is over"));
        }

        let piece = *self.piece(id).ok_or(EngineError::StaleReference(id))?;
        if !piece.active {
            return Err(EngineError::StaleReference(id));
        }
        let from = piece.square;
        if piece.color != self.turn {
            return Err(EngineError::IllegalMove { from, to });
        }

        let check = self
            .is_legal_move(id, to)
            .ok_or(EngineError::IllegalMove { from, to })?;

        let record = self.build_record(&piece, to, check.encountered)?;
        let captured_info = check.encountered.map(|c| {
            let captured = &self.pieces[c.index()];
            (captured.color, captured.kind)
        });
        let king_captured = matches!(captured_info, Some((_, PieceKind::King)));

        self.apply(&record);
        self.move_history.push(record);
        self.logger.log_move(
            record.mover,
            piece.kind,
            from,
            to,
            captured_info,
            record.castling.is_some(),
            record.promotion.is_some(),
        );

        if king_captured {
            // The game ends on the spot: no flag sweep, no turn flip.
            self.outcome = Outcome::KingCaptured(record.mover);
        } else {
            for p in self.pieces.iter_mut() {
                if p.active && p.kind == PieceKind::Pawn && p.id != id {
                    p.double_step = false;
                }
            }

            self.turn = record.mover.opposite();
            if !self.has_any_legal_move(self.turn) {
                self.outcome = if self.is_in_check(self.turn) {
                    Outcome::Checkmate(record.mover)
                } else {
                    Outcome::Stalemate
                };
            }
        }

        if self.outcome.is_terminal() {
            self.logger.log_outcome(self.outcome);
        }

        Ok(MoveReport {
            captured: check.encountered,
            castling: record.castling.is_some(),
            promotion: record.promotion.is_some(),
            outcome: self.outcome,
        })
    }

    /// Assembles the reversible record for a validated move. Nothing is
    /// mutated here; the record captures every flag `undo` has to put
    /// back, including the sweep victim's en passant window.
    fn build_record(
        &self,
        piece: &Piece,
        to: Square,
        captured: Option<PieceId>,
    ) -> Result<MoveRecord, EngineError> {
        let from = piece.square;
        let d_file = to.file() as i8 - from.file() as i8;
        let d_rank = to.rank() as i8 - from.rank() as i8;

        let castling = if piece.kind == PieceKind::King && d_file.abs() == 2 {
            let step = d_file.signum();
            let rook_file = if step > 0 {
                from.file() + 3
            } else {
                from.file() - 4
            };
            let rook_from = Square::new(rook_file, from.rank());
            let rook = self
                .piece_at(rook_from)
                .ok_or(EngineError::IllegalMove { from, to })?;
            Some(CastlingRecord {
                rook,
                rook_from,
                rook_to: Square::new((from.file() as i8 + step) as u8, from.rank()),
            })
        } else {
            None
        };

        let promotion = if piece.kind == PieceKind::Pawn && to.rank() == piece.color.promotion_rank()
        {
            Some(PromotionRecord {
                from_kind: PieceKind::Pawn,
                to_kind: PieceKind::Queen,
            })
        } else {
            None
        };

        let cleared_double_step = self
            .pieces
            .iter()
            .find(|p| p.active && p.double_step && p.id != piece.id)
            .map(|p| p.id);

        Ok(MoveRecord {
            piece: piece.id,
            kind: piece.kind,
            from,
            to,
            captured,
            was_first_move: !piece.has_moved,
            was_double_step: piece.kind == PieceKind::Pawn && d_rank.abs() == 2,
            cleared_double_step,
            castling,
            promotion,
            mover: piece.color,
        })
    }

    fn apply(&mut self, record: &MoveRecord) {
        if let Some(captured) = record.captured {
            // Deactivated in place: square and flags stay put for undo.
            self.pieces[captured.index()].active = false;
        }

        let mover = &mut self.pieces[record.piece.index()];
        mover.square = record.to;
        mover.has_moved = true;
        if record.was_double_step {
            mover.double_step = true;
        }
        if let Some(promotion) = record.promotion {
            mover.kind = promotion.to_kind;
            mover.was_promoted = true;
        }

        if let Some(castling) = record.castling {
            let rook = &mut self.pieces[castling.rook.index()];
            rook.square = castling.rook_to;
            rook.has_moved = true;
        }
    }

    /// Reverses the most recent move exactly, restoring positions,
    /// flags, captured pieces and the side to move.
    pub fn undo(&mut self) -> Result<UndoReport, EngineError> {
        if self.outcome.is_terminal() {
            return Err(EngineError::InvalidState("game is over"));
        }
        let record = self
            .move_history
            .pop()
            .ok_or(EngineError::InvalidState("no moves to undo"))?;

        let mover = &mut self.pieces[record.piece.index()];
        mover.square = record.from;
        mover.double_step = false;
        if record.was_first_move {
            mover.has_moved = false;
        }
        if let Some(promotion) = record.promotion {
            mover.kind = promotion.from_kind;
            mover.was_promoted = false;
        }

        if let Some(castling) = record.castling {
            let rook = &mut self.pieces[castling.rook.index()];
            rook.square = castling.rook_from;
            rook.has_moved = false;
        }

        if let Some(captured) = record.captured {
            self.pieces[captured.index()].active = true;
        }
        if let Some(swept) = record.cleared_double_step {
            // Reopens the en passant window the end-of-turn sweep closed.
            self.pieces[swept.index()].double_step = true;
        }

        self.turn = record.mover;
        self.logger
            .log_undo(record.mover, record.kind, record.from, record.to);

        Ok(UndoReport {
            piece: record.piece,
            from: record.from,
            to: record.to,
            revived: record.captured,
            castling: record.castling.is_some(),
            promotion: record.promotion.is_some(),
        })
    }
}

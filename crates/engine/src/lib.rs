//! Two-player chess engine core: board state, per-piece move
//! validation, check detection, turn sequencing with terminal-state
//! scanning, exact move undo, and JSON snapshots.
//!
//! The crate is presentation-agnostic. A UI drives it through
//! [`Board::attempt_move`], [`Board::legal_destinations`] and
//! [`Board::undo`], and reacts to the returned reports.

pub mod board;
pub mod error;
pub mod logger;
pub mod snapshot;
pub mod types;

pub use board::validation::PathCheck;
pub use board::Board;
pub use error::EngineError;
pub use logger::GameLogger;
pub use snapshot::{SavedGame, SavedMove, SavedPiece};
pub use types::*;

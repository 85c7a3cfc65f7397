use std::fs;
use std::io;
use std::path::Path;

use chrono::Local;

use crate::types::{Color, Outcome, PieceKind, Square};

/// In-memory game log. Entries accumulate in a buffer and are written
/// out in one shot with `save_to_file`, so logging never does I/O on
/// the move path.
#[derive(Debug, Clone)]
pub struct GameLogger {
    buffer: String,
    moves_logged: u32,
}

impl GameLogger {
    pub fn new() -> Self {
        let mut logger = Self {
            buffer: String::new(),
            moves_logged: 0,
        };
        let stamp = Local::now().format("%m/%d/%Y %H:%M:%S");
        logger.line(&format!("=== Game started {} ===", stamp));
        logger
    }

    fn line(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    pub fn log_move(
        &mut self,
        mover: Color,
        kind: PieceKind,
        from: Square,
        to: Square,
        captured: Option<(Color, PieceKind)>,
        castled: bool,
        promoted: bool,
    ) {
        self.moves_logged += 1;
        let mut entry = format!("{}. {} {} {} -> {}", self.moves_logged, mover, kind, from, to);
        if let Some((color, kind)) = captured {
            entry.push_str(&format!(", takes {} {}", color, kind));
        }
        if castled {
            entry.push_str(", castles");
        }
        if promoted {
            entry.push_str(", promotes to Queen");
        }
        self.line(&entry);
    }

    pub fn log_undo(&mut self, mover: Color, kind: PieceKind, from: Square, to: Square) {
        self.line(&format!("undo: {} {} {} -> {}", mover, kind, from, to));
        self.moves_logged = self.moves_logged.saturating_sub(1);
    }

    pub fn log_outcome(&mut self, outcome: Outcome) {
        self.line(&format!("=== {} ===", outcome));
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }

    pub fn save_to_file(&self, path: &Path) -> io::Result<()> {
        fs::write(path, &self.buffer)
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

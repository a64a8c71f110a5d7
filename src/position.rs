use pleco::Board;

use crate::conversion::{bitmove_to_move, polyglot_key};
use crate::error::Error;
use crate::opening_book::Move;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fen {
    fen_str: String,
}

// Side to move, castling, en passant, halfmove clock, fullmove number
static DEFAULT_FIELDS: [&str; 5] = ["w", "-", "-", "0", "1"];

impl Fen {
    /// Accepts anything from the bare board up to a full six-field FEN; missing
    /// trailing fields get their defaults.
    pub fn new(fen_str: &str) -> Result<Self, Error> {
        let mut fields: Vec<&str> = fen_str.split_whitespace().collect();
        if fields.is_empty() || fields.len() > 6 {
            return Err(Error::InvalidFen {
                fen_str: fen_str.to_owned(),
                reason: format!("expected 1 to 6 fields, found {}", fields.len()),
            });
        }
        let present = fields.len();
        fields.extend_from_slice(&DEFAULT_FIELDS[present - 1..]);
        Ok(Fen {
            fen_str: fields.join(" "),
        })
    }

    #[cfg(test)]
    pub fn starting_board() -> Self {
        Fen {
            fen_str: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_owned(),
        }
    }

    pub fn fen_str(&self) -> &str {
        &self.fen_str
    }
}

impl std::fmt::Display for Fen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fen_str.fmt(f)
    }
}

pub struct Position {
    fen: Fen,
    board: Board,
    key: u64,
}

impl Position {
    pub fn new(fen: Fen) -> Result<Self, Error> {
        let board = Board::from_fen(fen.fen_str()).map_err(|e| Error::InvalidFen {
            fen_str: fen.fen_str().to_owned(),
            reason: format!("{:?}", e),
        })?;
        let key = polyglot_key(fen.fen_str())?;
        Ok(Position { fen, board, key })
    }

    fn illegal_uci_move(&self, uci: &str) -> Error {
        Error::IllegalMove {
            fen_str: self.fen.fen_str().to_owned(),
            mv: uci.to_owned(),
        }
    }

    /// Looks a UCI move string up among the legal moves of this position.
    pub fn find_move(&self, uci: &str) -> Result<Move, Error> {
        self.board
            .generate_moves()
            .into_iter()
            .map(bitmove_to_move)
            .find(|mv| mv.to_string() == uci)
            .ok_or_else(|| self.illegal_uci_move(uci))
    }

    pub fn fen(&self) -> &Fen {
        &self.fen
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn key(&self) -> u64 {
        self.key
    }
}

use log::info;

use crate::engine::Analyser;
use crate::error::Error;
use crate::opening_book::{format_key, Book, Move};
use crate::position::Position;

pub struct BookBuilder {
    book: Book,
    weight: u16,
}

impl BookBuilder {
    pub fn new(weight: u16) -> Self {
        BookBuilder {
            book: Book::new(),
            weight,
        }
    }

    /// Asks `engine` for its best line from `position` and books the first move.
    pub fn add_analysis(
        &mut self,
        position: &Position,
        engine: &mut dyn Analyser,
        depth: u32,
    ) -> Result<Move, Error> {
        let pv = engine.principal_variation(position.fen(), depth)?;
        let best = pv.first().ok_or_else(|| Error::EmptyPrincipalVariation {
            fen_str: position.fen().fen_str().to_owned(),
        })?;
        let mv = position.find_move(best)?;
        info!(
            "Best move at depth {} for key {}: {} (line: {})",
            depth,
            format_key(position.key()),
            mv,
            pv.join(" ")
        );
        self.book.position(position.key()).add_move(mv, self.weight);
        Ok(mv)
    }

    #[cfg(test)]
    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn into_book(self) -> Book {
        self.book
    }
}

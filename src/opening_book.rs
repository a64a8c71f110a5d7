pub mod polyglot;

use crate::error::Error;
use crate::opening_book::polyglot::PolyglotEntry;

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const MAX_BOOK_WEIGHT: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Promotion {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl Promotion {
    pub fn rank(self) -> u8 {
        match self {
            Promotion::Knight => 1,
            Promotion::Bishop => 2,
            Promotion::Rook => 3,
            Promotion::Queen => 4,
        }
    }

    fn symbol(self) -> char {
        match self {
            Promotion::Knight => 'n',
            Promotion::Bishop => 'b',
            Promotion::Rook => 'r',
            Promotion::Queen => 'q',
        }
    }
}

/// A move as stored in the book. Squares run from a1 = 0 to h8 = 63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub promotion: Option<Promotion>,
    pub castling: bool,
}

impl Move {
    pub fn new(from: u8, to: u8, promotion: Option<Promotion>) -> Self {
        Move {
            from,
            to,
            promotion,
            castling: false,
        }
    }

    /// `to` is the square the king lands on.
    pub fn castle(from: u8, to: u8) -> Self {
        Move {
            from,
            to,
            promotion: None,
            castling: true,
        }
    }
}

fn square_name(square: u8) -> String {
    let file = (b'a' + square % 8) as char;
    let rank = (b'1' + square / 8) as char;
    format!("{}{}", file, rank)
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", square_name(self.from), square_name(self.to))?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.symbol())?;
        }
        Ok(())
    }
}

pub fn format_key(key: u64) -> String {
    format!("{:016x}", key)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookMove {
    pub mv: Move,
    pub weight: u16,
}

impl BookMove {
    pub fn new(mv: Move, weight: u16) -> Self {
        BookMove { mv, weight }
    }
}

#[derive(Debug, Default)]
pub struct BookPosition {
    moves: HashMap<String, BookMove>,
}

impl BookPosition {
    pub fn new() -> Self {
        BookPosition {
            moves: HashMap::new(),
        }
    }

    /// Adds `weight` to the move's record, creating it on first sight.
    /// Weights saturate at `u16::MAX`.
    pub fn add_move(&mut self, mv: Move, weight: u16) {
        self.moves
            .entry(mv.to_string())
            .and_modify(|book_move| book_move.weight = book_move.weight.saturating_add(weight))
            .or_insert_with(|| BookMove::new(mv, weight));
    }

    #[cfg(test)]
    pub fn get(&self, uci: &str) -> Option<&BookMove> {
        self.moves.get(uci)
    }

    pub fn moves(&self) -> impl Iterator<Item = &BookMove> {
        self.moves.values()
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}

#[derive(Debug, Default)]
pub struct Book {
    positions: HashMap<u64, BookPosition>,
}

impl Book {
    pub fn new() -> Self {
        Book {
            positions: HashMap::new(),
        }
    }

    pub fn position(&mut self, key: u64) -> &mut BookPosition {
        self.positions.entry(key).or_insert_with(BookPosition::new)
    }

    #[cfg(test)]
    pub fn get(&self, key: u64) -> Option<&BookPosition> {
        self.positions.get(&key)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.positions.values().map(BookPosition::move_count).sum()
    }

    /// All records, sorted by key, then move, heaviest first on ties.
    pub fn entries(&self) -> Vec<PolyglotEntry> {
        let mut entries: Vec<PolyglotEntry> = self
            .positions
            .iter()
            .flat_map(|(key, position)| {
                position
                    .moves()
                    .map(move |book_move| PolyglotEntry::new(*key, &book_move.mv, book_move.weight))
            })
            .collect();
        entries.sort_by(|a, b| {
            a.key
                .cmp(&b.key)
                .then(a.mv.cmp(&b.mv))
                .then(b.weight.cmp(&a.weight))
        });
        entries
    }

    pub fn write_polyglot<T: Write>(&self, mut destination: T) -> Result<usize, Error> {
        let entries = self.entries();
        for entry in &entries {
            entry.write_to(&mut destination)?;
        }
        destination.flush()?;
        Ok(entries.len())
    }

    /// Truncates `path` and writes the whole book to it.
    pub fn save_as_polyglot<P: AsRef<Path>>(&self, path: P) -> Result<usize, Error> {
        let file = File::create(path)?;
        self.write_polyglot(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::polyglot::{PolyglotEntry, ENTRY_SIZE};
    use super::*;

    fn e2e4() -> Move {
        Move::new(12, 28, None)
    }

    fn d2d4() -> Move {
        Move::new(11, 27, None)
    }

    #[test]
    fn it_renders_moves_as_uci() {
        assert_eq!(e2e4().to_string(), "e2e4");
        assert_eq!(Move::new(52, 60, Some(Promotion::Queen)).to_string(), "e7e8q");
        assert_eq!(Move::castle(4, 6).to_string(), "e1g1");
        assert_eq!(Move::new(0, 63, None).to_string(), "a1h8");
    }

    #[test]
    fn it_formats_keys_as_sixteen_hex_digits() {
        assert_eq!(format_key(1), "0000000000000001");
        assert_eq!(format_key(0x463B96181691FC9C), "463b96181691fc9c");
    }

    #[test]
    fn it_sums_weights_of_repeated_moves() {
        let mut position = BookPosition::new();
        position.add_move(e2e4(), 3);
        position.add_move(e2e4(), 500);
        position.add_move(e2e4(), 1000);
        assert_eq!(position.move_count(), 1);
        assert_eq!(position.get("e2e4").unwrap().weight, 1503);
    }

    #[test]
    fn it_sums_weights_regardless_of_order() {
        let weights = [7u16, 1000, 0, 42];
        let mut forward = BookPosition::new();
        let mut backward = BookPosition::new();
        for w in weights.iter() {
            forward.add_move(e2e4(), *w);
        }
        for w in weights.iter().rev() {
            backward.add_move(e2e4(), *w);
        }
        assert_eq!(forward.get("e2e4").unwrap().weight, 1049);
        assert_eq!(backward.get("e2e4").unwrap().weight, 1049);
    }

    #[test]
    fn it_keeps_distinct_moves_apart() {
        let mut position = BookPosition::new();
        position.add_move(e2e4(), 10);
        position.add_move(d2d4(), 20);
        position.add_move(e2e4(), 5);
        assert_eq!(position.move_count(), 2);
        assert_eq!(position.get("e2e4").unwrap().weight, 15);
        assert_eq!(position.get("d2d4").unwrap().weight, 20);
    }

    #[test]
    fn it_saturates_weights_at_the_field_maximum() {
        let mut position = BookPosition::new();
        for _ in 0..70 {
            position.add_move(e2e4(), MAX_BOOK_WEIGHT);
        }
        assert_eq!(position.get("e2e4").unwrap().weight, u16::MAX);
    }

    #[test]
    fn it_returns_the_same_position_for_the_same_key() {
        let mut book = Book::new();
        book.position(42).add_move(e2e4(), 1);
        book.position(42).add_move(e2e4(), 1);
        assert_eq!(book.len(), 1);
        assert_eq!(book.get(42).unwrap().get("e2e4").unwrap().weight, 2);
    }

    #[test]
    fn it_writes_the_reference_record() {
        let mut book = Book::new();
        book.position(0x0000000000000001)
            .add_move(e2e4(), MAX_BOOK_WEIGHT);
        let mut data = Vec::new();
        let written = book.write_polyglot(&mut data).unwrap();
        assert_eq!(written, 1);
        assert_eq!(
            data,
            vec![
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x03, 0x1C, 0x03, 0xE8, 0x00,
                0x00, 0x00, 0x00
            ]
        );
    }

    #[test]
    fn it_writes_nothing_for_an_empty_book() {
        let book = Book::new();
        let mut data = Vec::new();
        assert_eq!(book.write_polyglot(&mut data).unwrap(), 0);
        assert!(data.is_empty());
        assert!(book.is_empty());
    }

    #[test]
    fn it_writes_whole_records_sorted_by_key() {
        let mut book = Book::new();
        book.position(u64::MAX).add_move(e2e4(), 1);
        book.position(3).add_move(e2e4(), 2);
        book.position(3).add_move(d2d4(), 3);
        book.position(0x8000_0000_0000_0000).add_move(d2d4(), 4);

        let mut data = Vec::new();
        book.write_polyglot(&mut data).unwrap();
        assert_eq!(data.len() % ENTRY_SIZE, 0);
        assert_eq!(data.len(), book.entry_count() * ENTRY_SIZE);

        let entries: Vec<PolyglotEntry> = data
            .chunks(ENTRY_SIZE)
            .map(|chunk| PolyglotEntry::from_bytes(chunk).unwrap())
            .collect();
        let keys: Vec<u64> = entries.iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![3, 3, 0x8000_0000_0000_0000, u64::MAX]);
        // d2d4 packs lower than e2e4
        assert_eq!(entries[0].weight, 3);
        assert_eq!(entries[1].weight, 2);
        assert!(entries.iter().all(|e| e.learn == 0));
    }

    #[test]
    fn it_truncates_the_file_on_save() {
        let path = std::env::temp_dir().join(format!(
            "fen-book-builder-{}-save.bin",
            std::process::id()
        ));
        std::fs::write(&path, vec![0xAAu8; 40]).unwrap();

        let mut book = Book::new();
        book.position(1).add_move(e2e4(), MAX_BOOK_WEIGHT);
        book.save_as_polyglot(&path).unwrap();
        let data = std::fs::read(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(data.len(), ENTRY_SIZE);
        assert_eq!(&data[8..12], &[0x03, 0x1C, 0x03, 0xE8]);
    }

    #[test]
    fn it_saves_an_empty_book_as_an_empty_file() {
        let path = std::env::temp_dir().join(format!(
            "fen-book-builder-{}-empty.bin",
            std::process::id()
        ));
        std::fs::write(&path, vec![0xAAu8; 16]).unwrap();

        let book = Book::new();
        assert_eq!(book.save_as_polyglot(&path).unwrap(), 0);
        let len = std::fs::metadata(&path).unwrap().len();
        let _ = std::fs::remove_file(&path);

        assert_eq!(len, 0);
    }

    #[test]
    fn it_fails_when_the_destination_cannot_be_opened() {
        let book = Book::new();
        let path = std::env::temp_dir()
            .join("fen-book-builder-missing-dir")
            .join("book.bin");
        match book.save_as_polyglot(&path) {
            Err(Error::StdIo(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

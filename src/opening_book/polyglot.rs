//! Polyglot book records.
//!
//! A Polyglot book is a flat sequence of 16 byte big-endian records without header
//! or footer: an 8 byte position key, a 2 byte packed move, a 2 byte weight and a
//! 4 byte learning counter.

use crate::error::Error;
use crate::opening_book::Move;

use std::io::Write;

pub const ENTRY_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolyglotEntry {
    pub key: u64,
    pub mv: u16,
    pub weight: u16,
    pub learn: u32,
}

impl PolyglotEntry {
    pub fn new(key: u64, mv: &Move, weight: u16) -> Self {
        PolyglotEntry {
            key,
            mv: encode_move(mv),
            weight,
            learn: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0..8].copy_from_slice(&self.key.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.mv.to_be_bytes());
        bytes[10..12].copy_from_slice(&self.weight.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.learn.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < ENTRY_SIZE {
            return Err(Error::TruncatedEntry(bytes.len()));
        }
        let mut key = [0u8; 8];
        key.copy_from_slice(&bytes[0..8]);
        Ok(PolyglotEntry {
            key: u64::from_be_bytes(key),
            mv: u16::from_be_bytes([bytes[8], bytes[9]]),
            weight: u16::from_be_bytes([bytes[10], bytes[11]]),
            learn: u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }

    pub fn write_to<T: Write>(&self, destination: &mut T) -> Result<(), Error> {
        destination.write_all(&self.to_bytes())?;
        Ok(())
    }
}

/// Packs a move as `to + (from << 6) + ((promotion - 1) << 12)`.
///
/// Castling is stored as the king capturing its own rook (`e1h1`, `e8a8`, ...),
/// which is how Polyglot readers look castling moves up.
pub fn encode_move(mv: &Move) -> u16 {
    let to = if mv.castling {
        castling_rook_square(mv)
    } else {
        mv.to
    };
    let mut encoded = u16::from(to) + (u16::from(mv.from) << 6);
    if let Some(promotion) = mv.promotion {
        encoded += u16::from(promotion.rank() - 1) << 12;
    }
    encoded
}

fn castling_rook_square(mv: &Move) -> u8 {
    let rank_start = mv.to - mv.to % 8;
    if mv.to % 8 > mv.from % 8 {
        rank_start + 7
    } else {
        rank_start
    }
}

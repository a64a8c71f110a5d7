// Adapter tools between the crates pleco, shakmaty and the book's own move type
use pleco::core::piece_move::BitMove;
use pleco::core::sq::SQ;
use pleco::core::PieceType;
use shakmaty::fen::Fen as ShakmatyFen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, EnPassantMode};

use crate::error::Error;
use crate::opening_book::{Move, Promotion};

pub fn bitmove_to_move(bmv: BitMove) -> Move {
    let from = square_index(bmv.get_src());
    if bmv.is_king_castle() || bmv.is_queen_castle() {
        // Land on the g- or c-file, whichever square pleco uses as destination
        let rank_start = from - from % 8;
        let to = if bmv.is_king_castle() {
            rank_start + 6
        } else {
            rank_start + 2
        };
        return Move::castle(from, to);
    }
    Move::new(from, square_index(bmv.get_dest()), promotion(bmv))
}

fn square_index(sq: SQ) -> u8 {
    (sq.rank() as u8) * 8 + sq.file() as u8
}

fn promotion(bmv: BitMove) -> Option<Promotion> {
    if !bmv.is_promo() {
        return None;
    }
    match bmv.promo_piece() {
        PieceType::N => Some(Promotion::Knight),
        PieceType::B => Some(Promotion::Bishop),
        PieceType::R => Some(Promotion::Rook),
        PieceType::Q => Some(Promotion::Queen),
        _ => None,
    }
}

/// Zobrist key of the position using the Polyglot random table. The en passant
/// file only counts when a capture is actually possible.
pub fn polyglot_key(fen_str: &str) -> Result<u64, Error> {
    let invalid = |reason: String| Error::InvalidFen {
        fen_str: fen_str.to_owned(),
        reason,
    };
    let fen: ShakmatyFen = fen_str
        .parse()
        .map_err(|e: shakmaty::fen::ParseFenError| invalid(e.to_string()))?;
    let position: Chess = fen
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(e.to_string()))?;
    let hash: Zobrist64 = position.zobrist_hash(EnPassantMode::Legal);
    Ok(hash.0)
}

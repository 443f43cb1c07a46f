// Piece Values
pub const VAL_PAWN: i32 = 100;
pub const VAL_KNIGHT: i32 = 300;
pub const VAL_BISHOP: i32 = 320;
pub const VAL_ROOK: i32 = 500;
pub const VAL_QUEEN: i32 = 900;
pub const VAL_KING: i32 = 10000;

// Piece-Square Tables (White's point of view, flip ranks for Black)
// Index [rank][file], rank 0 is White's back rank.

#[rustfmt::skip]
pub const PST_PAWN: [[i32; 8]; 8] = [
    [  0,   0,   0,   0,   0,   0,   0,   0], // Rank 1 (never occupied)
    [  5,  10,  10, -20, -20,  10,  10,   5], // Starting rank
    [  5,  -5, -10,   0,   0, -10,  -5,   5],
    [  0,   0,   0,  20,  20,   0,   0,   0],
    [  5,   5,  10,  25,  25,  10,   5,   5],
    [ 10,  10,  20,  30,  30,  20,  10,  10],
    [ 50,  50,  50,  50,  50,  50,  50,  50], // About to promote
    [  0,   0,   0,   0,   0,   0,   0,   0],
];

#[rustfmt::skip]
pub const PST_KNIGHT: [[i32; 8]; 8] = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20,   0,   5,   5,   0, -20, -40],
    [-30,   5,  10,  15,  15,  10,   5, -30],
    [-30,   0,  15,  20,  20,  15,   0, -30],
    [-30,   5,  15,  20,  20,  15,   5, -30],
    [-30,   0,  10,  15,  15,  10,   0, -30],
    [-40, -20,   0,   0,   0,   0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

#[rustfmt::skip]
pub const PST_BISHOP: [[i32; 8]; 8] = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10,   5,   0,   0,   0,   0,   5, -10],
    [-10,  10,  10,  10,  10,  10,  10, -10],
    [-10,   0,  10,  10,  10,  10,   0, -10],
    [-10,   5,   5,  10,  10,   5,   5, -10],
    [-10,   0,   5,  10,  10,   5,   0, -10],
    [-10,   0,   0,   0,   0,   0,   0, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

#[rustfmt::skip]
pub const PST_ROOK: [[i32; 8]; 8] = [
    [  0,   0,   0,   5,   5,   0,   0,   0],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [  5,  10,  10,  10,  10,  10,  10,   5], // Seventh rank
    [  0,   0,   0,   0,   0,   0,   0,   0],
];

// Queen and king stay flat; rollouts are too short for king safety to matter.

use crate::logic::sim_board::{Side, SimPieceType};

pub const fn get_piece_value(pt: SimPieceType) -> i32 {
    match pt {
        SimPieceType::Pawn => VAL_PAWN,
        SimPieceType::Knight => VAL_KNIGHT,
        SimPieceType::Bishop => VAL_BISHOP,
        SimPieceType::Rook => VAL_ROOK,
        SimPieceType::Queen => VAL_QUEEN,
        SimPieceType::King => VAL_KING,
    }
}

pub fn get_pst_value(pt: SimPieceType, side: Side, rank: usize, file: usize) -> i32 {
    let r = if side == Side::White { rank } else { 7 - rank };

    let val = match pt {
        SimPieceType::Pawn => PST_PAWN.get(r).and_then(|row| row.get(file)),
        SimPieceType::Knight => PST_KNIGHT.get(r).and_then(|row| row.get(file)),
        SimPieceType::Bishop => PST_BISHOP.get(r).and_then(|row| row.get(file)),
        SimPieceType::Rook => PST_ROOK.get(r).and_then(|row| row.get(file)),
        _ => Some(&0),
    };
    *val.unwrap_or(&0)
}

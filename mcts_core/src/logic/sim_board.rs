//! Lightweight position used only inside rollouts.
//!
//! A plain 8x8 mailbox of optional pieces. Pieces are never created, captures
//! overwrite the destination cell, and promotion, castling and en passant are
//! not modelled. Move generation is pseudo-legal: the side to move may leave
//! its own king en prise, and the game ends when a king is actually captured.

use crate::logic::eval_constants::get_piece_value;
use crate::logic::move_list::SimMoveList;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }

    /// Rank delta of a pawn push.
    const fn forward(self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    const fn pawn_start_rank(self) -> u8 {
        match self {
            Self::White => 1,
            Self::Black => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimPieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPiece {
    pub side: Side,
    pub piece_type: SimPieceType,
    pub value: i32,
}

impl SimPiece {
    #[must_use]
    pub const fn new(side: Side, piece_type: SimPieceType) -> Self {
        Self {
            side,
            piece_type,
            value: get_piece_value(piece_type),
        }
    }

    /// Two-letter console code: colour then type (`K` king, `k` knight).
    pub const fn code(&self) -> [char; 2] {
        let colour = match self.side {
            Side::White => 'w',
            Side::Black => 'b',
        };
        let kind = match self.piece_type {
            SimPieceType::Pawn => 'p',
            SimPieceType::Knight => 'k',
            SimPieceType::Bishop => 'b',
            SimPieceType::Rook => 'r',
            SimPieceType::Queen => 'q',
            SimPieceType::King => 'K',
        };
        [colour, kind]
    }

    pub fn is_king(&self) -> bool {
        self.piece_type == SimPieceType::King
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SimSquare {
    pub rank: u8,
    pub file: u8,
}

impl SimSquare {
    #[must_use]
    pub const fn new(rank: u8, file: u8) -> Self {
        Self { rank, file }
    }

    /// Square shifted by `(dr, df)`, or `None` when it falls off the board.
    pub fn offset(self, dr: i8, df: i8) -> Option<Self> {
        let rank = self.rank.checked_add_signed(dr)?;
        let file = self.file.checked_add_signed(df)?;
        (rank < 8 && file < 8).then_some(Self { rank, file })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SimMove {
    pub from: SimSquare,
    pub to: SimSquare,
}

impl SimMove {
    #[must_use]
    pub const fn new(from: SimSquare, to: SimSquare) -> Self {
        Self { from, to }
    }

    /// Source and destination swapped.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-1, -2),
    (-2, -1),
    (-1, 2),
    (2, -1),
    (1, -2),
    (-2, 1),
    (1, 2),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];
const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const BACK_RANK: [SimPieceType; 8] = [
    SimPieceType::Rook,
    SimPieceType::Knight,
    SimPieceType::Bishop,
    SimPieceType::Queen,
    SimPieceType::King,
    SimPieceType::Bishop,
    SimPieceType::Knight,
    SimPieceType::Rook,
];

/// What a moving piece finds on a destination square.
enum Target {
    Empty,
    Friendly,
    Enemy,
    EnemyKing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimBoard {
    grid: [[Option<SimPiece>; 8]; 8],
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::empty()
    }
}

impl SimBoard {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            grid: [[None; 8]; 8],
        }
    }

    #[must_use]
    pub fn start_position() -> Self {
        let mut board = Self::empty();
        for (file, &pt) in (0u8..).zip(BACK_RANK.iter()) {
            board.set(SimSquare::new(0, file), Some(SimPiece::new(Side::White, pt)));
            board.set(SimSquare::new(7, file), Some(SimPiece::new(Side::Black, pt)));
            board.set(
                SimSquare::new(1, file),
                Some(SimPiece::new(Side::White, SimPieceType::Pawn)),
            );
            board.set(
                SimSquare::new(6, file),
                Some(SimPiece::new(Side::Black, SimPieceType::Pawn)),
            );
        }
        board
    }

    #[must_use]
    pub fn get(&self, sq: SimSquare) -> Option<SimPiece> {
        self.grid
            .get(usize::from(sq.rank))
            .and_then(|row| row.get(usize::from(sq.file)))
            .copied()
            .flatten()
    }

    pub fn set(&mut self, sq: SimSquare, piece: Option<SimPiece>) {
        if let Some(cell) = self
            .grid
            .get_mut(usize::from(sq.rank))
            .and_then(|row| row.get_mut(usize::from(sq.file)))
        {
            *cell = piece;
        }
    }

    /// Every occupied square, rank by rank from White's back rank.
    pub fn pieces(&self) -> impl Iterator<Item = (SimSquare, SimPiece)> + '_ {
        (0u8..).zip(self.grid.iter()).flat_map(|(rank, row)| {
            (0u8..)
                .zip(row.iter())
                .filter_map(move |(file, cell)| cell.map(|p| (SimSquare::new(rank, file), p)))
        })
    }

    /// Relocates the piece on `mv.from` to `mv.to` and returns whatever was
    /// captured there. No check validation, no bookkeeping.
    pub fn apply_move(&mut self, mv: SimMove) -> Option<SimPiece> {
        let Some(piece) = self.get(mv.from) else {
            debug_assert!(false, "No piece at source in apply_move: {mv:?}");
            return None;
        };
        let captured = self.get(mv.to);
        self.set(mv.from, None);
        self.set(mv.to, Some(piece));
        captured
    }

    /// Inverse of [`Self::apply_move`] given the piece it returned.
    pub fn undo_move(&mut self, mv: SimMove, captured: Option<SimPiece>) {
        let Some(piece) = self.get(mv.to) else {
            debug_assert!(false, "No piece at destination in undo_move: {mv:?}");
            return;
        };
        self.set(mv.to, captured);
        self.set(mv.from, Some(piece));
    }

    pub fn king_square(&self, side: Side) -> Option<SimSquare> {
        self.pieces()
            .find(|(_, p)| p.side == side && p.is_king())
            .map(|(sq, _)| sq)
    }

    pub fn has_king(&self, side: Side) -> bool {
        self.king_square(side).is_some()
    }

    /// All pseudo-legal moves of `side`. If any piece can capture the enemy
    /// king, the list holds only that capture.
    pub fn generate_moves(&self, side: Side) -> SimMoveList {
        let mut moves = SimMoveList::new();
        for (sq, piece) in self.pieces() {
            if piece.side == side && self.piece_moves(sq, &mut moves) {
                break;
            }
        }
        moves
    }

    /// Appends the moves of the piece on `from` to `out`.
    ///
    /// Returns `true` when the piece can take the enemy king; `out` is then
    /// replaced by that single move and the caller should stop generating.
    pub fn piece_moves(&self, from: SimSquare, out: &mut SimMoveList) -> bool {
        let Some(piece) = self.get(from) else {
            return false;
        };
        let side = piece.side;

        match piece.piece_type {
            SimPieceType::Pawn => self.pawn_moves(side, from, out),
            SimPieceType::Knight => self.step_moves(side, from, &KNIGHT_OFFSETS, out),
            SimPieceType::Bishop => self.slide_moves(side, from, &BISHOP_DIRECTIONS, out),
            SimPieceType::Rook => self.slide_moves(side, from, &ROOK_DIRECTIONS, out),
            SimPieceType::Queen => self.slide_moves(side, from, &QUEEN_DIRECTIONS, out),
            SimPieceType::King => self.step_moves(side, from, &KING_OFFSETS, out),
        }
    }

    fn classify(&self, side: Side, sq: SimSquare) -> Target {
        match self.get(sq) {
            None => Target::Empty,
            Some(p) if p.side == side => Target::Friendly,
            Some(p) if p.is_king() => Target::EnemyKing,
            Some(_) => Target::Enemy,
        }
    }

    fn pawn_moves(&self, side: Side, from: SimSquare, out: &mut SimMoveList) -> bool {
        let dir = side.forward();

        // Pushes never capture and never promote; a pawn on the last rank is stuck.
        if let Some(one) = from.offset(dir, 0) {
            if self.get(one).is_none() {
                out.push(SimMove::new(from, one));

                if from.rank == side.pawn_start_rank() {
                    if let Some(two) = one.offset(dir, 0) {
                        if self.get(two).is_none() {
                            out.push(SimMove::new(from, two));
                        }
                    }
                }
            }
        }

        for df in [1, -1] {
            let Some(to) = from.offset(dir, df) else {
                continue;
            };
            match self.classify(side, to) {
                Target::EnemyKing => {
                    out.replace_with(SimMove::new(from, to));
                    return true;
                }
                Target::Enemy => out.push(SimMove::new(from, to)),
                Target::Empty | Target::Friendly => {}
            }
        }
        false
    }

    fn step_moves(
        &self,
        side: Side,
        from: SimSquare,
        offsets: &[(i8, i8)],
        out: &mut SimMoveList,
    ) -> bool {
        for &(dr, df) in offsets {
            let Some(to) = from.offset(dr, df) else {
                continue;
            };
            match self.classify(side, to) {
                Target::EnemyKing => {
                    out.replace_with(SimMove::new(from, to));
                    return true;
                }
                Target::Empty | Target::Enemy => out.push(SimMove::new(from, to)),
                Target::Friendly => {}
            }
        }
        false
    }

    fn slide_moves(
        &self,
        side: Side,
        from: SimSquare,
        directions: &[(i8, i8)],
        out: &mut SimMoveList,
    ) -> bool {
        for &(dr, df) in directions {
            let mut cursor = from;
            while let Some(to) = cursor.offset(dr, df) {
                match self.classify(side, to) {
                    Target::Empty => out.push(SimMove::new(from, to)),
                    Target::Enemy => {
                        out.push(SimMove::new(from, to));
                        break;
                    }
                    Target::EnemyKing => {
                        out.replace_with(SimMove::new(from, to));
                        return true;
                    }
                    Target::Friendly => break,
                }
                cursor = to;
            }
        }
        false
    }
}

impl fmt::Display for SimBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.grid.iter().rev() {
            let line = row
                .iter()
                .map(|cell| cell.map_or_else(|| "--".to_string(), |p| p.code().iter().collect()))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

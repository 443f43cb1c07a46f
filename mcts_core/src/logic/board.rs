//! Full board used by the tree. Legality, check and mate detection are
//! delegated to the `chess` crate; the search only needs cloning, legal move
//! enumeration, move application and a lightweight snapshot for rollouts.

use crate::logic::sim_board::{Side, SimBoard, SimPiece, SimPieceType, SimSquare};
use chess::{BoardStatus, ChessMove, MoveGen, Piece, ALL_SQUARES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which under-promotions the tree generates. Pawn pushes to the last rank
/// otherwise fan out into four nearly identical children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromotionMode {
    #[default]
    All,
    QueenOnly,
    QueenAndKnight,
}

impl PromotionMode {
    pub const fn allows(self, promotion: Option<Piece>) -> bool {
        match (self, promotion) {
            (_, None) | (Self::All, _) | (_, Some(Piece::Queen)) => true,
            (Self::QueenAndKnight, Some(Piece::Knight)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    InvalidFen(String),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFen(fen) => write!(f, "invalid FEN: {fen}"),
        }
    }
}

impl std::error::Error for BoardError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Checkmate(SideName), // Winner
    Stalemate,
}

/// Serializable twin of [`Side`] for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideName {
    White,
    Black,
}

impl From<Side> for SideName {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Self::White,
            Side::Black => Self::Black,
        }
    }
}

/// What the tree needs from a full-rules position.
pub trait SearchBoard: Clone {
    type Move: Copy + PartialEq + fmt::Debug + fmt::Display;

    fn side_to_move(&self) -> Side;

    fn legal_moves(&self, promotions: PromotionMode) -> Vec<Self::Move>;

    /// Legality is the caller's responsibility.
    fn make_move(&mut self, mv: Self::Move);

    fn lightweight_clone(&self) -> SimBoard;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChessBoard {
    inner: chess::Board,
}

impl ChessBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        chess::Board::from_str(fen)
            .map(|inner| Self { inner })
            .map_err(|_| BoardError::InvalidFen(fen.to_string()))
    }

    pub fn to_fen(&self) -> String {
        self.inner.to_string()
    }

    pub const fn inner(&self) -> &chess::Board {
        &self.inner
    }

    pub fn status(&self) -> GameStatus {
        match self.inner.status() {
            BoardStatus::Ongoing => GameStatus::Playing,
            BoardStatus::Stalemate => GameStatus::Stalemate,
            BoardStatus::Checkmate => {
                GameStatus::Checkmate(self.side_to_move().opposite().into())
            }
        }
    }
}

const fn to_side(color: chess::Color) -> Side {
    match color {
        chess::Color::White => Side::White,
        chess::Color::Black => Side::Black,
    }
}

const fn to_sim_type(piece: Piece) -> SimPieceType {
    match piece {
        Piece::Pawn => SimPieceType::Pawn,
        Piece::Knight => SimPieceType::Knight,
        Piece::Bishop => SimPieceType::Bishop,
        Piece::Rook => SimPieceType::Rook,
        Piece::Queen => SimPieceType::Queen,
        Piece::King => SimPieceType::King,
    }
}

impl SearchBoard for ChessBoard {
    type Move = ChessMove;

    fn side_to_move(&self) -> Side {
        to_side(self.inner.side_to_move())
    }

    fn legal_moves(&self, promotions: PromotionMode) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.inner)
            .filter(|mv| promotions.allows(mv.get_promotion()))
            .collect()
    }

    fn make_move(&mut self, mv: ChessMove) {
        self.inner = self.inner.make_move_new(mv);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn lightweight_clone(&self) -> SimBoard {
        let mut sim = SimBoard::empty();
        for sq in ALL_SQUARES {
            if let (Some(piece), Some(color)) = (self.inner.piece_on(sq), self.inner.color_on(sq)) {
                let at = SimSquare::new(sq.get_rank().to_index() as u8, sq.get_file().to_index() as u8);
                sim.set(at, Some(SimPiece::new(to_side(color), to_sim_type(piece))));
            }
        }
        sim
    }
}

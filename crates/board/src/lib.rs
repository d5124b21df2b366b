//! Minesweeper board model used by both sides of a duel.
//!
//! A [`Board`] keeps a grid of [`Square`]s together with a flattened,
//! row-major [`Symbol`] snapshot. The snapshot is the wire format: it is
//! what gets uploaded for the opponent to mirror, and what
//! [`Board::merge_snapshot`] consumes on the receiving side.
//!
//! # Symbol grammar
//!
//! | Symbol | Meaning |
//! |--------|---------|
//! | `c` | covered, value hidden |
//! | `f` | flagged |
//! | `b` | revealed mine |
//! | `0`..`8` | uncovered, neighbour mine count |

pub mod board;
pub mod error;
pub mod square;
pub mod symbol;

pub use board::{Board, Reveal};
pub use error::BoardError;
pub use square::{MINE, Square};
pub use symbol::Symbol;

//! A single board square.

use crate::symbol::Symbol;

/// Square value marking a mine.
pub const MINE: i8 = -1;

/// One square of a board: its cover state plus its value (`0..=8`, or
/// [`MINE`]).
///
/// Squares are plain values. Every state change produces a new `Square`,
/// so a square stored in the grid never aliases one handed out elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Square {
    Covered(i8),
    Flagged(i8),
    Uncovered(i8),
}

impl Default for Square {
    fn default() -> Self {
        Self::Covered(0)
    }
}

impl Square {
    pub const fn value(self) -> i8 {
        match self {
            Self::Covered(v) | Self::Flagged(v) | Self::Uncovered(v) => v,
        }
    }

    pub const fn is_mine(self) -> bool {
        self.value() == MINE
    }

    /// Covered or flagged.
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Covered(_) | Self::Flagged(_))
    }

    /// A covered, unflagged square that is not a mine. Only these can be
    /// uncovered by a reveal.
    pub const fn is_trivial(self) -> bool {
        matches!(self, Self::Covered(v) if v != MINE)
    }

    pub fn symbol(self) -> Symbol {
        match self {
            Self::Covered(_) => Symbol::Covered,
            Self::Flagged(_) => Symbol::Flagged,
            Self::Uncovered(MINE) => Symbol::Mine,
            Self::Uncovered(v) => Symbol::Number(v.clamp(0, 8) as u8),
        }
    }

    /// Uncovers a trivial square.
    ///
    /// # Panics
    ///
    /// Panics if the square is not covered, is flagged, or is a mine.
    pub fn uncover(self) -> Self {
        match self {
            Self::Covered(v) if v != MINE => Self::Uncovered(v),
            other => panic!("cannot uncover {other:?}: only covered non-mine squares can be uncovered"),
        }
    }

    /// Flips between covered and flagged.
    ///
    /// # Panics
    ///
    /// Panics if the square is uncovered.
    pub fn toggle_flag(self) -> Self {
        match self {
            Self::Covered(v) => Self::Flagged(v),
            Self::Flagged(v) => Self::Covered(v),
            Self::Uncovered(_) => panic!("cannot flag an uncovered square"),
        }
    }

    /// Exposes a mine square as [`Symbol::Mine`], whatever its cover state.
    ///
    /// # Panics
    ///
    /// Panics if the square is not a mine.
    pub fn explode(self) -> Self {
        assert!(self.is_mine(), "cannot explode a non-mine square {self:?}");
        Self::Uncovered(MINE)
    }

    /// Rebuilds a square from a wire symbol.
    ///
    /// Symbols that do not carry a value (`c`, `f`) keep the value of
    /// `previous`. Only a square that is still hidden can be covered or
    /// flagged.
    pub fn from_symbol(symbol: Symbol, previous: Square) -> Result<Self, &'static str> {
        match symbol {
            Symbol::Covered if previous.is_hidden() => Ok(Self::Covered(previous.value())),
            Symbol::Covered => Err("cannot cover an uncovered square"),
            Symbol::Flagged if previous.is_hidden() => Ok(Self::Flagged(previous.value())),
            Symbol::Flagged => Err("cannot flag an uncovered square"),
            Symbol::Mine => Ok(Self::Uncovered(MINE)),
            Symbol::Number(n) => Ok(Self::Uncovered(n as i8)),
        }
    }
}

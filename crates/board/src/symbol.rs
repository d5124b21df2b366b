//! Per-square wire symbols.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// One entry of a board snapshot.
///
/// Serialized as a short string (`"c"`, `"f"`, `"b"`, `"0"`..`"8"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    /// Covered, value hidden.
    Covered,
    /// Covered with a flag on it.
    Flagged,
    /// A revealed (or exploded) mine.
    Mine,
    /// Uncovered, with the number of neighbouring mines.
    Number(u8),
}

impl Symbol {
    /// Whether this symbol still hides its square (covered or flagged).
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Covered | Self::Flagged)
    }

    /// The wire token for this symbol.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Covered => "c",
            Self::Flagged => "f",
            Self::Mine => "b",
            Self::Number(n) => match n {
                0 => "0",
                1 => "1",
                2 => "2",
                3 => "3",
                4 => "4",
                5 => "5",
                6 => "6",
                7 => "7",
                _ => "8",
            },
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" => Ok(Self::Covered),
            "f" => Ok(Self::Flagged),
            "b" => Ok(Self::Mine),
            _ => match s.parse::<u8>() {
                Ok(n) if n <= 8 && s.len() == 1 => Ok(Self::Number(n)),
                _ => Err(BoardError::UnknownSymbol(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for Symbol {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.as_str().to_string()
    }
}

//! Session phases and the per-role view of them.

use std::fmt;

use crate::result::{Outcome, Reason};

/// Phase of a match, shared by both sides through the `state` key.
///
/// The wire form is the ordinal as a decimal string (`"0"`..`"6"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    Connecting = 0,
    Waiting = 1,
    Playing = 2,
    HostWin = 3,
    GuestWin = 4,
    HostExited = 5,
    GuestExited = 6,
}

impl GameState {
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(n: i64) -> Option<Self> {
        Some(match n {
            0 => Self::Connecting,
            1 => Self::Waiting,
            2 => Self::Playing,
            3 => Self::HostWin,
            4 => Self::GuestWin,
            5 => Self::HostExited,
            6 => Self::GuestExited,
            _ => return None,
        })
    }

    /// Decodes a `state` key body. Absent (`null`), non-numeric and
    /// out-of-range values all decode to `None`.
    pub fn from_wire(text: &str) -> Option<Self> {
        text.trim().parse::<i64>().ok().and_then(Self::from_ordinal)
    }

    pub fn to_wire(self) -> String {
        self.ordinal().to_string()
    }

    /// The four outcome states. Reaching one ends the session.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::HostWin | Self::GuestWin | Self::HostExited | Self::GuestExited
        )
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::HostWin => "host win",
            Self::GuestWin => "guest win",
            Self::HostExited => "host exited",
            Self::GuestExited => "guest exited",
        };
        f.write_str(name)
    }
}

/// Which side of the match this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub const fn opponent(self) -> Self {
        match self {
            Self::Host => Self::Guest,
            Self::Guest => Self::Host,
        }
    }

    /// Sub-key this role uploads its player record to.
    pub const fn upload_key(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Guest => "opponent",
        }
    }

    /// Sub-key holding the other side's player record.
    pub const fn download_key(self) -> &'static str {
        self.opponent().upload_key()
    }

    pub const fn win_state(self) -> GameState {
        match self {
            Self::Host => GameState::HostWin,
            Self::Guest => GameState::GuestWin,
        }
    }

    pub const fn exit_state(self) -> GameState {
        match self {
            Self::Host => GameState::HostExited,
            Self::Guest => GameState::GuestExited,
        }
    }

    /// What a polled terminal state means for this side.
    ///
    /// A win state for this role can only be written by the opponent when
    /// they hit a mine. The opponent's own win or exit ends the match as a
    /// loss. This role's own exit state is never read back as an outcome:
    /// only this side writes it, while closing.
    pub fn judge(self, observed: GameState) -> Option<(Outcome, Reason)> {
        let opponent = self.opponent();
        if observed == self.win_state() {
            Some((Outcome::Won, Reason::OpponentHitMine))
        } else if observed == opponent.win_state() {
            Some((Outcome::Lost, Reason::OpponentCleared))
        } else if observed == opponent.exit_state() {
            Some((Outcome::Lost, Reason::OpponentExited))
        } else {
            None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Host => "host",
            Self::Guest => "guest",
        })
    }
}

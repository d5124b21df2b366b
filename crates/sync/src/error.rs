//! Sync error types.

use minesduel_board::BoardError;
use minesduel_store::StoreError;

use crate::state::GameState;

/// Rejected game settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("board width {0} is outside 1..=40")]
    Width(usize),

    #[error("board height {0} is outside 1..=25")]
    Height(usize),

    #[error("bomb count {bombs} is outside 1..={max}")]
    Bombs { bombs: usize, max: usize },

    #[error("unknown difficulty {0:?}")]
    UnknownDifficulty(String),
}

/// A player record that could not be read or merged.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("malformed player data: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Matchmaking failures.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("there is currently no game queued")]
    NoGameQueued,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed value at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl LobbyError {
    /// Connectivity problems are worth retrying; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::NoGameQueued)
    }
}

/// Session set-up failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("document store unavailable: {0}")]
    Unavailable(#[from] StoreError),

    #[error("malformed game state {0:?}")]
    MalformedState(String),

    #[error("game is not open to join (state {0:?})")]
    NotJoinable(GameState),

    #[error("game session not found")]
    Missing,

    #[error("session already established")]
    AlreadyEstablished,

    #[error(transparent)]
    Board(#[from] BoardError),
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

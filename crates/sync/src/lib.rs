//! Two-player minesweeper session sync.
//!
//! Host and guest never talk to each other directly. Each side uploads its
//! own player record and polls the other's through a shared document
//! store, once per second, and both replicate the same small
//! [`GameState`] machine from what they read back.

pub mod data;
pub mod error;
pub mod keys;
pub mod lobby;
pub mod pipeline;
pub mod player;
pub mod result;
pub mod session;
pub mod settings;
pub mod state;
pub mod stopwatch;

pub use data::MultiplayerData;
pub use error::{DataError, LobbyError, SessionError, SettingsError};
pub use keys::SessionKeys;
pub use lobby::Lobby;
pub use pipeline::{PipelineConfig, TaskPipeline};
pub use player::PlayerData;
pub use result::{MatchResult, Outcome, Reason, format_time};
pub use session::{Session, SessionConfig, SessionEvent};
pub use settings::{Difficulty, GameSettings};
pub use state::{GameState, Role};
pub use stopwatch::Stopwatch;

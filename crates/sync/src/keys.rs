//! Store key layout.
//!
//! ```text
//! queue                      open session ids, JSON array
//! game_id                    next session id
//! {game}{id}/settings        GameSettings JSON
//! {game}{id}/state           GameState ordinal
//! {game}{id}/host            host PlayerData JSON
//! {game}{id}/opponent        guest PlayerData JSON
//! ```

use crate::state::Role;

pub const QUEUE_KEY: &str = "queue";
pub const GAME_ID_KEY: &str = "game_id";
pub const DEFAULT_GAME_NAME: &str = "OOPGame";

/// Keys of one session, namespaced under `{game}{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    root: String,
}

impl SessionKeys {
    pub fn new(game_name: &str, session_id: u64) -> Self {
        Self {
            root: format!("{game_name}{session_id}"),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn state(&self) -> String {
        format!("{}/state", self.root)
    }

    pub fn settings(&self) -> String {
        format!("{}/settings", self.root)
    }

    /// Key `role` uploads its player record to.
    pub fn player(&self, role: Role) -> String {
        format!("{}/{}", self.root, role.upload_key())
    }
}

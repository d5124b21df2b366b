//! Shared session record.

use minesduel_board::BoardError;

use crate::error::DataError;
use crate::player::PlayerData;
use crate::settings::GameSettings;
use crate::state::{GameState, Role};

/// State, settings and both player records of one match, as seen from one
/// side. The local player's record is written locally; the other one is a
/// mirror fed by downloads.
#[derive(Debug, Clone)]
pub struct MultiplayerData {
    state: GameState,
    settings: GameSettings,
    host: PlayerData,
    guest: PlayerData,
}

impl MultiplayerData {
    pub fn new(settings: GameSettings) -> Result<Self, BoardError> {
        Ok(Self {
            state: GameState::Connecting,
            host: PlayerData::new(&settings)?,
            guest: PlayerData::new(&settings)?,
            settings,
        })
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Local transition only; publishing is the session's job.
    pub fn set_state(&mut self, state: GameState) {
        self.state = state;
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn player(&self, role: Role) -> &PlayerData {
        match role {
            Role::Host => &self.host,
            Role::Guest => &self.guest,
        }
    }

    pub fn player_mut(&mut self, role: Role) -> &mut PlayerData {
        match role {
            Role::Host => &mut self.host,
            Role::Guest => &mut self.guest,
        }
    }

    /// Merges a downloaded record into `role`'s player data.
    ///
    /// Only applies while [`GameState::Playing`]; returns whether it did.
    pub fn merge(&mut self, role: Role, json: &str) -> Result<bool, DataError> {
        if self.state != GameState::Playing {
            return Ok(false);
        }
        self.player_mut(role).merge_json(json)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(data: &mut MultiplayerData, role: Role) -> String {
        data.player_mut(role).to_json().unwrap()
    }

    #[test]
    fn merge_only_while_playing() {
        let settings = GameSettings::new(5, 5, 3).unwrap();
        let mut remote = MultiplayerData::new(settings).unwrap();
        remote.player_mut(Role::Guest).board.place_mines(&[(0, 0), (1, 0), (2, 0)]);
        remote.player_mut(Role::Guest).board.reveal(4, 4);
        let json = payload(&mut remote, Role::Guest);

        let mut local = MultiplayerData::new(settings).unwrap();
        assert_eq!(local.state(), GameState::Connecting);
        assert!(!local.merge(Role::Guest, &json).unwrap());
        assert!(local.player(Role::Guest).board.snapshot().iter().all(|s| s.is_hidden()));

        local.set_state(GameState::Playing);
        assert!(local.merge(Role::Guest, &json).unwrap());
        assert_eq!(
            local.player(Role::Guest).board.snapshot(),
            remote.player(Role::Guest).board.snapshot()
        );

        local.set_state(GameState::HostWin);
        assert!(!local.merge(Role::Guest, "garbage").unwrap());
    }

    #[test]
    fn merge_error_surfaces() {
        let settings = GameSettings::new(5, 5, 3).unwrap();
        let mut local = MultiplayerData::new(settings).unwrap();
        local.set_state(GameState::Playing);
        assert!(local.merge(Role::Host, "{}").is_err());
    }
}

//! Matchmaking over the store.
//!
//! Hosts append their session id to the `queue` key; guests pick one at
//! random and take it off the queue.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use minesduel_store::{ABSENT, Client};

use crate::error::LobbyError;
use crate::keys::{GAME_ID_KEY, QUEUE_KEY, SessionKeys};
use crate::settings::GameSettings;
use crate::state::GameState;

/// Hosts and joins sessions under one game name.
#[derive(Clone)]
pub struct Lobby {
    client: Client,
    game_name: String,
}

impl Lobby {
    pub fn new(client: Client, game_name: impl Into<String>) -> Self {
        Self {
            client,
            game_name: game_name.into(),
        }
    }

    pub fn keys(&self, session_id: u64) -> SessionKeys {
        SessionKeys::new(&self.game_name, session_id)
    }

    /// Reads `path` as `T`, or `None` when nothing is stored there.
    async fn read<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, LobbyError> {
        let body = self.client.try_get(path).await?;
        if body.trim() == ABSENT {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| LobbyError::Malformed {
                path: path.to_string(),
                source,
            })
    }

    async fn read_queue(&self) -> Result<Vec<u64>, LobbyError> {
        Ok(self.read(QUEUE_KEY).await?.unwrap_or_default())
    }

    async fn write<T: serde::Serialize>(&self, path: &str, value: &T) -> Result<(), LobbyError> {
        let json = serde_json::to_string(value).map_err(|source| LobbyError::Malformed {
            path: path.to_string(),
            source,
        })?;
        self.client.try_put(path, &json).await?;
        Ok(())
    }

    /// Registers a new session and queues it for a guest.
    ///
    /// Returns `settings` carrying the allocated session id.
    pub async fn host_game(&self, settings: GameSettings) -> Result<GameSettings, LobbyError> {
        settings.validate()?;

        let mut queue = self.read_queue().await?;
        let id: u64 = self.read(GAME_ID_KEY).await?.unwrap_or(0);
        queue.push(id);

        self.write(QUEUE_KEY, &queue).await?;
        self.write(GAME_ID_KEY, &(id + 1)).await?;

        let keys = self.keys(id);
        let record = json!({
            "settings": settings,
            "state": GameState::Connecting.ordinal(),
        });
        self.write(keys.root(), &record).await?;

        info!(session_id = id, "game hosted");
        Ok(settings.with_session_id(id))
    }

    /// Takes a random live session off the queue.
    pub async fn join_game(&self) -> Result<GameSettings, LobbyError> {
        self.join_game_with(&mut StdRng::from_entropy()).await
    }

    /// [`join_game`](Self::join_game) with a caller-supplied RNG.
    ///
    /// Ids whose `state` key is gone are ghosts of abandoned sessions; they
    /// are dropped from the queue and skipped.
    pub async fn join_game_with<R: Rng + Send>(&self, rng: &mut R) -> Result<GameSettings, LobbyError> {
        let mut queue = self.read_queue().await?;
        let original_len = queue.len();

        let id = loop {
            if queue.is_empty() {
                if queue.len() != original_len {
                    self.write(QUEUE_KEY, &queue).await?;
                }
                return Err(LobbyError::NoGameQueued);
            }

            let id = queue.remove(rng.gen_range(0..queue.len()));
            let state = self.client.try_get(&self.keys(id).state()).await?;
            if GameState::from_wire(&state).is_some() {
                break id;
            }
            debug!(session_id = id, "skipping ghost session");
        };

        self.write(QUEUE_KEY, &queue).await?;

        let keys = self.keys(id);
        let settings: GameSettings = self
            .read(&keys.settings())
            .await?
            .ok_or(LobbyError::NoGameQueued)?;
        settings.validate()?;

        info!(session_id = id, "game joined");
        Ok(settings.with_session_id(id))
    }
}

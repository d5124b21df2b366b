//! One side of a running match.
//!
//! A session uploads the local player record and polls the opponent's once
//! per sync interval through two [`TaskPipeline`]s, replicates the shared
//! [`GameState`] from the `state` key and ends itself when the state
//! reaches an outcome.
//!
//! Teardown runs once, in this order: publish the exit state if still
//! playing, stop the clock, cancel and join the sync loop, close both
//! pipelines, join pending state publishes, delete remote player data,
//! mark closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use minesduel_board::Reveal;
use minesduel_store::{ABSENT, Client};

use crate::data::MultiplayerData;
use crate::error::SessionError;
use crate::keys::{DEFAULT_GAME_NAME, SessionKeys};
use crate::pipeline::{PipelineConfig, TaskPipeline, download_pipeline, upload_pipeline};
use crate::result::{MatchResult, Outcome, Reason};
use crate::settings::GameSettings;
use crate::state::{GameState, Role};
use crate::stopwatch::Stopwatch;

const EVENT_CAPACITY: usize = 64;

/// Session tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Prefix of every session key.
    pub game_name: String,
    /// How often an upload and a download are submitted.
    pub sync_interval: Duration,
    pub pipeline: PipelineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game_name: DEFAULT_GAME_NAME.to_string(),
            sync_interval: Duration::from_secs(1),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Events emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The local view of the game state changed.
    StateChanged(GameState),
    /// The match ended. Sent at most once.
    Finished(MatchResult),
    /// The session was torn down. Always the last event.
    Closed,
}

/// State reachable from the pipeline tasks. Holds nothing that owns those
/// tasks.
struct Shared {
    role: Role,
    keys: SessionKeys,
    client: Client,
    data: Mutex<MultiplayerData>,
    stopwatch: Stopwatch,
    events_tx: mpsc::Sender<SessionEvent>,
    finished: AtomicBool,
    close_request: CancellationToken,
    publishes: Mutex<JoinSet<()>>,
}

impl Shared {
    fn data(&self) -> MutexGuard<'_, MultiplayerData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            debug!(role = %self.role, error = %e, "session event dropped");
        }
    }

    /// Writes `state` to the store in the background. The write is joined
    /// when the session closes.
    fn publish(&self, state: GameState) {
        let client = self.client.clone();
        let path = self.keys.state();
        let role = self.role;
        let mut publishes = self.publishes.lock().unwrap_or_else(PoisonError::into_inner);
        publishes.spawn(async move {
            if client.put(&path, &state.to_wire()).await {
                debug!(%role, %state, "state published");
            } else {
                warn!(%role, %state, "state publish failed");
            }
        });
    }

    fn request_close(&self) {
        self.close_request.cancel();
    }

    /// Adopts a polled remote state.
    ///
    /// Once the local state is an outcome it is final: a stale poll can no
    /// longer pull it back to `Playing`. A guest that is playing never
    /// drops back to a pre-game state either; it publishes `Playing` again
    /// instead, since a host start-up that raced the guest's join may have
    /// overwritten it with `Waiting`.
    fn observe_state(&self, remote: GameState) {
        let previous = {
            let mut data = self.data();
            let local = data.state();
            if local.is_terminal() {
                return;
            }
            if self.role == Role::Guest
                && local == GameState::Playing
                && matches!(remote, GameState::Connecting | GameState::Waiting)
            {
                drop(data);
                warn!(role = %self.role, remote = %remote, "pre-game state read back while playing, republishing");
                self.publish(GameState::Playing);
                return;
            }
            data.set_state(remote);
            local
        };

        if previous != remote {
            info!(role = %self.role, from = %previous, to = %remote, "game state changed");
            self.emit(SessionEvent::StateChanged(remote));
        }
        self.judge(remote);
    }

    /// Download consumer: merges the opponent's record.
    fn merge_opponent(&self, json: &str) {
        let merged = self.data().merge(self.role.opponent(), json);
        match merged {
            Ok(true) => self.stopwatch.start(),
            Ok(false) => {}
            Err(e) => {
                error!(role = %self.role, error = %e, "cannot merge opponent data, closing session");
                self.request_close();
                return;
            }
        }

        let state = self.data().state();
        self.judge(state);
    }

    fn judge(&self, state: GameState) {
        if let Some((outcome, reason)) = self.role.judge(state) {
            self.finish(outcome, reason);
        }
    }

    /// Surfaces the result once and asks the watcher to close.
    fn finish(&self, outcome: Outcome, reason: Reason) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stopwatch.stop();

        let result = {
            let data = self.data();
            MatchResult {
                outcome,
                reason,
                flags_left: data.player(self.role).board.flags_left(),
                total_flags: data.settings().bomb_count,
                time_played: self.stopwatch.elapsed(),
            }
        };
        info!(role = %self.role, ?outcome, %reason, time = result.time_played, "match finished");
        self.emit(SessionEvent::Finished(result));
        self.request_close();
    }
}

struct Runtime {
    upload: Arc<TaskPipeline<bool>>,
    download: Arc<TaskPipeline<String>>,
    sync_loop: JoinHandle<()>,
}

struct Inner {
    shared: Arc<Shared>,
    config: SessionConfig,
    cancel: CancellationToken,
    runtime: tokio::sync::Mutex<Option<Runtime>>,
    events_rx: tokio::sync::Mutex<Option<mpsc::Receiver<SessionEvent>>>,
    closing: AtomicBool,
    closed: CancellationToken,
}

/// Handle to one side of a match. Clones share the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    /// Wraps prepared match data. The local player's mines must already be
    /// placed.
    pub fn new(role: Role, data: MultiplayerData, client: Client, config: SessionConfig) -> Self {
        let keys = SessionKeys::new(&config.game_name, data.settings().session_id);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);

        let shared = Arc::new(Shared {
            role,
            keys,
            client,
            data: Mutex::new(data),
            stopwatch: Stopwatch::new(),
            events_tx,
            finished: AtomicBool::new(false),
            close_request: CancellationToken::new(),
            publishes: Mutex::new(JoinSet::new()),
        });

        Self {
            inner: Arc::new(Inner {
                shared,
                config,
                cancel: CancellationToken::new(),
                runtime: tokio::sync::Mutex::new(None),
                events_rx: tokio::sync::Mutex::new(Some(events_rx)),
                closing: AtomicBool::new(false),
                closed: CancellationToken::new(),
            }),
        }
    }

    /// Creates a session with randomly placed mines on the local board.
    pub fn create(
        role: Role,
        settings: GameSettings,
        client: Client,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let mut data = MultiplayerData::new(settings)?;
        data.player_mut(role).board.populate_mines()?;
        Ok(Self::new(role, data, client, config))
    }

    pub fn role(&self) -> Role {
        self.inner.shared.role
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.inner.shared.keys
    }

    pub fn state(&self) -> GameState {
        self.inner.shared.data().state()
    }

    /// Seconds on the local clock.
    pub fn time_played(&self) -> u32 {
        self.inner.shared.stopwatch.elapsed()
    }

    /// Runs `f` against the current match data.
    pub fn with_data<R>(&self, f: impl FnOnce(&MultiplayerData) -> R) -> R {
        f(&self.inner.shared.data())
    }

    pub fn is_finished(&self) -> bool {
        self.inner.shared.finished.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Takes the event receiver. Can only be called once.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<SessionEvent>> {
        self.inner.events_rx.lock().await.take()
    }

    /// Runs the start-up handshake and starts syncing.
    ///
    /// The host announces `Waiting` (or adopts `Playing` if a guest got in
    /// first). The guest only joins a session that is still connecting or
    /// waiting, and announces `Playing`. Store failures here are returned
    /// as retryable errors and leave the session ready for another try.
    pub async fn establish(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let shared = &inner.shared;
        let mut runtime = inner.runtime.lock().await;
        if runtime.is_some() || inner.closing.load(Ordering::SeqCst) {
            return Err(SessionError::AlreadyEstablished);
        }

        let state_key = shared.keys.state();
        let body = shared.client.try_get(&state_key).await?;
        let remote = if body.trim() == ABSENT {
            None
        } else {
            Some(GameState::from_wire(&body).ok_or_else(|| SessionError::MalformedState(body.clone()))?)
        };

        let start = match (shared.role, remote) {
            (Role::Host, Some(GameState::Playing)) => GameState::Playing,
            (Role::Host, None | Some(GameState::Connecting | GameState::Waiting)) => {
                shared.client.try_put(&state_key, &GameState::Waiting.to_wire()).await?;
                GameState::Waiting
            }
            (Role::Guest, Some(GameState::Connecting | GameState::Waiting)) => {
                shared.client.try_put(&state_key, &GameState::Playing.to_wire()).await?;
                GameState::Playing
            }
            (Role::Guest, None) => return Err(SessionError::Missing),
            (_, Some(other)) => return Err(SessionError::NotJoinable(other)),
        };
        shared.data().set_state(start);
        shared.emit(SessionEvent::StateChanged(start));

        let role = shared.role;
        let upload = Arc::new(upload_pipeline(inner.config.pipeline, &inner.cancel, move |ok| {
            if !ok {
                debug!(%role, "upload did not land this cycle");
            }
        }));
        let download = Arc::new(download_pipeline(inner.config.pipeline, &inner.cancel, {
            let shared = Arc::clone(shared);
            move |json: String| shared.merge_opponent(&json)
        }));
        let sync_loop = tokio::spawn(sync_loop(
            Arc::clone(shared),
            Arc::clone(&upload),
            Arc::clone(&download),
            inner.config.sync_interval,
            inner.cancel.clone(),
        ));
        *runtime = Some(Runtime {
            upload,
            download,
            sync_loop,
        });
        drop(runtime);

        // Whoever ends the match only signals; this watcher does the close.
        let session = self.clone();
        tokio::spawn(async move {
            let inner = &session.inner;
            tokio::select! {
                _ = inner.shared.close_request.cancelled() => session.close(true).await,
                _ = inner.closed.cancelled() => {}
            }
        });

        info!(%role, session = shared.keys.root(), state = %start, "session established");
        Ok(())
    }

    /// Reveals a square on the local board.
    ///
    /// Returns `None` unless the match is being played. Hitting a mine
    /// gives the opponent the win; clearing the board wins. Either way the
    /// new state is published and the session ends.
    pub fn reveal(&self, x: i64, y: i64) -> Option<Reveal> {
        let shared = &self.inner.shared;
        let role = shared.role;

        let (reveal, ending) = {
            let mut data = shared.data();
            if data.state() != GameState::Playing || self.is_finished() {
                return None;
            }
            shared.stopwatch.start();

            let board = &mut data.player_mut(role).board;
            let reveal = board.reveal(x, y);
            let ending = match reveal {
                Reveal::Lose => Some((role.opponent().win_state(), Outcome::Lost, Reason::HitMine)),
                Reveal::Value(_) if board.is_win() => {
                    Some((role.win_state(), Outcome::Won, Reason::Cleared))
                }
                _ => None,
            };
            if let Some((state, _, _)) = ending {
                data.set_state(state);
            }
            (reveal, ending)
        };

        if let Some((state, outcome, reason)) = ending {
            shared.publish(state);
            shared.emit(SessionEvent::StateChanged(state));
            shared.finish(outcome, reason);
        }
        Some(reveal)
    }

    /// Toggles a flag on the local board. `None` unless playing.
    pub fn toggle_flag(&self, x: i64, y: i64) -> Option<bool> {
        let shared = &self.inner.shared;
        let mut data = shared.data();
        if data.state() != GameState::Playing || self.is_finished() {
            return None;
        }
        shared.stopwatch.start();
        Some(data.player_mut(shared.role).board.toggle_flag(x, y))
    }

    /// Tears the session down. Only the first call does the work; later
    /// or concurrent calls wait for it to finish.
    pub async fn close(&self, delete_remote: bool) {
        let inner = &self.inner;
        if inner.closing.swap(true, Ordering::SeqCst) {
            inner.closed.cancelled().await;
            return;
        }
        let shared = &inner.shared;
        let role = shared.role;
        info!(%role, session = shared.keys.root(), "closing session");

        let exit = {
            let mut data = shared.data();
            if data.state() == GameState::Playing {
                data.set_state(role.exit_state());
                Some(role.exit_state())
            } else {
                None
            }
        };
        shared.finished.store(true, Ordering::SeqCst);
        if let Some(state) = exit {
            shared.emit(SessionEvent::StateChanged(state));
            if !shared.client.put(&shared.keys.state(), &state.to_wire()).await {
                warn!(%role, %state, "exit state not published");
            }
        }

        shared.stopwatch.stop();
        inner.cancel.cancel();

        let runtime = inner.runtime.lock().await.take();
        if let Some(runtime) = runtime {
            if let Err(e) = runtime.sync_loop.await {
                warn!(%role, error = %e, "sync loop ended abnormally");
            }
            runtime.upload.close().await;
            runtime.download.close().await;
        }

        let mut publishes =
            std::mem::take(&mut *shared.publishes.lock().unwrap_or_else(PoisonError::into_inner));
        while publishes.join_next().await.is_some() {}

        if delete_remote {
            for player in [Role::Host, Role::Guest] {
                shared.client.delete(&shared.keys.player(player)).await;
            }
        }

        shared.emit(SessionEvent::Closed);
        inner.closed.cancel();
        info!(%role, session = shared.keys.root(), "session closed");
    }
}

/// Submits one upload and one download per tick until cancelled.
async fn sync_loop(
    shared: Arc<Shared>,
    upload: Arc<TaskPipeline<bool>>,
    download: Arc<TaskPipeline<String>>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                submit_upload(&shared, &upload, &cancel);
                submit_download(&shared, &download, &cancel);
            }
        }
    }

    debug!(role = %shared.role, "sync loop stopped");
}

fn submit_upload(shared: &Shared, upload: &TaskPipeline<bool>, cancel: &CancellationToken) {
    let json = {
        let mut data = shared.data();
        let player = data.player_mut(shared.role);
        player.time = shared.stopwatch.elapsed();
        player.to_json()
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            warn!(role = %shared.role, error = %e, "cannot serialize player data");
            return;
        }
    };

    let client = shared.client.clone();
    let path = shared.keys.player(shared.role);
    let cancel = cancel.clone();
    upload.submit(async move {
        if cancel.is_cancelled() {
            return false;
        }
        client.put(&path, &json).await
    });
}

/// Polls the state key, applies it, then fetches the opponent's record.
/// Any failure yields an empty body, which the pipeline skips.
fn submit_download(shared: &Arc<Shared>, download: &TaskPipeline<String>, cancel: &CancellationToken) {
    let shared = Arc::clone(shared);
    let cancel = cancel.clone();
    download.submit(async move {
        if cancel.is_cancelled() {
            return String::new();
        }
        let Some(body) = shared.client.get(&shared.keys.state()).await else {
            return String::new();
        };
        let Some(state) = GameState::from_wire(&body) else {
            debug!(role = %shared.role, %body, "unreadable game state");
            return String::new();
        };
        shared.observe_state(state);

        if cancel.is_cancelled() {
            return String::new();
        }
        shared
            .client
            .get(&shared.keys.player(shared.role.opponent()))
            .await
            .unwrap_or_default()
    });
}

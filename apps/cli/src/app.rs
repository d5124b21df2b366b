//! Screen flow of the terminal client.
//!
//! Screens live on a navigation stack: the lobby screen is pushed first,
//! a match is pushed on top of it once a session is established, and the
//! match is replaced by its result when it ends. Leaving a screen pops it.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use minesduel_store::Client;
use minesduel_sync::{
    Difficulty, GameState, Lobby, LobbyError, MatchResult, Role, Session, SessionConfig,
    SessionError, SessionEvent,
};

use crate::render::{render_match, render_result};

type Input = Lines<BufReader<Stdin>>;

/// What the player asked for on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Host(Difficulty),
    Join,
}

enum Screen {
    Lobby(Request),
    Match(Session),
    Result(MatchResult),
}

/// One line of player input during a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Reveal(i64, i64),
    Flag(i64, i64),
    Redraw,
    Quit,
}

const HELP: &str = "commands: r X Y (reveal), f X Y (flag), enter (redraw), q (quit)";

fn coords<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<(i64, i64), String> {
    let mut next = || -> Result<i64, String> {
        let word = words.next().ok_or_else(|| HELP.to_string())?;
        word.parse().map_err(|e| format!("bad coordinate: {e}"))
    };
    let x = next()?;
    let y = next()?;
    Ok((x, y))
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Redraw);
    };

    match verb {
        "r" | "reveal" => coords(words).map(|(x, y)| Command::Reveal(x, y)),
        "f" | "flag" => coords(words).map(|(x, y)| Command::Flag(x, y)),
        "q" | "quit" => Ok(Command::Quit),
        _ => Err(HELP.to_string()),
    }
}

/// Whether going back and trying again might help.
fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<LobbyError>()
        .is_some_and(LobbyError::is_retryable)
        || err
            .downcast_ref::<SessionError>()
            .is_some_and(SessionError::is_retryable)
}

pub struct App {
    client: Client,
    config: SessionConfig,
    lobby: Lobby,
    screens: Vec<Screen>,
}

impl App {
    pub fn new(client: Client, config: SessionConfig) -> Self {
        let lobby = Lobby::new(client.clone(), config.game_name.clone());
        Self {
            client,
            config,
            lobby,
            screens: Vec::new(),
        }
    }

    pub async fn run(mut self, request: Request) -> anyhow::Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        self.screens.push(Screen::Lobby(request));

        while let Some(screen) = self.screens.last() {
            match screen {
                Screen::Lobby(request) => {
                    let request = *request;
                    match self.enter_match(request).await {
                        Ok(session) => self.screens.push(Screen::Match(session)),
                        Err(e) if is_retryable(&e) => {
                            println!("{e:#}");
                            if !confirm(&mut input, "try again? [y/N]").await? {
                                self.screens.pop();
                            }
                        }
                        Err(e) => {
                            self.screens.pop();
                            return Err(e);
                        }
                    }
                }
                Screen::Match(session) => {
                    let session = session.clone();
                    let outcome = self.play(&session, &mut input).await;
                    self.screens.pop();
                    match outcome? {
                        Some(result) => self.screens.push(Screen::Result(result)),
                        // Quit mid-game: back past the lobby too.
                        None => {
                            self.screens.pop();
                        }
                    }
                }
                Screen::Result(result) => {
                    println!("\n{}", render_result(result));
                    self.screens.clear();
                }
            }
        }

        Ok(())
    }

    async fn enter_match(&self, request: Request) -> anyhow::Result<Session> {
        let (role, settings) = match request {
            Request::Host(difficulty) => {
                let settings = difficulty.settings()?;
                (Role::Host, self.lobby.host_game(settings).await?)
            }
            Request::Join => (Role::Guest, self.lobby.join_game().await?),
        };

        tracing::info!(
            %role,
            session_id = settings.session_id,
            width = settings.board_width,
            height = settings.board_height,
            bombs = settings.bomb_count,
            "entering match"
        );

        let session = Session::create(role, settings, self.client.clone(), self.config.clone())?;
        session.establish().await?;
        Ok(session)
    }

    /// Runs the match screen until the session finishes or the player
    /// quits. Returns the result, or `None` when there is none to show.
    async fn play(&self, session: &Session, input: &mut Input) -> anyhow::Result<Option<MatchResult>> {
        let mut events = session
            .take_events()
            .await
            .context("session events already taken")?;

        if session.state() == GameState::Waiting {
            println!("waiting for an opponent to join...");
        }
        println!("{HELP}");
        redraw(session);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::StateChanged(state)) => {
                        tracing::debug!(%state, "state changed");
                        redraw(session);
                    }
                    Some(SessionEvent::Finished(result)) => {
                        redraw(session);
                        session.close(true).await;
                        return Ok(Some(result));
                    }
                    Some(SessionEvent::Closed) | None => {
                        println!("the match was closed");
                        return Ok(None);
                    }
                },
                line = input.next_line() => {
                    let Some(line) = line? else {
                        session.close(true).await;
                        return Ok(None);
                    };
                    match parse_command(&line) {
                        Ok(Command::Reveal(x, y)) => {
                            if session.reveal(x, y).is_none() {
                                println!("not playing right now");
                            }
                            redraw(session);
                        }
                        Ok(Command::Flag(x, y)) => {
                            if session.toggle_flag(x, y).is_none() {
                                println!("not playing right now");
                            }
                            redraw(session);
                        }
                        Ok(Command::Redraw) => redraw(session),
                        Ok(Command::Quit) => {
                            session.close(true).await;
                            return Ok(None);
                        }
                        Err(msg) => println!("{msg}"),
                    }
                }
            }
        }
    }
}

fn redraw(session: &Session) {
    let time = session.time_played();
    let role = session.role();
    let text = session.with_data(|data| render_match(data, role, time));
    println!("\n{text}");
}

async fn confirm(input: &mut Input, prompt: &str) -> anyhow::Result<bool> {
    println!("{prompt}");
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

//! Game session: the round executor.
//!
//! A session owns one `GameState` and its files. Each round describes the
//! scene, asks every player for an action, resolves the actions, and commits:
//! the resolution is appended to the history, the round counter advances, and
//! the state is persisted before the transcript is extended. A failed round
//! leaves the persisted state as it was (apart from a completed compaction,
//! which is persisted on its own).

use crate::compactor::HistoryCompactor;
use crate::crew::{Crew, emit};
use crate::event::{RoundEvent, RoundOutcome};
use crate::persona::Persona;
use crate::store;
use crate::task::{CrewTask, TaskExecutor};
use agentquest_core::error::{RoundError, StoreError};
use agentquest_core::game::GameState;
use agentquest_core::player::PlayerConfig;
use agentquest_core::world::WorldState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

pub const GAME_STATE_FILE: &str = "game_state.json";
pub const TRANSCRIPT_FILE: &str = "transcript.md";

const GAME_OVER_MARKER: &str = "STATUS: GAME_OVER";
const CONTINUE_MARKER: &str = "STATUS: CONTINUE";

const RESOLVE_EXPECTED: &str = "A narrative resolution of the players' actions, followed by a summary of state changes. \
At the very end of your output, you MUST include the exact phrase 'STATUS: GAME_OVER' if the game has ended \
(e.g. all players are dead), or 'STATUS: CONTINUE' if the game should proceed.";

/// How a session is opened.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Rehydrate an existing `game_state.json` instead of starting over
    pub resume: bool,
    pub starting_hp: i32,
    pub starting_inventory: Vec<String>,
    pub history_threshold: usize,
    pub keep_recent: usize,
    /// World file the Dungeon Master's lookup tool reads. When unset, a copy
    /// of the world is written into the session directory.
    pub world_path: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            resume: true,
            starting_hp: 10,
            starting_inventory: vec!["Basic Weapon".into(), "Rations".into()],
            history_threshold: 10,
            keep_recent: 3,
            world_path: None,
        }
    }
}

/// Files a session reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub dir: PathBuf,
    pub game_state: PathBuf,
    pub transcript: PathBuf,
    pub world: PathBuf,
}

impl SessionPaths {
    pub fn new(dir: &Path, world: Option<PathBuf>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            game_state: dir.join(GAME_STATE_FILE),
            transcript: dir.join(TRANSCRIPT_FILE),
            world: world.unwrap_or_else(|| dir.join(crate::generation::WORLD_FILE)),
        }
    }
}

/// What one committed round produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    /// The round that was played
    pub round: u32,
    pub resolution: String,
    pub outcome: RoundOutcome,
    pub compacted: bool,
}

pub struct GameSession {
    world: WorldState,
    players: Vec<PlayerConfig>,
    state: GameState,
    paths: SessionPaths,
    executor: Arc<dyn TaskExecutor>,
    compactor: HistoryCompactor,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("round", &self.state.round_number)
            .field("players", &self.players.len())
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Open a session in `output_dir`, rehydrating persisted state when
    /// `options.resume` is set and a state file exists.
    pub async fn open(
        world: WorldState,
        players: Vec<PlayerConfig>,
        output_dir: impl Into<PathBuf>,
        executor: Arc<dyn TaskExecutor>,
        options: SessionOptions,
    ) -> Result<Self, StoreError> {
        let dir = output_dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;

        let write_world = options.world_path.is_none();
        let paths = SessionPaths::new(&dir, options.world_path.clone());
        if write_world {
            store::save(&world, &paths.world).await?;
        }

        let existing = if options.resume {
            match store::load::<GameState>(&paths.game_state).await {
                Ok(state) => Some(state),
                Err(StoreError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let state = match existing {
            Some(state) => {
                check_rehydrated(&state, &players);
                info!(
                    round = state.round_number,
                    location = %state.current_location,
                    "Resumed game session"
                );
                state
            }
            None => {
                let state = GameState::new(
                    &world,
                    &players,
                    options.starting_hp,
                    &options.starting_inventory,
                );
                store::save(&state, &paths.game_state).await?;
                info!(
                    players = players.len(),
                    location = %state.current_location,
                    "Started new game session"
                );
                state
            }
        };

        Ok(Self {
            world,
            players,
            state,
            paths,
            executor,
            compactor: HistoryCompactor::new(options.history_threshold, options.keep_recent),
        })
    }

    pub fn game_state(&self) -> &GameState {
        &self.state
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn players(&self) -> &[PlayerConfig] {
        &self.players
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    /// Play one round. `true` means another round may follow.
    pub async fn run_round(&mut self) -> Result<bool, RoundError> {
        let report = self.play(None).await?;
        Ok(report.outcome.may_continue())
    }

    /// Play one round, publishing its progress to `events`.
    pub async fn run_round_with_events(
        &mut self,
        events: &UnboundedSender<RoundEvent>,
    ) -> Result<RoundReport, RoundError> {
        self.play(Some(events)).await
    }

    async fn play(&mut self, events: Option<&UnboundedSender<RoundEvent>>) -> Result<RoundReport, RoundError> {
        let round = self.state.round_number;
        info!(round, location = %self.state.current_location, "Round started");
        emit(
            events,
            RoundEvent::RoundStarted {
                round,
                location: self.state.current_location.clone(),
            },
        );

        let compacted = self.compact_history(round, events).await?;

        let outputs = self
            .round_crew()
            .kickoff(self.executor.as_ref(), events)
            .await
            .map_err(|source| RoundError::Dispatch { round, source })?;
        let resolution = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        let outcome = parse_outcome(&resolution);

        // The transcript goes first: a retried round may repeat a heading, but
        // a committed round is never missing from it.
        store::append_transcript(&self.paths.transcript, round, &resolution)
            .await
            .map_err(|source| RoundError::Store { round, source })?;

        let mut next = self.state.clone();
        next.session_history.push(resolution.clone());
        next.round_number += 1;
        store::save(&next, &self.paths.game_state)
            .await
            .map_err(|source| RoundError::Store { round, source })?;
        self.state = next;

        info!(round, ?outcome, "Round committed");
        emit(
            events,
            RoundEvent::RoundCommitted {
                round,
                outcome,
                resolution: resolution.clone(),
                game_state: self.state.clone(),
            },
        );

        Ok(RoundReport {
            round,
            resolution,
            outcome,
            compacted,
        })
    }

    async fn compact_history(
        &mut self,
        round: u32,
        events: Option<&UnboundedSender<RoundEvent>>,
    ) -> Result<bool, RoundError> {
        let before = self.state.session_history.len();
        let Some(history) = self
            .compactor
            .compact(&self.state.session_history, self.executor.as_ref(), events)
            .await
            .map_err(|source| RoundError::Compaction { round, source })?
        else {
            return Ok(false);
        };

        let kept = history.len() - 1;
        let mut next = self.state.clone();
        next.session_history = history;
        store::save(&next, &self.paths.game_state)
            .await
            .map_err(|source| RoundError::Store { round, source })?;
        self.state = next;

        emit(
            events,
            RoundEvent::HistoryCompacted {
                round,
                summarized: before - kept,
                kept,
            },
        );
        Ok(true)
    }

    fn situation(&self) -> String {
        let story = if self.state.session_history.is_empty() {
            "The adventure is just beginning.".to_string()
        } else {
            self.state.session_history.join("\n\n")
        };
        format!(
            "Story so far:\n{story}\n\nCurrent location: {}\nRound: {}",
            self.state.current_location, self.state.round_number
        )
    }

    /// Describe, one action per player, resolve.
    fn round_crew(&self) -> Crew {
        let situation = self.situation();
        let location = &self.state.current_location;
        let dm = Persona::dungeon_master(&self.paths.world);

        let mut tasks = vec![CrewTask::new(
            "describe_scene",
            dm.clone(),
            format!(
                "{situation}\n\nDescribe the current situation at {location}. Provide clear hooks for the players."
            ),
            "A vivid description of the environment and any immediate events or characters present.",
        )];

        let mut action_steps = Vec::with_capacity(self.players.len());
        for (i, player) in self.players.iter().enumerate() {
            let step = format!("player_action_{}", i + 1);
            tasks.push(
                CrewTask::new(
                    &step,
                    Persona::player(player, &self.paths.game_state),
                    format!(
                        "{situation}\n\nListen to the Dungeon Master's scene description and the current situation. \
                         Decide your next action. Character: {}.",
                        player.name
                    ),
                    format!("A short description of {}'s action and any dialogue.", player.name),
                )
                .with_context(["describe_scene"]),
            );
            action_steps.push(step);
        }
        if action_steps.is_empty() {
            action_steps.push("describe_scene".to_string());
        }

        tasks.push(
            CrewTask::new(
                "resolve_round",
                dm,
                format!(
                    "{situation}\n\nReview all player actions. Use your dice roller to determine outcomes if they \
                     attempt something difficult. Formulate a final narrative summary of the round and specify any \
                     state changes (HP, inventory, location)."
                ),
                RESOLVE_EXPECTED,
            )
            .with_context(action_steps),
        );

        Crew::new(tasks)
    }
}

/// The last termination marker in the text decides; no marker means continue.
pub fn parse_outcome(resolution: &str) -> RoundOutcome {
    let upper = resolution.to_ascii_uppercase();
    match (upper.rfind(GAME_OVER_MARKER), upper.rfind(CONTINUE_MARKER)) {
        (Some(over), Some(cont)) if over > cont => RoundOutcome::GameOver,
        (Some(_), None) => RoundOutcome::GameOver,
        (_, Some(_)) => RoundOutcome::Continue,
        (None, None) => {
            warn!("Resolution has no STATUS marker; continuing");
            RoundOutcome::Continue
        }
    }
}

fn check_rehydrated(state: &GameState, players: &[PlayerConfig]) {
    for c in state.characters.iter().filter(|c| !c.hp_in_bounds()) {
        warn!(character = %c.name, hp = c.hp, max_hp = c.max_hp, "Rehydrated character hp out of bounds");
    }
    let persisted: Vec<&str> = state.characters.iter().map(|c| c.name.as_str()).collect();
    let roster: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
    if persisted != roster {
        warn!(?persisted, ?roster, "Persisted characters do not match the roster");
    }
}

/// Run one round on a background task. The receiver yields the round's
/// events, then `Error` if it failed, then exactly one `Done`.
pub fn spawn_round(mut session: OwnedMutexGuard<GameSession>) -> UnboundedReceiver<RoundEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        if let Err(e) = session.run_round_with_events(&tx).await {
            error!(error = %e, "Round failed");
            let _ = tx.send(RoundEvent::Error {
                message: e.to_string(),
            });
        }
        let _ = tx.send(RoundEvent::Done);
    });
    rx
}

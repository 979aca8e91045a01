//! The play session: one authoritative game plus the engine's turns.
//!
//! All mutable state sits behind a single mutex. Human moves and engine moves
//! are both committed while holding it, through [`commit_move`]. The engine
//! searches a cloned [`Position`] on tokio's blocking pool; its task holds only
//! a `Weak` handle to the state and re-checks the search generation under the
//! lock before committing, so a reset, a mode or difficulty change, a
//! reschedule or dropping the session all discard the result.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chess_core::{
    coord_to_sq, move_to_uci, AppliedMove, Color, Engine, Game, Move, Outcome, PieceKind,
    Position,
};
use classical_engine::{classify, evaluate, Difficulty, MinimaxEngine, QualityLabel};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    config::SessionConfig,
    error::{SessionError, StoreError},
    feedback::{Feedback, NoFeedback},
    record::{GameMode, MatchRecord, MatchResult, SessionSnapshot},
    store::{MatchStore, MemoryStore},
};

/// Where the session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No game started or loaded yet.
    Idle,
    InProgress,
    Terminal(Outcome),
}

/// Pieces removed from the board, per color, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    white: Vec<PieceKind>,
    black: Vec<PieceKind>,
}

impl Captures {
    /// Pieces of `color` that have been captured.
    pub fn of(&self, color: Color) -> &[PieceKind] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn record(&mut self, applied: &AppliedMove) {
        let Some(kind) = applied.captured else { return };
        match applied.color.other() {
            Color::White => self.white.push(kind),
            Color::Black => self.black.push(kind),
        }
    }

    fn from_game(game: &Game) -> Self {
        let mut captures = Self::default();
        for applied in game.applied() {
            captures.record(applied);
        }
        captures
    }
}

struct SessionState {
    game: Game,
    mode: GameMode,
    difficulty: Difficulty,
    lifecycle: Lifecycle,
    captures: Captures,
    /// Bumped whenever an outstanding search must not be applied.
    generation: u64,
    pending: Option<JoinHandle<()>>,
    thinking: bool,
    /// Ply count at which the current game was last archived.
    archived_at: Option<usize>,
    last_snapshot: Option<SessionSnapshot>,
    persistence_error: Option<StoreError>,
}

impl SessionState {
    fn cancel_search(&mut self) {
        self.generation += 1;
        self.thinking = false;
        if let Some(handle) = self.pending.take() {
            handle.abort();
            debug!(generation = self.generation, "cancelled pending engine search");
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            pgn: self.game.to_pgn(),
            mode: self.mode,
            difficulty: self.difficulty,
        }
    }
}

struct Services {
    config: SessionConfig,
    engine: Arc<dyn Engine>,
    store: Arc<dyn MatchStore>,
    feedback: Arc<dyn Feedback>,
}

impl Services {
    fn is_engine_turn(&self, state: &SessionState) -> bool {
        state.mode == GameMode::VsEngine
            && state.lifecycle == Lifecycle::InProgress
            && state.game.side_to_move() == self.config.engine_color
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Orchestrates one game against the built-in engine or a second local
/// player.
pub struct GameSession {
    state: Arc<Mutex<SessionState>>,
    services: Arc<Services>,
}

impl GameSession {
    pub fn new(
        config: SessionConfig,
        engine: Arc<dyn Engine>,
        store: Arc<dyn MatchStore>,
        feedback: Arc<dyn Feedback>,
    ) -> Self {
        let state = SessionState {
            game: Game::new(),
            mode: config.default_mode,
            difficulty: config.default_difficulty,
            lifecycle: Lifecycle::Idle,
            captures: Captures::default(),
            generation: 0,
            pending: None,
            thinking: false,
            archived_at: None,
            last_snapshot: None,
            persistence_error: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            services: Arc::new(Services {
                config,
                engine,
                store,
                feedback,
            }),
        }
    }

    /// Session with a fresh minimax engine, an in-memory store and no
    /// feedback.
    pub fn with_defaults(config: SessionConfig) -> Self {
        Self::new(
            config,
            Arc::new(MinimaxEngine::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(NoFeedback),
        )
    }

    pub fn config(&self) -> &SessionConfig {
        &self.services.config
    }

    /// Resets to the start position and cancels any pending search.
    pub fn start_new_game(&self, mode: GameMode, difficulty: Difficulty) {
        let mut state = lock(&self.state);
        state.cancel_search();
        state.game = Game::new();
        state.captures = Captures::default();
        state.lifecycle = Lifecycle::InProgress;
        state.archived_at = None;
        state.mode = mode;
        state.difficulty = difficulty;
        info!(?mode, %difficulty, "new game");

        save_snapshot(&mut state, &self.services);
        self.schedule_if_engine_turn(&mut state);
    }

    /// Restores the saved snapshot. Returns `Ok(false)` when there is none.
    pub fn load_saved_game(&self) -> Result<bool, SessionError> {
        let Some(snapshot) = self.services.store.load_snapshot()? else {
            return Ok(false);
        };
        let game = Game::from_pgn(&snapshot.pgn)?;

        let mut state = lock(&self.state);
        state.cancel_search();
        state.captures = Captures::from_game(&game);
        state.mode = snapshot.mode;
        state.difficulty = snapshot.difficulty;
        state.lifecycle = match game.outcome() {
            Some(outcome) => Lifecycle::Terminal(outcome),
            None => Lifecycle::InProgress,
        };
        // A finished game was archived when it ended.
        state.archived_at = matches!(state.lifecycle, Lifecycle::Terminal(_))
            .then(|| game.ply_count());
        state.game = game;
        state.last_snapshot = Some(snapshot);
        info!(
            plies = state.game.ply_count(),
            lifecycle = ?state.lifecycle,
            "restored saved game"
        );

        self.schedule_if_engine_turn(&mut state);
        Ok(true)
    }

    /// Plays a human move given as coordinate squares. A promotion without a
    /// chosen piece becomes a queen.
    pub fn apply_move(&self, from: &str, to: &str) -> Result<AppliedMove, SessionError> {
        self.apply_move_with_promotion(from, to, None)
    }

    pub fn apply_move_with_promotion(
        &self,
        from: &str,
        to: &str,
        promo: Option<PieceKind>,
    ) -> Result<AppliedMove, SessionError> {
        let mut state = lock(&self.state);
        match state.lifecycle {
            Lifecycle::Idle => return Err(SessionError::NoActiveGame),
            Lifecycle::Terminal(_) => return Err(SessionError::GameOver),
            Lifecycle::InProgress => {}
        }
        if self.services.is_engine_turn(&state) {
            return Err(SessionError::EngineTurn);
        }

        let invalid = || SessionError::InvalidMove {
            from: from.to_string(),
            to: to.to_string(),
        };
        let from_sq = coord_to_sq(from).ok_or_else(invalid)?;
        let to_sq = coord_to_sq(to).ok_or_else(invalid)?;
        let mut mv = Move::new(from_sq, to_sq);
        mv.promo = promo;

        let applied = commit_move(&mut state, &self.services, mv).map_err(|_| invalid())?;
        self.schedule_if_engine_turn(&mut state);
        Ok(applied)
    }

    /// Schedules the engine's move if it is the engine's turn. Returns
    /// whether a search was scheduled; any earlier pending search is
    /// cancelled first.
    pub fn request_engine_turn(&self) -> bool {
        let mut state = lock(&self.state);
        self.schedule_if_engine_turn(&mut state)
    }

    /// Waits for the in-flight engine search, if any, to finish.
    pub async fn wait_for_engine(&self) {
        let handle = lock(&self.state).pending.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            debug!(error = %e, "engine task ended without completing");
        }
    }

    pub fn set_mode(&self, mode: GameMode) {
        let mut state = lock(&self.state);
        state.cancel_search();
        state.mode = mode;
        debug!(?mode, "mode changed");
        save_snapshot(&mut state, &self.services);
        self.schedule_if_engine_turn(&mut state);
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        let mut state = lock(&self.state);
        state.cancel_search();
        state.difficulty = difficulty;
        debug!(%difficulty, "difficulty changed");
        save_snapshot(&mut state, &self.services);
        self.schedule_if_engine_turn(&mut state);
    }

    /// Re-checks for checkmate or a draw. No-op once the game is over.
    pub fn refresh_terminal_state(&self) -> Lifecycle {
        let mut state = lock(&self.state);
        refresh_terminal(&mut state, &self.services);
        state.lifecycle
    }

    /// Archives the current game now, whatever its state. Returns `None` when
    /// no move has been played or this exact game is already archived.
    pub fn archive_current_match(&self) -> Result<Option<MatchRecord>, SessionError> {
        let mut state = lock(&self.state);
        Ok(archive(&mut state, &self.services)?)
    }

    /// The last persistence failure from an automatic save, if any.
    pub fn take_persistence_error(&self) -> Option<StoreError> {
        lock(&self.state).persistence_error.take()
    }

    pub fn position(&self) -> Position {
        lock(&self.state).game.position().clone()
    }

    pub fn fen(&self) -> String {
        lock(&self.state).game.to_fen()
    }

    pub fn side_to_move(&self) -> Color {
        lock(&self.state).game.side_to_move()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        lock(&self.state).lifecycle
    }

    pub fn mode(&self) -> GameMode {
        lock(&self.state).mode
    }

    pub fn difficulty(&self) -> Difficulty {
        lock(&self.state).difficulty
    }

    pub fn captures(&self) -> Captures {
        lock(&self.state).captures.clone()
    }

    /// SAN of every move played this game.
    pub fn history(&self) -> Vec<String> {
        lock(&self.state).game.history()
    }

    pub fn last_move(&self) -> Option<AppliedMove> {
        lock(&self.state).game.last_move().cloned()
    }

    /// Static evaluation of the current position, positive favouring White.
    pub fn evaluation(&self) -> i32 {
        evaluate(lock(&self.state).game.position())
    }

    pub fn is_check(&self) -> bool {
        lock(&self.state).game.is_check()
    }

    pub fn is_engine_thinking(&self) -> bool {
        lock(&self.state).thinking
    }

    pub fn classify_move(&self, before: &Position, after: &Position, mover: Color) -> QualityLabel {
        classify(before, after, mover)
    }

    pub fn classify_last_move(&self) -> Option<QualityLabel> {
        let state = lock(&self.state);
        let last = state.game.last_move()?;
        Some(classify(&last.before, &last.after, last.color))
    }

    fn schedule_if_engine_turn(&self, state: &mut SessionState) -> bool {
        if !self.services.is_engine_turn(state) {
            return false;
        }
        schedule_engine_turn(&self.state, &self.services, state)
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        lock(&self.state).cancel_search();
    }
}

/// Spawns the delayed search for the engine's move. Caller holds the lock.
fn schedule_engine_turn(
    shared: &Arc<Mutex<SessionState>>,
    services: &Arc<Services>,
    state: &mut SessionState,
) -> bool {
    state.cancel_search();
    let Ok(runtime) = Handle::try_current() else {
        warn!("no tokio runtime; engine turn not scheduled");
        return false;
    };

    let generation = state.generation;
    let position = state.game.position().clone();
    let depth = state.difficulty.search_depth();
    let delay = services.config.engine_delay();
    let weak: Weak<Mutex<SessionState>> = Arc::downgrade(shared);
    let services = Arc::clone(services);

    state.thinking = true;
    state.pending = Some(runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        let search = tokio::task::spawn_blocking(move || {
            let result = services.engine.search(&position, depth);

            let Some(shared) = weak.upgrade() else {
                debug!("session dropped; discarding engine move");
                return;
            };
            let mut state = lock(&shared);
            if state.generation != generation {
                debug!(
                    scheduled = generation,
                    current = state.generation,
                    "discarding stale engine move"
                );
                return;
            }
            state.thinking = false;
            state.pending = None;

            let Some(mv) = result.best_move else {
                debug!("engine has no legal move");
                return;
            };
            if let Err(e) = commit_move(&mut state, &services, mv) {
                warn!(mv = %move_to_uci(mv), error = %e, "engine move rejected");
            }
        });
        if let Err(e) = search.await {
            warn!(error = %e, "engine search task failed");
        }
    }));
    debug!(generation, depth, "engine turn scheduled");
    true
}

/// Applies `mv` and updates everything that follows from a move. Both human
/// and engine moves go through here.
fn commit_move(
    state: &mut SessionState,
    services: &Services,
    mv: Move,
) -> Result<AppliedMove, SessionError> {
    let applied = state
        .game
        .play(mv)
        .map_err(|_| SessionError::InvalidMove {
            from: chess_core::sq_to_coord(mv.from),
            to: chess_core::sq_to_coord(mv.to),
        })?;
    state.captures.record(&applied);
    debug!(san = %applied.san, color = %applied.color, "move applied");

    services.feedback.move_applied(applied.is_capture());
    if !refresh_terminal(state, services) && state.game.is_check() {
        services.feedback.check();
    }
    save_snapshot(state, services);
    Ok(applied)
}

/// Moves an in-progress game to `Terminal` when it has ended, archiving it.
/// Returns whether the game is over.
fn refresh_terminal(state: &mut SessionState, services: &Services) -> bool {
    match state.lifecycle {
        Lifecycle::Terminal(_) => return true,
        Lifecycle::Idle => return false,
        Lifecycle::InProgress => {}
    }
    let Some(outcome) = state.game.outcome() else {
        return false;
    };

    state.lifecycle = Lifecycle::Terminal(outcome);
    state.cancel_search();
    let result = MatchResult::from_outcome(Some(outcome));
    info!(%result, ?outcome, "game over");
    services.feedback.game_over(result);

    if let Err(e) = archive(state, services) {
        warn!(error = %e, "failed to archive finished game");
        state.persistence_error = Some(e);
    }
    true
}

fn archive(
    state: &mut SessionState,
    services: &Services,
) -> Result<Option<MatchRecord>, StoreError> {
    let plies = state.game.ply_count();
    if plies == 0 || state.archived_at == Some(plies) {
        return Ok(None);
    }

    let record = MatchRecord::new(
        state.game.history(),
        MatchResult::from_outcome(state.game.outcome()),
        state.mode.opponent_label(state.difficulty),
    );
    services.store.append_match_record(&record)?;
    state.archived_at = Some(plies);
    info!(id = %record.id, result = %record.result, plies, "match archived");
    Ok(Some(record))
}

/// Saves the snapshot unless it matches the last one saved.
fn save_snapshot(state: &mut SessionState, services: &Services) {
    let snapshot = state.snapshot();
    if state.last_snapshot.as_ref() == Some(&snapshot) {
        return;
    }
    match services.store.save_snapshot(&snapshot) {
        Ok(()) => state.last_snapshot = Some(snapshot),
        Err(e) => {
            warn!(error = %e, "failed to save game");
            state.persistence_error = Some(e);
        }
    }
}

//! Session behaviour: move application, terminal detection and archival,
//! persistence, and the engine's asynchronous turn.

use std::{
    collections::VecDeque,
    sync::{mpsc, Arc, Mutex},
    time::Duration,
};

use chess_core::{parse_uci_move, Color, Engine, Outcome, PieceKind, Position, SearchResult};
use classical_engine::MinimaxEngine;
use game_session::{
    Difficulty, Feedback, GameMode, GameSession, Lifecycle, MatchRecord, MatchResult, MatchStore,
    MemoryStore, NoFeedback, QualityLabel, SessionConfig, SessionError, SessionSnapshot,
    StoreError,
};
use uuid::Uuid;

fn fast_config() -> SessionConfig {
    SessionConfig {
        engine_delay_ms: 0,
        ..SessionConfig::default()
    }
}

fn session(config: SessionConfig, engine: Arc<dyn Engine>, store: Arc<MemoryStore>) -> GameSession {
    GameSession::new(config, engine, store, Arc::new(NoFeedback))
}

fn local_session(store: Arc<MemoryStore>) -> GameSession {
    let s = session(fast_config(), Arc::new(MinimaxEngine::with_seed(1)), store);
    s.start_new_game(GameMode::LocalTwoPlayer, Difficulty::Medium);
    s
}

fn play(session: &GameSession, moves: &[(&str, &str)]) {
    for (from, to) in moves {
        session
            .apply_move(from, to)
            .unwrap_or_else(|e| panic!("{from}{to} rejected: {e}"));
    }
}

const FOOLS_MATE: [(&str, &str); 4] = [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")];

#[derive(Default)]
struct RecordingFeedback {
    events: Mutex<Vec<String>>,
}

impl RecordingFeedback {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Feedback for RecordingFeedback {
    fn move_applied(&self, capture: bool) {
        let event = if capture { "capture" } else { "move" };
        self.events.lock().unwrap().push(event.into());
    }

    fn check(&self) {
        self.events.lock().unwrap().push("check".into());
    }

    fn game_over(&self, result: MatchResult) {
        self.events.lock().unwrap().push(format!("over {result}"));
    }
}

/// Store whose every write fails.
struct BrokenStore;

impl MatchStore for BrokenStore {
    fn save_snapshot(&self, _: &SessionSnapshot) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".into()))
    }

    fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        Ok(None)
    }

    fn append_match_record(&self, _: &MatchRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".into()))
    }

    fn list_match_records(&self) -> Result<Vec<MatchRecord>, StoreError> {
        Ok(Vec::new())
    }

    fn delete_match_record(&self, _: Uuid) -> Result<bool, StoreError> {
        Ok(false)
    }
}

/// Engine that plays scripted moves, each held until the test opens its gate.
struct ScriptedEngine {
    script: Mutex<VecDeque<(&'static str, mpsc::Receiver<()>)>>,
    started: Mutex<mpsc::Sender<&'static str>>,
}

impl ScriptedEngine {
    fn new(
        moves: &[&'static str],
    ) -> (Arc<Self>, Vec<mpsc::Sender<()>>, mpsc::Receiver<&'static str>) {
        let (started_tx, started_rx) = mpsc::channel();
        let mut gates = Vec::new();
        let mut script = VecDeque::new();
        for &mv in moves {
            let (tx, rx) = mpsc::channel();
            gates.push(tx);
            script.push_back((mv, rx));
        }
        let engine = Arc::new(Self {
            script: Mutex::new(script),
            started: Mutex::new(started_tx),
        });
        (engine, gates, started_rx)
    }
}

impl Engine for ScriptedEngine {
    fn search(&self, pos: &Position, depth: u8) -> SearchResult {
        let (uci, gate) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("engine called more often than scripted");
        self.started.lock().unwrap().send(uci).unwrap();
        let _ = gate.recv();
        SearchResult {
            best_move: parse_uci_move(pos, uci),
            score: 0,
            depth,
            nodes: 1,
        }
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

fn wait_started(rx: &mpsc::Receiver<&'static str>) -> &'static str {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("engine search did not start")
}

#[test]
fn idle_session_rejects_moves() {
    let s = GameSession::with_defaults(fast_config());
    assert_eq!(s.lifecycle(), Lifecycle::Idle);
    assert!(matches!(
        s.apply_move("e2", "e4"),
        Err(SessionError::NoActiveGame)
    ));
    assert!(!s.request_engine_turn());
    assert!(s.history().is_empty());
}

#[test]
fn human_move_updates_history_and_evaluation() {
    let s = local_session(Arc::new(MemoryStore::new()));
    assert_eq!(s.evaluation(), 0);

    let applied = s.apply_move("e2", "e4").unwrap();
    assert_eq!(applied.san, "e4");
    assert_eq!(s.history(), vec!["e4"]);
    assert_eq!(s.side_to_move(), Color::Black);
    assert_eq!(s.evaluation(), 40);
    assert_eq!(
        s.fen(),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
    );
    assert_eq!(s.last_move(), Some(applied));
}

#[test]
fn moves_are_classified_from_the_movers_side() {
    let s = local_session(Arc::new(MemoryStore::new()));
    assert_eq!(s.classify_last_move(), None);

    let applied = s.apply_move("e2", "e4").unwrap();
    assert_eq!(
        s.classify_move(&applied.before, &applied.after, applied.color),
        QualityLabel::Best
    );
    assert_eq!(s.classify_last_move(), Some(QualityLabel::Best));

    let fen = |f: &str| Position::from_fen(f).unwrap();
    let white_queen = fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1");
    let no_queen = fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1");
    assert_eq!(
        s.classify_move(&white_queen, &no_queen, Color::White),
        QualityLabel::Blunder
    );

    let black_queen = fen("q3k3/8/8/8/8/8/8/4K3 w - - 0 1");
    let black_to_move = fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1");
    assert_eq!(
        s.classify_move(&black_queen, &black_to_move, Color::White),
        QualityLabel::Brilliant
    );
}

#[test]
fn illegal_moves_leave_state_unchanged() {
    let s = local_session(Arc::new(MemoryStore::new()));
    let before = s.fen();

    for (from, to) in [("e2", "e5"), ("e7", "e5"), ("z9", "e4"), ("e2", "")] {
        let err = s.apply_move(from, to).unwrap_err();
        assert!(
            matches!(err, SessionError::InvalidMove { .. }),
            "{from}{to}: {err}"
        );
    }
    assert_eq!(s.fen(), before);
    assert!(s.history().is_empty());
    assert_eq!(s.side_to_move(), Color::White);
}

#[test]
fn capture_ledgers_track_removed_pieces() {
    let s = local_session(Arc::new(MemoryStore::new()));
    play(&s, &[("e2", "e4"), ("d7", "d5"), ("e4", "d5"), ("d8", "d5")]);

    let captures = s.captures();
    assert_eq!(captures.of(Color::Black), &[PieceKind::Pawn]);
    assert_eq!(captures.of(Color::White), &[PieceKind::Pawn]);
    assert_eq!(s.history().len(), 4);
}

#[test]
fn checkmate_ends_the_game_and_archives_once() {
    let store = Arc::new(MemoryStore::new());
    let feedback = Arc::new(RecordingFeedback::default());
    let s = GameSession::new(
        fast_config(),
        Arc::new(MinimaxEngine::with_seed(1)),
        store.clone(),
        feedback.clone(),
    );
    s.start_new_game(GameMode::LocalTwoPlayer, Difficulty::Easy);
    play(&s, &FOOLS_MATE);

    let mated = Lifecycle::Terminal(Outcome::Checkmate {
        winner: Color::Black,
    });
    assert_eq!(s.lifecycle(), mated);
    assert!(s.is_check());
    assert_eq!(s.refresh_terminal_state(), mated);
    assert!(s.archive_current_match().unwrap().is_none());
    assert!(matches!(s.apply_move("a2", "a3"), Err(SessionError::GameOver)));

    let library = store.list_match_records().unwrap();
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].result, MatchResult::BlackWins);
    assert_eq!(library[0].opponent, "Player 2");
    assert_eq!(library[0].moves, vec!["f3", "e5", "g4", "Qh4#"]);
    assert_eq!(library[0].move_count, 4);

    assert_eq!(
        feedback.events(),
        vec!["move", "move", "move", "move", "over 0-1"]
    );
}

#[test]
fn manual_archive_of_unfinished_game() {
    let store = Arc::new(MemoryStore::new());
    let s = local_session(store.clone());
    assert!(s.archive_current_match().unwrap().is_none());

    play(&s, &[("e2", "e4")]);
    let record = s.archive_current_match().unwrap().unwrap();
    assert_eq!(record.result, MatchResult::Unterminated);
    assert!(s.archive_current_match().unwrap().is_none());

    play(&s, &[("e7", "e5")]);
    assert!(s.archive_current_match().unwrap().is_some());
    assert_eq!(store.list_match_records().unwrap().len(), 2);
}

#[test]
fn snapshots_are_saved_only_on_change() {
    let store = Arc::new(MemoryStore::new());
    let s = local_session(store.clone());
    assert_eq!(store.snapshot_writes(), 1);

    s.set_mode(GameMode::LocalTwoPlayer);
    assert_eq!(store.snapshot_writes(), 1);

    s.set_difficulty(Difficulty::Hard);
    assert_eq!(store.snapshot_writes(), 2);

    play(&s, &[("e2", "e4")]);
    assert_eq!(store.snapshot_writes(), 3);
    let saved = store.load_snapshot().unwrap().unwrap();
    assert_eq!(saved.pgn, "1. e4 *");
    assert_eq!(saved.difficulty, Difficulty::Hard);

    // Starting over from the start position with the same settings changes
    // the movetext, so it is saved again.
    s.start_new_game(GameMode::LocalTwoPlayer, Difficulty::Hard);
    assert_eq!(store.snapshot_writes(), 4);
}

#[test]
fn persistence_failures_are_reported_but_play_continues() {
    let s = GameSession::new(
        fast_config(),
        Arc::new(MinimaxEngine::with_seed(1)),
        Arc::new(BrokenStore),
        Arc::new(NoFeedback),
    );
    s.start_new_game(GameMode::LocalTwoPlayer, Difficulty::Easy);
    assert!(matches!(
        s.take_persistence_error(),
        Some(StoreError::Unavailable(_))
    ));
    assert!(s.take_persistence_error().is_none());

    play(&s, &FOOLS_MATE);
    assert!(matches!(s.lifecycle(), Lifecycle::Terminal(_)));
    assert!(s.take_persistence_error().is_some());
    assert!(matches!(
        s.archive_current_match(),
        Err(SessionError::Persistence(_))
    ));
}

#[test]
fn saved_game_is_restored() {
    let store = Arc::new(MemoryStore::new());
    store
        .save_snapshot(&SessionSnapshot {
            pgn: "1. e4 d5 2. exd5 *".into(),
            mode: GameMode::LocalTwoPlayer,
            difficulty: Difficulty::Hard,
        })
        .unwrap();

    let s = session(fast_config(), Arc::new(MinimaxEngine::with_seed(1)), store);
    assert!(s.load_saved_game().unwrap());
    assert_eq!(s.lifecycle(), Lifecycle::InProgress);
    assert_eq!(s.history(), vec!["e4", "d5", "exd5"]);
    assert_eq!(s.captures().of(Color::Black), &[PieceKind::Pawn]);
    assert_eq!(s.mode(), GameMode::LocalTwoPlayer);
    assert_eq!(s.difficulty(), Difficulty::Hard);
    assert_eq!(s.side_to_move(), Color::Black);
}

#[test]
fn restored_finished_game_is_not_archived_again() {
    let store = Arc::new(MemoryStore::new());
    store
        .save_snapshot(&SessionSnapshot {
            pgn: "1. f3 e5 2. g4 Qh4# 0-1".into(),
            mode: GameMode::LocalTwoPlayer,
            difficulty: Difficulty::Medium,
        })
        .unwrap();

    let s = session(fast_config(), Arc::new(MinimaxEngine::with_seed(1)), store.clone());
    assert!(s.load_saved_game().unwrap());
    assert!(matches!(s.lifecycle(), Lifecycle::Terminal(_)));
    assert!(s.archive_current_match().unwrap().is_none());
    assert!(store.list_match_records().unwrap().is_empty());
}

#[test]
fn missing_or_corrupted_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let s = session(fast_config(), Arc::new(MinimaxEngine::with_seed(1)), store.clone());
    assert!(!s.load_saved_game().unwrap());

    store
        .save_snapshot(&SessionSnapshot {
            pgn: "1. e4 e4 *".into(),
            mode: GameMode::VsEngine,
            difficulty: Difficulty::Easy,
        })
        .unwrap();
    assert!(matches!(
        s.load_saved_game(),
        Err(SessionError::CorruptedSnapshot(_))
    ));
    assert_eq!(s.lifecycle(), Lifecycle::Idle);
}

#[test]
fn engine_turn_needs_a_runtime() {
    let config = SessionConfig {
        engine_color: Color::White,
        ..fast_config()
    };
    let s = session(config, Arc::new(MinimaxEngine::with_seed(1)), Arc::new(MemoryStore::new()));
    s.start_new_game(GameMode::VsEngine, Difficulty::Easy);
    assert!(!s.is_engine_thinking());
    assert!(!s.request_engine_turn());
    assert!(matches!(s.apply_move("e2", "e4"), Err(SessionError::EngineTurn)));
}

#[tokio::test]
async fn engine_replies_to_human_move() {
    let s = session(
        fast_config(),
        Arc::new(MinimaxEngine::with_seed(5)),
        Arc::new(MemoryStore::new()),
    );
    s.start_new_game(GameMode::VsEngine, Difficulty::Easy);
    assert!(!s.is_engine_thinking());
    assert!(!s.request_engine_turn());

    s.apply_move("e2", "e4").unwrap();
    assert!(s.is_engine_thinking());
    assert!(matches!(
        s.apply_move("d2", "d4"),
        Err(SessionError::EngineTurn)
    ));

    s.wait_for_engine().await;
    assert!(!s.is_engine_thinking());
    assert_eq!(s.history().len(), 2);
    assert_eq!(s.side_to_move(), Color::White);
    assert_eq!(s.last_move().map(|m| m.color), Some(Color::Black));
}

#[tokio::test]
async fn engine_opens_when_playing_white() {
    let config = SessionConfig {
        engine_color: Color::White,
        ..fast_config()
    };
    let s = session(config, Arc::new(MinimaxEngine::with_seed(9)), Arc::new(MemoryStore::new()));
    s.start_new_game(GameMode::VsEngine, Difficulty::Easy);
    assert!(s.is_engine_thinking());

    s.wait_for_engine().await;
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.side_to_move(), Color::Black);
}

#[tokio::test(start_paused = true)]
async fn new_game_during_engine_delay_cancels_the_move() {
    let s = session(
        SessionConfig::default(),
        Arc::new(MinimaxEngine::with_seed(2)),
        Arc::new(MemoryStore::new()),
    );
    s.start_new_game(GameMode::VsEngine, Difficulty::Easy);
    s.apply_move("e2", "e4").unwrap();
    assert!(s.is_engine_thinking());

    s.start_new_game(GameMode::VsEngine, Difficulty::Easy);
    assert!(!s.is_engine_thinking());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(s.history().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_engine_result_is_discarded() {
    let (engine, gates, started) = ScriptedEngine::new(&["e7e5", "c7c5"]);
    let s = session(fast_config(), engine, Arc::new(MemoryStore::new()));
    s.start_new_game(GameMode::VsEngine, Difficulty::Medium);
    s.apply_move("e2", "e4").unwrap();
    assert_eq!(wait_started(&started), "e7e5");

    // Changing difficulty invalidates the running search and starts another.
    s.set_difficulty(Difficulty::Hard);
    assert_eq!(wait_started(&started), "c7c5");

    gates[0].send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(s.history(), vec!["e4"]);
    assert!(s.is_engine_thinking());

    gates[1].send(()).unwrap();
    s.wait_for_engine().await;
    assert_eq!(s.history(), vec!["e4", "c5"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_session_ignores_engine_result() {
    let store = Arc::new(MemoryStore::new());
    let (engine, gates, started) = ScriptedEngine::new(&["e7e5"]);
    let s = session(fast_config(), engine, store.clone());
    s.start_new_game(GameMode::VsEngine, Difficulty::Easy);
    s.apply_move("e2", "e4").unwrap();
    wait_started(&started);

    let writes = store.snapshot_writes();
    drop(s);
    gates[0].send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.snapshot_writes(), writes);
    assert_eq!(store.load_snapshot().unwrap().unwrap().pgn, "1. e4 *");
}

//! The puzzle orchestrator.
//!
//! A [`Puzzle`] owns one source, the grid of pieces cut from it, the timers
//! driving repaint and auto-solve, and the store its progress is saved to.
//! Instances are independent; nothing is shared between them.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::drag::{DragSession, DEFAULT_MAGNET_TOLERANCE};
use crate::error::{PuzzleError, SourceError};
use crate::geometry::{GridSpec, PiecePosition};
use crate::grid;
use crate::persistence::{PuzzleState, PuzzleStore, SavedPiece, STATE_VERSION};
use crate::pieces::{LockState, Piece};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::source::{scaled_size, GraphicSource, Playback, ScalePolicy, SourceLoader, Viewport};

/// Settings a puzzle is built with.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    pub columns: u32,
    pub rows: u32,
    pub scale_policy: ScalePolicy,
    /// Tag piece surfaces for drop-shadow filtering.
    pub shadows: bool,
    /// Snap distance used by drag sessions.
    pub magnet_tolerance: i32,
    /// Repaint period; zero disables the repaint timer.
    pub repaint_interval_ms: u64,
    /// Solve the puzzle this long after every shuffle.
    pub auto_resolve_after_ms: Option<u64>,
    /// Fixed seed for reproducible shuffles.
    pub seed: Option<u64>,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            columns: 8,
            rows: 5,
            scale_policy: ScalePolicy::default(),
            shadows: false,
            magnet_tolerance: DEFAULT_MAGNET_TOLERANCE,
            repaint_interval_ms: 33,
            auto_resolve_after_ms: None,
            seed: None,
        }
    }
}

impl PuzzleConfig {
    /// Reads a config from JSON; missing fields keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

/// Work the puzzle schedules on its own clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PuzzleTask {
    Repaint,
    Resolve,
    /// Shuffle a solved puzzle, solve an unsolved one.
    Cycle,
}

/// What happened during one [`Puzzle::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Times the presentation layer should redraw.
    pub repaints: u32,
    /// A video source reached its end during a repaint and the host
    /// should seek it back to the start.
    pub rewind: bool,
    pub blends: u32,
    pub resolves: u32,
}

/// How [`Puzzle::restore_or_blend`] placed the pieces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Restored,
    Blended,
}

pub struct Puzzle {
    config: PuzzleConfig,
    source: GraphicSource,
    viewport: Viewport,
    grid: GridSpec,
    pieces: Vec<Piece>,
    store: Box<dyn PuzzleStore>,
    saved: Option<PuzzleState>,
    scheduler: Scheduler<PuzzleTask>,
    repaint: Option<TaskHandle>,
    pending_resolve: Option<TaskHandle>,
    demo_loop: Option<TaskHandle>,
    rng: StdRng,
    top_z: u32,
}

impl Puzzle {
    /// Loads the source, sizes it for `viewport` and cuts it into pieces.
    ///
    /// Pieces start on their original boxes, unlocked. Call
    /// [`Puzzle::restore_or_blend`] to deal them out.
    pub fn build(
        config: PuzzleConfig,
        loader: &dyn SourceLoader,
        url: &str,
        viewport: Viewport,
        store: Box<dyn PuzzleStore>,
    ) -> Result<Self, PuzzleError> {
        let source = loader.load(url)?;
        if source.width == 0 || source.height == 0 {
            return Err(SourceError::ZeroSized {
                url: source.url,
                width: source.width,
                height: source.height,
            }
            .into());
        }

        let (width, height) = scaled_size(source.width, source.height, config.scale_policy, &viewport);
        if width == 0 || height == 0 {
            return Err(SourceError::ScaledAway { url: source.url }.into());
        }
        let grid = GridSpec::new(config.columns, config.rows, width, height)?;

        let pieces: Vec<Piece> = grid::positions(&grid)
            .map(|position| Piece::new(position, &grid, config.shadows))
            .collect();
        debug!(count = pieces.len(), "built pieces");

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut scheduler = Scheduler::new();
        let repaint = (config.repaint_interval_ms > 0).then(|| {
            scheduler.schedule_repeating(
                Duration::from_millis(config.repaint_interval_ms),
                PuzzleTask::Repaint,
            )
        });

        info!(
            url = %source.url,
            columns = grid.columns(),
            rows = grid.rows(),
            width,
            height,
            "puzzle built"
        );

        Ok(Self {
            config,
            source,
            viewport,
            grid,
            pieces,
            store,
            saved: None,
            scheduler,
            repaint,
            pending_resolve: None,
            demo_loop: None,
            rng,
            top_z: 0,
        })
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub fn source(&self) -> &GraphicSource {
        &self.source
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The grid over the scaled source.
    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// All pieces in build order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, index: usize) -> Option<&Piece> {
        self.pieces.get(index)
    }

    pub fn piece_at(&self, position: PiecePosition) -> Option<&Piece> {
        if !self.grid.contains(position) {
            return None;
        }
        self.pieces.get(grid::position_to_index(&self.grid, position))
    }

    pub fn store(&self) -> &dyn PuzzleStore {
        self.store.as_ref()
    }

    pub fn locked_count(&self) -> usize {
        self.pieces.iter().filter(|piece| piece.is_locked()).count()
    }

    pub fn is_solved(&self) -> bool {
        self.pieces.iter().all(Piece::is_locked)
    }

    /// Deals every piece to a random spot inside the viewport.
    pub fn blend(&mut self) {
        let viewport = self.viewport;
        let (available_w, available_h) = viewport.available();
        let piece_w = (self.grid.source_width() as f64 * 1.5 / self.grid.columns() as f64).ceil() as i64;
        let piece_h = (self.grid.source_height() as f64 * 1.5 / self.grid.rows() as f64).ceil() as i64;
        let max_x = (available_w - piece_w).max(0) as i32;
        let max_y = (available_h - piece_h).max(0) as i32;

        for piece in &mut self.pieces {
            let x = self.rng.gen_range(0..=max_x) - viewport.padding_x + viewport.margin_x;
            let y = self.rng.gen_range(0..=max_y) - viewport.padding_y + viewport.margin_y;
            piece.set_position(Some(x), Some(y));
            piece.evaluate_lock(None);
        }
        info!(pieces = self.pieces.len(), "pieces blended");
        self.save();

        if let Some(delay) = self.config.auto_resolve_after_ms {
            if let Some(handle) = self.pending_resolve.take() {
                self.scheduler.cancel(handle);
            }
            self.pending_resolve = Some(
                self.scheduler
                    .schedule_once(Duration::from_millis(delay), PuzzleTask::Resolve),
            );
        }
    }

    /// Puts every piece back on its original box and locks it.
    pub fn resolve(&mut self) {
        if let Some(handle) = self.pending_resolve.take() {
            self.scheduler.cancel(handle);
        }
        for piece in &mut self.pieces {
            piece.set_position(None, None);
            piece.evaluate_lock(None);
        }
        info!("puzzle resolved");
        self.save();
    }

    /// Current progress in saveable form.
    pub fn state(&self) -> PuzzleState {
        PuzzleState {
            version: STATE_VERSION,
            source_url: self.source.url.clone(),
            columns: self.grid.columns(),
            rows: self.grid.rows(),
            scale_policy: self.config.scale_policy,
            pieces: self.pieces.iter().map(saved_piece).collect(),
        }
    }

    /// Saves the position of every piece.
    pub fn save(&mut self) {
        self.saved = Some(self.state());
        self.persist();
    }

    /// Saves the position of one piece, keeping the others as last saved.
    pub fn save_piece(&mut self, index: usize) {
        let Some(piece) = self.pieces.get(index) else {
            return;
        };
        match self.saved.as_mut() {
            Some(state) => state.pieces[index] = saved_piece(piece),
            None => self.saved = Some(self.state()),
        }
        self.persist();
    }

    /// Writes the retained state. Failures only cost the player their
    /// progress, so they are logged and otherwise ignored.
    fn persist(&mut self) {
        if let Some(state) = &self.saved {
            if let Err(error) = self.store.save(state) {
                warn!(%error, "could not save puzzle");
            }
        }
    }

    /// Why `state` cannot be applied to this puzzle, if it cannot.
    fn mismatch(&self, state: &PuzzleState) -> Option<&'static str> {
        if state.source_url != self.source.url {
            Some("saved puzzle is for another source")
        } else if state.columns != self.grid.columns() || state.rows != self.grid.rows() {
            Some("saved puzzle has another grid")
        } else if state.pieces.len() != self.pieces.len() {
            Some("saved puzzle has the wrong number of pieces")
        } else {
            None
        }
    }

    /// Puts the pieces where the store last saw them, or deals them out
    /// fresh when there is nothing usable to restore.
    pub fn restore_or_blend(&mut self) -> StartOutcome {
        match self.store.load() {
            Ok(Some(state)) => match self.mismatch(&state) {
                None => {
                    for (piece, saved) in self.pieces.iter_mut().zip(&state.pieces) {
                        piece.set_position(Some(saved.x), Some(saved.y));
                        piece.evaluate_lock(None);
                    }
                    info!(locked = self.locked_count(), "puzzle restored");
                    self.saved = Some(state);
                    return StartOutcome::Restored;
                }
                Some(reason) => warn!(reason, "ignoring saved puzzle"),
            },
            Ok(None) => debug!("no saved puzzle"),
            Err(error) => warn!(%error, "ignoring unreadable saved puzzle"),
        }
        self.blend();
        StartOutcome::Blended
    }

    /// Picks up the piece at `index` and raises it above all others.
    pub fn begin_drag(&mut self, index: usize, pointer: (i32, i32)) -> Option<DragSession> {
        let piece = self.pieces.get_mut(index)?;
        self.top_z += 1;
        piece.set_z_index(self.top_z);
        Some(DragSession::start(
            index,
            piece,
            pointer,
            self.config.magnet_tolerance,
        ))
    }

    /// Moves the dragged piece to follow the pointer.
    pub fn drag(&mut self, session: &DragSession, pointer: (i32, i32)) -> (i32, i32) {
        session.drag_to(&mut self.pieces[session.piece()], pointer)
    }

    /// Drops the dragged piece, locking it if it landed home.
    pub fn end_drag(&mut self, session: DragSession) -> LockState {
        let index = session.piece();
        let lock = self.pieces[index].evaluate_lock(None);
        self.save_piece(index);
        lock
    }

    /// Alternates shuffling and solving every `interval` until stopped.
    pub fn start_demo_loop(&mut self, interval: Duration) {
        self.stop_demo_loop();
        self.demo_loop = Some(self.scheduler.schedule_repeating(interval, PuzzleTask::Cycle));
    }

    pub fn stop_demo_loop(&mut self) {
        if let Some(handle) = self.demo_loop.take() {
            self.scheduler.cancel(handle);
        }
    }

    pub fn is_repainting(&self) -> bool {
        self.repaint
            .is_some_and(|handle| self.scheduler.is_scheduled(handle))
    }

    pub fn resolve_pending(&self) -> bool {
        self.pending_resolve
            .is_some_and(|handle| self.scheduler.is_scheduled(handle))
    }

    /// Advances the puzzle's timers by `elapsed` and runs whatever came due,
    /// one firing at a time. `playback` is where a video source currently
    /// is; pass `None` for still images.
    pub fn tick(&mut self, elapsed: Duration, playback: Option<Playback>) -> TickReport {
        let mut report = TickReport::default();
        let until = self.scheduler.now() + elapsed;
        while let Some((handle, task)) = self.scheduler.pop_due(until) {
            match task {
                PuzzleTask::Repaint => {
                    report.repaints += 1;
                    if let Some(Playback { position, duration }) = playback {
                        report.rewind |= self.source.should_rewind(position, duration);
                    }
                }
                PuzzleTask::Resolve => {
                    if self.pending_resolve == Some(handle) {
                        self.pending_resolve = None;
                    }
                    self.resolve();
                    report.resolves += 1;
                }
                PuzzleTask::Cycle => {
                    if self.is_solved() {
                        self.blend();
                        report.blends += 1;
                    } else {
                        self.resolve();
                        report.resolves += 1;
                    }
                }
            }
        }
        self.scheduler.advance_to(until);
        if report.rewind {
            debug!("video source reached its end");
        }
        report
    }

    /// Stops every timer. The pieces keep their last positions.
    pub fn teardown(&mut self) {
        self.scheduler.clear();
        self.repaint = None;
        self.pending_resolve = None;
        self.demo_loop = None;
        debug!("puzzle timers stopped");
    }
}

fn saved_piece(piece: &Piece) -> SavedPiece {
    SavedPiece {
        x: piece.current_x(),
        y: piece.current_y(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::persistence::{encode, MemoryStore};
    use crate::source::{ImageFileLoader, KnownSource, SourceKind};

    const URL: &str = "frankred.jpg";

    fn loader(width: u32, height: u32) -> KnownSource {
        KnownSource(GraphicSource {
            kind: SourceKind::Image,
            url: String::new(),
            width,
            height,
        })
    }

    fn config() -> PuzzleConfig {
        PuzzleConfig {
            columns: 8,
            rows: 4,
            scale_policy: ScalePolicy::KeepOriginal,
            seed: Some(7),
            ..PuzzleConfig::default()
        }
    }

    fn build_with(config: PuzzleConfig, store: Box<dyn PuzzleStore>) -> Puzzle {
        Puzzle::build(config, &loader(800, 400), URL, Viewport::new(1280, 800), store).unwrap()
    }

    fn build() -> Puzzle {
        build_with(config(), Box::new(MemoryStore::new()))
    }

    fn positions(puzzle: &Puzzle) -> Vec<(i32, i32)> {
        puzzle
            .pieces()
            .iter()
            .map(|piece| (piece.current_x(), piece.current_y()))
            .collect()
    }

    #[test]
    fn test_build_cuts_every_cell() {
        let puzzle = build();
        assert_eq!(puzzle.pieces().len(), 32);
        assert_eq!(puzzle.grid().basic_cell_size().width, 100);

        let first = puzzle.piece(0).unwrap();
        assert_eq!((first.bounds().x, first.bounds().y, first.bounds().width), (0, 0, 125));

        let last = puzzle.piece_at(PiecePosition::new(8, 4)).unwrap();
        assert_eq!((last.bounds().x, last.bounds().y), (675, 275));
        assert!(puzzle.piece_at(PiecePosition::new(9, 1)).is_none());
        assert!(puzzle.piece_at(PiecePosition::new(0, 1)).is_none());
        assert_eq!(puzzle.piece_at(PiecePosition::new(1, 2)).unwrap().position(), PiecePosition::new(1, 2));
    }

    #[test]
    fn test_blend_then_resolve_locks_everything() {
        let mut puzzle = build();
        puzzle.blend();
        assert!(!puzzle.is_solved());

        puzzle.resolve();
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.locked_count(), 32);
        for piece in puzzle.pieces() {
            assert_eq!(piece.current_x(), piece.bounds().x);
            assert_eq!(piece.current_y(), piece.bounds().y);
        }
    }

    #[test]
    fn test_blend_stays_inside_the_viewport() {
        let viewport = Viewport {
            margin_x: 20,
            margin_y: 30,
            padding_x: 50,
            padding_y: 40,
            ..Viewport::new(1280, 800)
        };
        let mut puzzle = Puzzle::build(config(), &loader(800, 400), URL, viewport, Box::new(MemoryStore::new())).unwrap();
        puzzle.blend();

        // 800 * 1.5 / 8 = 150 and 400 * 1.5 / 4 = 150
        let max_x = 1280 - 40 - 150;
        let max_y = 800 - 60 - 150;
        for (x, y) in positions(&puzzle) {
            assert!((-30..=max_x - 30).contains(&x), "x {x} out of range");
            assert!((-10..=max_y - 10).contains(&y), "y {y} out of range");
        }
    }

    #[test]
    fn test_seeded_blends_repeat() {
        let mut first = build();
        let mut second = build();
        first.blend();
        second.blend();
        assert_eq!(positions(&first), positions(&second));
    }

    #[test]
    fn test_restore_puts_pieces_back() {
        let mut original = build();
        original.blend();
        let saved = original.store().load().unwrap().unwrap();
        assert_eq!(saved, original.state());

        let store = MemoryStore::with_contents(encode(&saved).unwrap());
        let mut resumed = build_with(PuzzleConfig { seed: Some(99), ..config() }, Box::new(store));
        assert_eq!(resumed.restore_or_blend(), StartOutcome::Restored);
        assert_eq!(positions(&resumed), positions(&original));
        assert_eq!(resumed.locked_count(), original.locked_count());
    }

    #[test]
    fn test_unusable_saves_fall_back_to_blend() {
        let mut other_source = build();
        other_source.blend();
        let mut state = other_source.state();
        state.source_url = "another.jpg".into();

        let stores = [
            MemoryStore::new(),
            MemoryStore::with_contents("not json"),
            MemoryStore::with_contents(encode(&PuzzleState { version: 0, ..state.clone() }).unwrap()),
            MemoryStore::with_contents(encode(&state).unwrap()),
            MemoryStore::with_contents(encode(&PuzzleState { source_url: URL.into(), columns: 4, ..state.clone() }).unwrap()),
        ];
        for store in stores {
            let mut puzzle = build_with(config(), Box::new(store));
            assert_eq!(puzzle.restore_or_blend(), StartOutcome::Blended);
            // the fresh shuffle replaced whatever was stored
            assert_eq!(puzzle.store().load().unwrap(), Some(puzzle.state()));
        }
    }

    #[test]
    fn test_drag_snaps_and_saves_one_piece() {
        let mut puzzle = build();
        puzzle.blend();
        let before = puzzle.store().load().unwrap().unwrap();

        let index = 9;
        let start = (puzzle.piece(index).unwrap().current_x(), puzzle.piece(index).unwrap().current_y());
        let session = puzzle.begin_drag(index, start).unwrap();
        assert_eq!(puzzle.piece(index).unwrap().z_index(), 1);

        let home = *puzzle.piece(index).unwrap().bounds();
        assert_eq!(puzzle.drag(&session, (home.x + 7, home.y - 4)), (home.x, home.y));
        assert_eq!(puzzle.end_drag(session), LockState::Locked);

        let after = puzzle.store().load().unwrap().unwrap();
        assert_eq!(after.pieces[index], SavedPiece { x: home.x, y: home.y });
        for (slot, (old, new)) in before.pieces.iter().zip(&after.pieces).enumerate() {
            if slot != index {
                assert_eq!(old, new, "slot {slot} changed");
            }
        }

        let again = puzzle.begin_drag(0, (0, 0)).unwrap();
        assert_eq!(puzzle.piece(0).unwrap().z_index(), 2);
        puzzle.end_drag(again);
        assert!(puzzle.begin_drag(32, (0, 0)).is_none());
    }

    #[test]
    fn test_repaint_runs_until_teardown() {
        let mut puzzle = build();
        assert!(puzzle.is_repainting());
        assert_eq!(puzzle.tick(Duration::from_millis(100), None).repaints, 3);

        puzzle.teardown();
        assert!(!puzzle.is_repainting());
        assert_eq!(puzzle.tick(Duration::from_secs(10), None), TickReport::default());
    }

    #[test]
    fn test_auto_resolve_after_blend() {
        let config = PuzzleConfig {
            auto_resolve_after_ms: Some(100),
            repaint_interval_ms: 0,
            ..config()
        };
        let mut puzzle = build_with(config, Box::new(MemoryStore::new()));
        puzzle.blend();
        assert!(puzzle.resolve_pending());

        assert_eq!(puzzle.tick(Duration::from_millis(99), None).resolves, 0);
        assert_eq!(puzzle.tick(Duration::from_millis(1), None).resolves, 1);
        assert!(puzzle.is_solved());
        assert!(!puzzle.resolve_pending());
    }

    #[test]
    fn test_manual_resolve_cancels_pending_one() {
        let config = PuzzleConfig {
            auto_resolve_after_ms: Some(100),
            ..config()
        };
        let mut puzzle = build_with(config, Box::new(MemoryStore::new()));
        puzzle.blend();
        puzzle.resolve();
        assert!(!puzzle.resolve_pending());
        assert_eq!(puzzle.tick(Duration::from_secs(1), None).resolves, 0);
    }

    #[test]
    fn test_demo_loop_alternates_until_stopped() {
        let config = PuzzleConfig {
            repaint_interval_ms: 0,
            ..config()
        };
        let mut puzzle = build_with(config, Box::new(MemoryStore::new()));
        puzzle.start_demo_loop(Duration::from_secs(1));

        let second = Duration::from_secs(1);
        assert_eq!(puzzle.tick(second, None).resolves, 1, "fresh pieces are not locked yet");
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.tick(second, None).blends, 1);
        assert!(!puzzle.is_solved());
        assert_eq!(puzzle.tick(second, None).resolves, 1);

        puzzle.stop_demo_loop();
        assert_eq!(puzzle.tick(second * 5, None), TickReport::default());
    }

    #[test]
    fn test_auto_resolve_is_timed_from_the_blend() {
        let config = PuzzleConfig {
            auto_resolve_after_ms: Some(100),
            repaint_interval_ms: 0,
            ..config()
        };
        let mut puzzle = build_with(config, Box::new(MemoryStore::new()));
        puzzle.resolve();
        puzzle.start_demo_loop(Duration::from_millis(500));

        // blend at 500, resolve at 600, blend again at 1000
        let report = puzzle.tick(Duration::from_secs(1), None);
        assert_eq!((report.blends, report.resolves), (2, 1));
        assert!(puzzle.resolve_pending(), "the second blend's resolve is due at 1100");

        assert_eq!(puzzle.tick(Duration::from_millis(100), None).resolves, 1);
        assert!(puzzle.is_solved());
    }

    #[test]
    fn test_video_at_its_end_asks_for_rewind() {
        let video = KnownSource(GraphicSource {
            kind: SourceKind::Video,
            url: String::new(),
            width: 800,
            height: 400,
        });
        let mut puzzle = Puzzle::build(config(), &video, "clip.webm", Viewport::new(1280, 800), Box::new(MemoryStore::new())).unwrap();
        let duration = Duration::from_secs(5);

        let playing = Playback { position: Duration::from_secs(4), duration };
        assert!(!puzzle.tick(Duration::from_millis(100), Some(playing)).rewind);

        let ended = Playback { position: duration, duration };
        let report = puzzle.tick(Duration::from_millis(100), Some(ended));
        assert!(report.rewind, "an ended video must be rewound to keep looping");
        assert_eq!(report.repaints, 3);

        // no repaint in between, nothing to rewind
        assert!(!puzzle.tick(Duration::from_millis(1), Some(ended)).rewind);
    }

    #[test]
    fn test_images_never_rewind() {
        let mut puzzle = build();
        let ended = Playback {
            position: Duration::from_secs(5),
            duration: Duration::from_secs(5),
        };
        let report = puzzle.tick(Duration::from_millis(100), Some(ended));
        assert_eq!(report.repaints, 3);
        assert!(!report.rewind);
    }

    #[test]
    fn test_source_failures_are_reported() {
        let missing = Puzzle::build(config(), &ImageFileLoader, "/nonexistent/source.png", Viewport::default(), Box::new(MemoryStore::new()));
        assert!(matches!(missing, Err(PuzzleError::Source(SourceError::Unreadable { .. }))));

        let empty = Puzzle::build(config(), &loader(0, 400), URL, Viewport::default(), Box::new(MemoryStore::new()));
        assert!(matches!(empty, Err(PuzzleError::Source(SourceError::ZeroSized { .. }))));

        let squeezed = Puzzle::build(
            PuzzleConfig { scale_policy: ScalePolicy::FitWindow, ..config() },
            &loader(800, 400),
            URL,
            Viewport { margin_x: 700, ..Viewport::new(1280, 800) },
            Box::new(MemoryStore::new()),
        );
        assert!(matches!(squeezed, Err(PuzzleError::Source(SourceError::ScaledAway { .. }))));

        let no_grid = Puzzle::build(PuzzleConfig { columns: 0, ..config() }, &loader(800, 400), URL, Viewport::default(), Box::new(MemoryStore::new()));
        assert!(matches!(no_grid, Err(PuzzleError::Grid(_))));
    }

    struct FailingStore;

    impl PuzzleStore for FailingStore {
        fn save(&mut self, _state: &PuzzleState) -> Result<(), PersistenceError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn load(&self) -> Result<Option<PuzzleState>, PersistenceError> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into())
        }
    }

    #[test]
    fn test_store_failures_are_not_fatal() {
        let mut puzzle = build_with(config(), Box::new(FailingStore));
        assert_eq!(puzzle.restore_or_blend(), StartOutcome::Blended);
        puzzle.resolve();
        assert!(puzzle.is_solved());
    }

    #[test]
    fn test_config_from_json_keeps_defaults() {
        let config = PuzzleConfig::from_json(r#"{"columns": 12, "scale_policy": "fitWindow", "seed": 3}"#).unwrap();
        assert_eq!(config.columns, 12);
        assert_eq!(config.rows, 5);
        assert_eq!(config.scale_policy, ScalePolicy::FitWindow);
        assert_eq!(config.magnet_tolerance, DEFAULT_MAGNET_TOLERANCE);
        assert_eq!(config.seed, Some(3));
    }
}

//! Session state machine: menu, level select, play, fail and pass screens.

use serde::{Deserialize, Serialize};

use crate::{
    actor::Duck,
    config::{EngineConfig, Settings},
    cues::{AudioCue, CueBuffer},
    input::{Command, InputFrame},
    judgment::FrameJudgments,
    notes::NoteField,
    persistence::ScoreStore,
    render::{FrameSnapshot, HealthBand, SessionView},
    schedule::ScheduleBuilder,
    session::{SessionOutcome, SessionTracker, StarRating},
    LevelTable, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Menu,
    Select,
    Playing,
    Fail,
    Pass,
}

/// Tells the host whether to keep running its frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFlow {
    Continue,
    Quit,
}

/// Everything that is rebuilt when a level starts.
#[derive(Debug, Clone)]
pub struct PlaySession {
    level_index: usize,
    field: NoteField,
    duck: Duck,
    tracker: SessionTracker,
}

impl PlaySession {
    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn field(&self) -> &NoteField {
        &self.field
    }

    pub fn duck(&self) -> &Duck {
        &self.duck
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }
}

pub struct Game {
    config: EngineConfig,
    levels: LevelTable,
    scores: Box<dyn ScoreStore>,
    state: GameState,
    settings: Settings,
    level_index: usize,
    unlocked: usize,
    session: Option<PlaySession>,
    judgments: FrameJudgments,
    cues: CueBuffer,
    best_score: u32,
    last_stars: Option<StarRating>,
}

impl Game {
    pub fn new(
        config: EngineConfig,
        levels: LevelTable,
        scores: Box<dyn ScoreStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            levels,
            scores,
            state: GameState::Menu,
            settings: Settings::default(),
            level_index: 0,
            unlocked: 1,
            session: None,
            judgments: FrameJudgments::default(),
            cues: CueBuffer::new(),
            best_score: 0,
            last_stars: None,
        })
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    /// Number of levels that can be chosen on the select screen.
    pub fn unlocked(&self) -> usize {
        self.unlocked
    }

    pub fn session(&self) -> Option<&PlaySession> {
        self.session.as_ref()
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn last_stars(&self) -> Option<StarRating> {
        self.last_stars
    }

    /// Audio cues produced by the latest call to [`Game::frame`].
    pub fn cues(&self) -> &CueBuffer {
        &self.cues
    }

    /// Applies this frame's input, then advances the simulation by `dt`.
    pub fn frame(&mut self, input: &InputFrame, dt: f32) -> FrameFlow {
        self.cues.clear();

        for &command in input.commands() {
            if command == Command::Quit {
                tracing::info!(state = ?self.state, "quit requested");
                return FrameFlow::Quit;
            }
            self.apply(command);
        }

        if self.state == GameState::Playing {
            self.step(dt);
        }
        FrameFlow::Continue
    }

    fn apply(&mut self, command: Command) {
        match (self.state, command) {
            (_, Command::ToggleMute) => self.settings.toggle_mute(),
            (_, Command::ToggleNoteStyle) => self.settings.toggle_note_style(),
            (GameState::Menu, Command::Confirm) => self.transition(GameState::Select),
            (GameState::Select, Command::SelectLevel(index)) => {
                if index < self.unlocked {
                    self.level_index = index;
                } else {
                    tracing::debug!(index, unlocked = self.unlocked, "level is locked");
                }
            }
            (GameState::Select, Command::Confirm) | (GameState::Fail, Command::Confirm) => {
                self.start_level(self.level_index);
            }
            (GameState::Playing, Command::MoveUp) => {
                if let Some(session) = self.session.as_mut() {
                    session.duck.move_up();
                }
            }
            (GameState::Playing, Command::MoveDown) => {
                if let Some(session) = self.session.as_mut() {
                    session.duck.move_down();
                }
            }
            (GameState::Playing, Command::Back) => {
                self.session = None;
                self.cues.push(AudioCue::LevelEnd);
                self.transition(GameState::Select);
            }
            (GameState::Pass, Command::Confirm) => self.transition(GameState::Select),
            (GameState::Pass, Command::NextLevel) => {
                let next = self.level_index + 1;
                if next < self.levels.len() {
                    self.start_level(next);
                }
            }
            _ => {}
        }
    }

    fn start_level(&mut self, index: usize) {
        let level = match self.levels.get(index) {
            Ok(level) => level,
            Err(err) => {
                tracing::warn!(%err, "cannot start level");
                return;
            }
        };

        let builder = ScheduleBuilder::new(self.config.schedule.clone(), &self.config.playfield);
        let schedule = builder.build(&level.pattern);
        let bpm = level.pattern.tempo_bpm;
        tracing::info!(
            level = index,
            name = %level.name,
            bpm,
            lanes = level.pattern.lane_count,
            notes = schedule.len(),
            "starting level"
        );

        self.session = Some(PlaySession {
            level_index: index,
            field: NoteField::new(self.config.playfield.clone(), schedule),
            duck: Duck::new(level.pattern.lane_count, self.config.actor.feeding_time),
            tracker: SessionTracker::new(self.config.health.clone(), self.config.scoring.clone()),
        });
        self.level_index = index;
        self.cues.push(AudioCue::LevelStart { bpm });
        self.transition(GameState::Playing);
    }

    fn step(&mut self, dt: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let dt = session
            .tracker
            .advance_time(dt, self.config.frame.max_frame_dt);
        let elapsed = session.tracker.elapsed();

        self.judgments.clear();
        session
            .field
            .advance_into(dt, elapsed, session.duck.lane(), &mut self.judgments);

        for hit in &self.judgments.hits {
            session.tracker.record_hit(hit);
            session.duck.on_hit();
            self.cues.push(AudioCue::Hit { lane: hit.lane });
        }
        for _ in &self.judgments.misses {
            session.tracker.record_miss();
            self.cues.push(AudioCue::Miss);
        }
        session.duck.tick(dt);

        match session.tracker.evaluate(session.field.is_drained()) {
            SessionOutcome::InProgress => {}
            SessionOutcome::Failed => self.finish_failed(),
            SessionOutcome::Passed(stars) => self.finish_passed(stars),
        }
    }

    fn finish_failed(&mut self) {
        if let Some(session) = &self.session {
            tracing::info!(
                level = self.level_index,
                misses = session.tracker.miss_count(),
                score = session.tracker.score(),
                "level failed"
            );
        }
        self.cues.push(AudioCue::LevelEnd);
        self.transition(GameState::Fail);
    }

    fn finish_passed(&mut self, stars: StarRating) {
        let (score, misses) = match &self.session {
            Some(session) => (session.tracker.score(), session.tracker.miss_count()),
            None => (0, 0),
        };

        self.unlocked = self
            .unlocked
            .max((self.level_index + 2).min(self.levels.len()));
        self.last_stars = Some(stars);

        let previous = self.scores.load_best_score().unwrap_or_else(|err| {
            tracing::warn!(%err, "could not read best score, treating it as zero");
            0
        });
        let new_best = score > previous;
        if new_best {
            if let Err(err) = self.scores.save_best_score(score) {
                tracing::warn!(%err, "could not save best score");
            }
        }
        self.best_score = previous.max(score);

        tracing::info!(
            level = self.level_index,
            score,
            misses,
            stars = stars.stars(),
            new_best,
            "level cleared"
        );
        self.cues.push(AudioCue::LevelEnd);
        self.transition(GameState::Pass);
    }

    fn transition(&mut self, next: GameState) {
        tracing::debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    /// Read-only view of the current frame for the renderer.
    pub fn snapshot(&self) -> FrameSnapshot<'_> {
        let level = self.levels.get(self.level_index).ok();
        let session = self.session.as_ref();

        FrameSnapshot {
            state: self.state,
            settings: self.settings,
            level_index: self.level_index,
            level_name: level.map(|level| level.name.as_str()).unwrap_or_default(),
            tempo_bpm: level.map(|level| level.pattern.tempo_bpm).unwrap_or_default(),
            lane_count: level.map(|level| level.pattern.lane_count).unwrap_or_default(),
            unlocked: self.unlocked,
            level_count: self.levels.len(),
            notes: session.map(|session| session.field.notes()).unwrap_or_default(),
            actor: session.map(|session| &session.duck),
            session: session.map(|session| {
                let tracker = &session.tracker;
                SessionView {
                    elapsed: tracker.elapsed(),
                    score: tracker.score(),
                    miss_count: tracker.miss_count(),
                    health_remaining: tracker.health_remaining(),
                    health_segments: tracker.health_segments(),
                    health_band: HealthBand::from_remaining(tracker.health_remaining()),
                    last_grade: tracker.last_grade(),
                }
            }),
            best_score: self.best_score,
            last_stars: self.last_stars,
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("level_index", &self.level_index)
            .field("unlocked", &self.unlocked)
            .field("settings", &self.settings)
            .field("best_score", &self.best_score)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryScoreStore;
    use crate::{Level, Pattern};

    const DT: f32 = 1.0 / 60.0;

    fn short_levels() -> LevelTable {
        LevelTable::new(vec![
            Level::new("One", Pattern::from_pairs(92.0, 2, &[(0.0, 0)])),
            Level::new("Two", Pattern::from_pairs(92.0, 3, &[(0.0, 1)])),
        ])
        .unwrap()
    }

    fn game() -> Game {
        Game::new(
            EngineConfig::default(),
            short_levels(),
            Box::new(MemoryScoreStore::default()),
        )
        .unwrap()
    }

    fn press(game: &mut Game, commands: &[Command]) -> FrameFlow {
        let input: InputFrame = commands.iter().copied().collect();
        game.frame(&input, DT)
    }

    fn run_until_terminal(game: &mut Game, lane_commands: &[Command]) {
        press(game, lane_commands);
        for _ in 0..2_000 {
            if game.state() != GameState::Playing {
                return;
            }
            press(game, &[]);
        }
        panic!("session did not finish");
    }

    #[test]
    fn menu_to_select_to_playing() {
        let mut game = game();
        assert_eq!(game.state(), GameState::Menu);
        press(&mut game, &[Command::Confirm]);
        assert_eq!(game.state(), GameState::Select);

        press(&mut game, &[Command::Confirm]);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.cues().cues(), &[AudioCue::LevelStart { bpm: 92.0 }]);
        assert!(game.session().is_some());
    }

    #[test]
    fn locked_levels_cannot_be_selected() {
        let mut game = game();
        press(&mut game, &[Command::Confirm]);
        press(&mut game, &[Command::SelectLevel(1)]);
        assert_eq!(game.level_index(), 0);
    }

    #[test]
    fn passing_unlocks_next_level_and_allows_advance() {
        let mut game = game();
        press(&mut game, &[Command::Confirm]);
        press(&mut game, &[Command::Confirm]);
        run_until_terminal(&mut game, &[Command::MoveUp]);

        assert_eq!(game.state(), GameState::Pass);
        assert_eq!(game.unlocked(), 2);
        assert_eq!(game.last_stars(), Some(StarRating::MAX));
        assert_eq!(game.best_score(), game.session().unwrap().tracker().score());

        press(&mut game, &[Command::NextLevel]);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.level_index(), 1);
    }

    #[test]
    fn unlocked_level_can_be_chosen_from_select_after_a_pass() {
        let mut game = game();
        press(&mut game, &[Command::Confirm]);
        press(&mut game, &[Command::Confirm]);
        run_until_terminal(&mut game, &[Command::MoveUp]);
        assert_eq!(game.state(), GameState::Pass);

        press(&mut game, &[Command::Confirm]);
        assert_eq!(game.state(), GameState::Select);
        press(&mut game, &[Command::SelectLevel(1)]);
        press(&mut game, &[Command::Confirm]);

        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.level_index(), 1);
        let session = game.session().unwrap();
        assert_eq!(session.level_index(), 1);
        assert_eq!(session.duck().lane_count(), 3);
    }

    #[test]
    fn next_level_on_last_level_is_ignored() {
        let mut game = game();
        press(&mut game, &[Command::Confirm]);
        press(&mut game, &[Command::Confirm]);
        run_until_terminal(&mut game, &[Command::MoveUp]);
        press(&mut game, &[Command::NextLevel]);
        run_until_terminal(&mut game, &[]);
        assert_eq!(game.state(), GameState::Pass);
        assert_eq!(game.unlocked(), 2);

        press(&mut game, &[Command::NextLevel]);
        assert_eq!(game.state(), GameState::Pass);
        press(&mut game, &[Command::Confirm]);
        assert_eq!(game.state(), GameState::Select);
    }

    #[test]
    fn failing_then_retrying_resets_the_session() {
        let mut config = EngineConfig::default();
        config.health.max_misses = 1;
        let mut game = Game::new(config, short_levels(), Box::new(MemoryScoreStore::default()))
            .unwrap();
        press(&mut game, &[Command::Confirm]);
        press(&mut game, &[Command::Confirm]);
        // The duck starts on lane 1 and the only note is on lane 0.
        run_until_terminal(&mut game, &[]);
        assert_eq!(game.state(), GameState::Fail);
        assert_eq!(game.cues().cues().last(), Some(&AudioCue::LevelEnd));

        press(&mut game, &[Command::Confirm]);
        assert_eq!(game.state(), GameState::Playing);
        let tracker = game.session().unwrap().tracker();
        assert_eq!(tracker.miss_count(), 0);
        assert!(tracker.elapsed() <= DT);
    }

    #[test]
    fn back_abandons_attempt() {
        let mut game = game();
        press(&mut game, &[Command::Confirm]);
        press(&mut game, &[Command::Confirm]);
        press(&mut game, &[Command::Back]);
        assert_eq!(game.state(), GameState::Select);
        assert!(game.session().is_none());
        assert_eq!(game.cues().cues(), &[AudioCue::LevelEnd]);
    }

    #[test]
    fn quit_stops_processing_in_any_state() {
        let mut game = game();
        assert_eq!(press(&mut game, &[Command::Quit, Command::Confirm]), FrameFlow::Quit);
        assert_eq!(game.state(), GameState::Menu);
    }

    #[test]
    fn settings_toggle_everywhere_without_touching_state() {
        let mut game = game();
        press(&mut game, &[Command::ToggleMute, Command::ToggleNoteStyle]);
        assert!(game.settings().muted);
        assert_eq!(game.state(), GameState::Menu);
        assert!(game.snapshot().settings.muted);
    }

    #[test]
    fn snapshot_exposes_play_fields() {
        let mut game = game();
        press(&mut game, &[Command::Confirm]);
        press(&mut game, &[Command::Confirm]);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.state, GameState::Playing);
        assert_eq!(snapshot.level_name, "One");
        assert_eq!(snapshot.lane_count, 2);
        assert_eq!(snapshot.notes.len(), 1);
        assert_eq!(snapshot.actor.map(|duck| duck.lane()), Some(1));
        let view = snapshot.session.unwrap();
        assert_eq!(view.health_remaining, 10);
        assert_eq!(view.health_band, HealthBand::Healthy);
    }
}

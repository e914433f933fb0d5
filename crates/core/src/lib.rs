//! Rhythm engine for Rhythm Duck, a lane-based rhythm game.
//!
//! Authored beat patterns are turned into a collision-free spawn schedule,
//! notes are simulated frame by frame against the duck's lane, and a session
//! tracker plus state machine decide when a level is passed or failed.
//! Rendering, sound, input polling and storage are left to the host, which
//! talks to the engine through commands, audio cues and read-only snapshots.

pub mod actor;
pub mod config;
pub mod cues;
pub mod error;
pub mod game;
pub mod input;
pub mod judgment;
pub mod notes;
pub mod pattern;
pub mod persistence;
pub mod render;
pub mod schedule;
pub mod session;

pub use actor::Duck;
pub use config::{EngineConfig, NoteStyle, Settings};
pub use cues::{AudioCue, CueBuffer, CueDispatcher};
pub use error::{Result, RhythmError};
pub use game::{FrameFlow, Game, GameState, PlaySession};
pub use input::{Command, InputFrame};
pub use judgment::{FrameJudgments, HitJudgment, TimingGrade};
pub use notes::{Note, NoteField, NoteState};
pub use pattern::{Level, LevelTable, Pattern, PatternEvent};
pub use persistence::{FileScoreStore, MemoryScoreStore, ScoreStore};
pub use render::{FrameSnapshot, HealthBand, Renderer, SessionView};
pub use schedule::{PlaybackClock, ScheduleBuilder, SpawnEvent, SpawnQueue};
pub use session::{SessionOutcome, SessionTracker, StarRating};

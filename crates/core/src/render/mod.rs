use serde::{Deserialize, Serialize};

use crate::{
    actor::Duck, config::Settings, judgment::TimingGrade, notes::Note, session::StarRating,
    GameState, Result,
};

/// Rendering backend abstraction. Hosts draw from the read-only snapshot the
/// game exposes once per frame; nothing flows back into the engine.
pub trait Renderer {
    fn render(&mut self, frame: &FrameSnapshot<'_>) -> Result<()>;
}

/// Colour band of the health bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthBand {
    Healthy,
    Warning,
    /// Two segments or fewer; the bar flashes.
    Critical,
}

impl HealthBand {
    pub fn from_remaining(remaining: u32) -> Self {
        if remaining > 5 {
            Self::Healthy
        } else if remaining > 2 {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionView {
    pub elapsed: f32,
    pub score: u32,
    pub miss_count: u32,
    pub health_remaining: u32,
    pub health_segments: u32,
    pub health_band: HealthBand,
    pub last_grade: Option<TimingGrade>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot<'a> {
    pub state: GameState,
    pub settings: Settings,
    pub level_index: usize,
    pub level_name: &'a str,
    pub tempo_bpm: f32,
    pub lane_count: usize,
    pub unlocked: usize,
    pub level_count: usize,
    pub notes: &'a [Note],
    pub actor: Option<&'a Duck>,
    pub session: Option<SessionView>,
    pub best_score: u32,
    /// Rating of the most recent pass.
    pub last_stars: Option<StarRating>,
}

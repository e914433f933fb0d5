use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, RhythmError};

/// Finest tick grid accepted for schedule quantization.
pub const MAX_TICKS_PER_BEAT: u32 = 960;
/// Upper bound on the spacing between consecutive spawns, in seconds.
pub const MAX_MIN_TIME_GAP: f32 = 60.0;

/// Top-level tunables for the rhythm engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub playfield: PlayfieldConfig,
    pub schedule: ScheduleConfig,
    pub health: HealthConfig,
    pub scoring: ScoringConfig,
    pub actor: ActorConfig,
    pub frame: FrameConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects values that would break the minimum-gap or window invariants.
    pub fn validate(&self) -> Result<()> {
        let p = &self.playfield;
        if !(p.note_speed.is_finite() && p.note_speed > 0.0) {
            return Err(invalid("note_speed must be positive"));
        }
        if !(p.hit_window.is_finite() && p.hit_window > 0.0) {
            return Err(invalid("hit_window must be positive"));
        }
        if p.judgment_x + p.hit_window >= p.spawn_x {
            return Err(invalid("judgment line must lie left of the spawn point"));
        }
        if p.despawn_x >= p.judgment_x - p.hit_window {
            return Err(invalid("despawn edge must lie past the hit window"));
        }
        if p.hit_linger < 0.0 {
            return Err(invalid("hit_linger must not be negative"));
        }

        let s = &self.schedule;
        if s.ticks_per_beat == 0 || s.ticks_per_beat > MAX_TICKS_PER_BEAT {
            return Err(invalid("ticks_per_beat must be between 1 and 960"));
        }
        if s.min_tick_gap == 0 {
            return Err(invalid("min_tick_gap must be at least 1"));
        }
        if !(s.min_time_gap > 0.0 && s.min_time_gap <= MAX_MIN_TIME_GAP) {
            return Err(invalid("min_time_gap must be positive and at most 60 seconds"));
        }

        if self.health.segments == 0 || self.health.max_misses == 0 {
            return Err(invalid("health segments and max_misses must be non-zero"));
        }
        if self.actor.feeding_time < 0.0 {
            return Err(invalid("feeding_time must not be negative"));
        }
        if !(self.frame.max_frame_dt.is_finite() && self.frame.max_frame_dt > 0.0) {
            return Err(invalid("max_frame_dt must be positive"));
        }
        // A clamped frame must not be able to carry a note across the whole window.
        if self.frame.max_frame_dt * p.note_speed >= 2.0 * p.hit_window {
            return Err(invalid(
                "max_frame_dt is large enough for a note to skip the hit window",
            ));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> RhythmError {
    RhythmError::InvalidConfig(reason.to_string())
}

/// Geometry of the lane track, in playfield units (pixels on the 240x150 canvas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldConfig {
    pub spawn_x: f32,
    pub judgment_x: f32,
    /// Units per second.
    pub note_speed: f32,
    pub hit_window: f32,
    /// Notes left of this are removed.
    pub despawn_x: f32,
    /// Hit notes linger this far past the judgment line before removal.
    pub hit_linger: f32,
}

impl PlayfieldConfig {
    /// Seconds a note needs from the spawn point to the judgment line.
    pub fn travel_time(&self) -> f32 {
        (self.spawn_x - self.judgment_x) / self.note_speed
    }

    /// Half-width of the hit window expressed in seconds.
    pub fn hit_window_seconds(&self) -> f32 {
        self.hit_window / self.note_speed
    }
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            spawn_x: 250.0,
            judgment_x: 40.0,
            note_speed: 70.0,
            hit_window: 6.0,
            despawn_x: -8.0,
            hit_linger: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub ticks_per_beat: u32,
    pub min_tick_gap: u32,
    /// Seconds between consecutive spawns.
    pub min_time_gap: f32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            ticks_per_beat: 8,
            min_tick_gap: 1,
            min_time_gap: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub segments: u32,
    pub penalty_per_miss: u32,
    pub max_misses: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            segments: 10,
            penalty_per_miss: 2,
            max_misses: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub miss_penalty: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { miss_penalty: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Seconds the feeding animation stays up after a hit.
    pub feeding_time: f32,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self { feeding_time: 0.15 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub max_frame_dt: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { max_frame_dt: 0.05 }
    }
}

/// Presentation settings handed to the renderer and audio collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub muted: bool,
    pub note_style: NoteStyle,
}

impl Settings {
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn toggle_note_style(&mut self) {
        self.note_style = match self.note_style {
            NoteStyle::Sun => NoteStyle::Cloud,
            NoteStyle::Cloud => NoteStyle::Sun,
        };
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteStyle {
    #[default]
    Sun,
    Cloud,
}

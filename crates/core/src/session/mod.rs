use serde::{Deserialize, Serialize};

use crate::config::{HealthConfig, ScoringConfig};
use crate::judgment::{HitJudgment, TimingGrade};
use crate::schedule::PlaybackClock;

/// Pass grade derived only from the miss count.
///
/// 0 misses → 3 stars, 1 → 2, 2..=3 → 1, anything more → 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StarRating(u8);

impl StarRating {
    pub const MAX: StarRating = StarRating(3);

    pub fn from_misses(misses: u32) -> Self {
        match misses {
            0 => Self(3),
            1 => Self(2),
            2 | 3 => Self(1),
            _ => Self(0),
        }
    }

    pub fn stars(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    InProgress,
    Failed,
    Passed(StarRating),
}

impl SessionOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Miss, score and health bookkeeping for one attempt at a level.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    health_config: HealthConfig,
    scoring: ScoringConfig,
    clock: PlaybackClock,
    miss_count: u32,
    hit_count: u32,
    score: u32,
    last_grade: Option<TimingGrade>,
}

impl SessionTracker {
    pub fn new(health_config: HealthConfig, scoring: ScoringConfig) -> Self {
        Self {
            health_config,
            scoring,
            clock: PlaybackClock::default(),
            miss_count: 0,
            hit_count: 0,
            score: 0,
            last_grade: None,
        }
    }

    /// Advances session time and returns the clamped delta to simulate with.
    pub fn advance_time(&mut self, dt: f32, max_dt: f32) -> f32 {
        self.clock.advance(dt, max_dt)
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.time_seconds
    }

    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn last_grade(&self) -> Option<TimingGrade> {
        self.last_grade
    }

    /// Health segments left. Derived from the miss count, so it can only fall.
    pub fn health_remaining(&self) -> u32 {
        let lost = self
            .miss_count
            .saturating_mul(self.health_config.penalty_per_miss);
        self.health_config.segments.saturating_sub(lost)
    }

    pub fn health_segments(&self) -> u32 {
        self.health_config.segments
    }

    pub fn record_hit(&mut self, hit: &HitJudgment) {
        self.hit_count += 1;
        self.score = self.score.saturating_add(hit.grade.points());
        self.last_grade = Some(hit.grade);
    }

    pub fn record_miss(&mut self) {
        self.miss_count += 1;
        self.score = self.score.saturating_sub(self.scoring.miss_penalty);
    }

    pub fn is_failed(&self) -> bool {
        self.miss_count >= self.health_config.max_misses || self.health_remaining() == 0
    }

    /// Fail is checked before pass, so a final miss that empties the field
    /// still fails the attempt.
    pub fn evaluate(&self, field_drained: bool) -> SessionOutcome {
        if self.is_failed() {
            SessionOutcome::Failed
        } else if field_drained {
            SessionOutcome::Passed(StarRating::from_misses(self.miss_count))
        } else {
            SessionOutcome::InProgress
        }
    }
}

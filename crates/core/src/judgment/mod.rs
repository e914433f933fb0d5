use serde::{Deserialize, Serialize};

/// Nested timing bands, tightest first, in absolute seconds.
pub const PERFECT_WINDOW_S: f32 = 0.05;
pub const GREAT_WINDOW_S: f32 = 0.12;
pub const GOOD_WINDOW_S: f32 = 0.25;

/// Grade of a hit, from its offset to the judgment line.
///
/// The bands are absolute, but a hit can only register inside the spatial
/// window, so the widest reachable offset is
/// [`PlayfieldConfig::hit_window_seconds`](crate::config::PlayfieldConfig::hit_window_seconds).
/// With the default playfield that is about 0.086 s, so only `Perfect` and
/// `Great` occur; `Good` and `Ok` need a wider window or a slower note speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimingGrade {
    Perfect,
    Great,
    Good,
    Ok,
}

impl TimingGrade {
    /// Grades a signed timing offset in seconds.
    pub fn from_offset(offset_seconds: f32) -> Self {
        let error = offset_seconds.abs();
        if error <= PERFECT_WINDOW_S {
            Self::Perfect
        } else if error <= GREAT_WINDOW_S {
            Self::Great
        } else if error <= GOOD_WINDOW_S {
            Self::Good
        } else {
            Self::Ok
        }
    }

    pub fn points(self) -> u32 {
        match self {
            Self::Perfect => 300,
            Self::Great => 150,
            Self::Good => 80,
            Self::Ok => 30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Great => "Great",
            Self::Good => "Good",
            Self::Ok => "OK",
        }
    }
}

/// A successful interception reported by the note simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitJudgment {
    pub lane: usize,
    /// Positive when the note was taken before reaching the line.
    pub offset_seconds: f32,
    pub grade: TimingGrade,
}

impl HitJudgment {
    pub fn new(lane: usize, offset_seconds: f32) -> Self {
        Self {
            lane,
            offset_seconds,
            grade: TimingGrade::from_offset(offset_seconds),
        }
    }
}

/// Everything the simulator judged during one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameJudgments {
    pub hits: Vec<HitJudgment>,
    /// Lanes of notes that turned Missed this frame.
    pub misses: Vec<usize>,
}

impl FrameJudgments {
    pub fn clear(&mut self) {
        self.hits.clear();
        self.misses.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty() && self.misses.is_empty()
    }
}

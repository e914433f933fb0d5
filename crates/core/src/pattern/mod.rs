use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, RhythmError};

pub const SUPPORTED_LANE_COUNTS: [usize; 3] = [2, 3, 4];
pub const MIN_TEMPO_BPM: f32 = 1.0;
pub const MAX_TEMPO_BPM: f32 = 1000.0;
/// Latest accepted beat position. Keeps quantized ticks far inside `i64`.
pub const MAX_BEAT: f32 = 100_000.0;

/// One authored note: a beat position and the lane it arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternEvent {
    pub beat: f32,
    pub lane: usize,
}

impl PatternEvent {
    pub const fn new(beat: f32, lane: usize) -> Self {
        Self { beat, lane }
    }
}

/// Declarative beat pattern for a level. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub tempo_bpm: f32,
    pub lane_count: usize,
    pub events: Vec<PatternEvent>,
}

impl Pattern {
    pub fn new(tempo_bpm: f32, lane_count: usize, events: Vec<PatternEvent>) -> Self {
        Self {
            tempo_bpm,
            lane_count,
            events,
        }
    }

    /// Builds a pattern from `(beat, lane)` pairs.
    pub fn from_pairs(tempo_bpm: f32, lane_count: usize, pairs: &[(f32, usize)]) -> Self {
        let events = pairs
            .iter()
            .map(|&(beat, lane)| PatternEvent::new(beat, lane))
            .collect();
        Self::new(tempo_bpm, lane_count, events)
    }

    pub fn seconds_per_beat(&self) -> f32 {
        60.0 / self.tempo_bpm
    }

    /// Checks the pattern for the configuration errors that must never reach
    /// the schedule builder. `level` only names the level in the error.
    pub fn validate(&self, level: &str) -> Result<()> {
        if !(MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&self.tempo_bpm) {
            return Err(RhythmError::pattern(
                level,
                format!(
                    "tempo must be in [{MIN_TEMPO_BPM}, {MAX_TEMPO_BPM}] bpm, got {}",
                    self.tempo_bpm
                ),
            ));
        }
        if !SUPPORTED_LANE_COUNTS.contains(&self.lane_count) {
            return Err(RhythmError::pattern(
                level,
                format!("unsupported lane count {}", self.lane_count),
            ));
        }
        if self.events.is_empty() {
            return Err(RhythmError::pattern(level, "pattern has no events"));
        }

        let mut seen = HashSet::with_capacity(self.events.len());
        for (index, event) in self.events.iter().enumerate() {
            if !(0.0..=MAX_BEAT).contains(&event.beat) {
                return Err(RhythmError::pattern(
                    level,
                    format!("event {index} has invalid beat position {}", event.beat),
                ));
            }
            if event.lane >= self.lane_count {
                return Err(RhythmError::pattern(
                    level,
                    format!(
                        "event {index} uses lane {} but the level has {} lanes",
                        event.lane, self.lane_count
                    ),
                ));
            }
            // `+ 0.0` folds -0.0 into 0.0 so both hash alike.
            if !seen.insert(((event.beat + 0.0).to_bits(), event.lane)) {
                return Err(RhythmError::pattern(
                    level,
                    format!(
                        "event {index} duplicates beat {} in lane {}",
                        event.beat, event.lane
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// A playable level: a display name plus its pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub pattern: Pattern,
}

impl Level {
    pub fn new(name: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            name: name.into(),
            pattern,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.pattern.validate(&self.name)
    }
}

/// Ordered, validated set of levels. Index order is unlock order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl LevelTable {
    pub fn new(levels: Vec<Level>) -> Result<Self> {
        if levels.is_empty() {
            return Err(RhythmError::msg("level table is empty"));
        }
        for level in &levels {
            level.validate()?;
        }
        Ok(Self { levels })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let levels: Vec<Level> = serde_json::from_str(json)?;
        Self::new(levels)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The three levels shipped with the game. Same-beat multi-lane events
    /// are avoided by authoring.
    pub fn builtin() -> Self {
        let levels = vec![
            Level::new(
                "Lv1",
                Pattern::from_pairs(
                    92.0,
                    2,
                    &[
                        (0.0, 0),
                        (1.0, 0),
                        (2.0, 1),
                        (3.0, 1),
                        (4.0, 0),
                        (5.0, 1),
                        (6.0, 0),
                        (7.0, 1),
                    ],
                ),
            ),
            Level::new(
                "Lv2",
                Pattern::from_pairs(
                    108.0,
                    3,
                    &[
                        (0.0, 0),
                        (1.0, 1),
                        (2.0, 2),
                        (3.0, 1),
                        (4.0, 0),
                        (5.0, 1),
                        (6.0, 2),
                        (7.0, 1),
                        (8.0, 0),
                        (9.0, 1),
                        (10.0, 2),
                        (11.0, 1),
                    ],
                ),
            ),
            Level::new(
                "Lv3",
                Pattern::from_pairs(
                    122.0,
                    4,
                    &[
                        (0.0, 0),
                        (0.75, 1),
                        (1.5, 2),
                        (2.25, 1),
                        (3.0, 0),
                        (3.75, 1),
                        (4.5, 2),
                        (5.25, 1),
                        (6.0, 2),
                        (6.75, 1),
                        (7.5, 0),
                        (8.25, 1),
                    ],
                ),
            ),
        ];
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Level> {
        self.levels
            .get(index)
            .ok_or(RhythmError::UnknownLevel(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: RhythmError) -> String {
        match err {
            RhythmError::InvalidPattern { reason, .. } => reason,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn builtin_levels_validate() {
        let table = LevelTable::builtin();
        assert_eq!(table.len(), 3);
        for level in table.iter() {
            level.validate().unwrap();
        }
        assert_eq!(table.get(2).unwrap().pattern.lane_count, 4);
    }

    #[test]
    fn rejects_out_of_range_lane() {
        let pattern = Pattern::from_pairs(100.0, 2, &[(0.0, 0), (1.0, 2)]);
        let message = reason(pattern.validate("bad").unwrap_err());
        assert!(message.contains("lane 2"));
    }

    #[test]
    fn rejects_negative_beat_and_bad_tempo() {
        let negative = Pattern::from_pairs(100.0, 2, &[(-1.0, 0)]);
        assert!(negative.validate("bad").is_err());

        let tempo = Pattern::from_pairs(0.0, 2, &[(0.0, 0)]);
        assert!(tempo.validate("bad").is_err());
    }

    #[test]
    fn rejects_beats_and_tempos_past_the_caps() {
        let far_beats = Pattern::from_pairs(100.0, 2, &[(1e20, 0), (2e20, 1)]);
        assert!(reason(far_beats.validate("far").unwrap_err()).contains("beat position"));

        let fast = Pattern::from_pairs(1.0e9, 2, &[(0.0, 0), (1.0, 1)]);
        assert!(reason(fast.validate("fast").unwrap_err()).contains("tempo"));

        assert!(Pattern::from_pairs(f32::INFINITY, 2, &[(0.0, 0)]).validate("x").is_err());
        assert!(Pattern::from_pairs(1.0e-40, 2, &[(0.0, 0)]).validate("x").is_err());
        assert!(Pattern::from_pairs(100.0, 2, &[(f32::NAN, 0)]).validate("x").is_err());
        Pattern::from_pairs(MAX_TEMPO_BPM, 2, &[(0.0, 0), (MAX_BEAT, 1)])
            .validate("edge")
            .unwrap();
    }

    #[test]
    fn rejects_duplicate_events_but_not_shared_beats() {
        let duplicate = Pattern::from_pairs(100.0, 2, &[(1.0, 0), (1.0, 0)]);
        assert!(reason(duplicate.validate("dup").unwrap_err()).contains("duplicates"));

        let shared_beat = Pattern::from_pairs(100.0, 2, &[(1.0, 0), (1.0, 1)]);
        shared_beat.validate("shared").unwrap();
    }

    #[test]
    fn rejects_unsupported_lane_count_and_empty_pattern() {
        assert!(Pattern::from_pairs(100.0, 5, &[(0.0, 0)]).validate("x").is_err());
        assert!(Pattern::from_pairs(100.0, 2, &[]).validate("x").is_err());
    }

    #[test]
    fn loads_table_from_json() {
        let json = r#"[
            { "name": "Warmup", "pattern": { "tempo_bpm": 90.0, "lane_count": 2,
              "events": [ { "beat": 0.0, "lane": 0 }, { "beat": 2.0, "lane": 1 } ] } }
        ]"#;
        let table = LevelTable::from_json_str(json).unwrap();
        assert_eq!(table.get(0).unwrap().name, "Warmup");
        assert!(matches!(table.get(1), Err(RhythmError::UnknownLevel(1))));
    }

    #[test]
    fn json_table_with_invalid_level_fails_to_load() {
        let json = r#"[
            { "name": "Broken", "pattern": { "tempo_bpm": 90.0, "lane_count": 3,
              "events": [ { "beat": 0.0, "lane": 3 } ] } }
        ]"#;
        let err = LevelTable::from_json_str(json).unwrap_err();
        assert!(format!("{err}").contains("Broken"));
    }
}

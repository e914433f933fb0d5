//! Conversion of authored beat patterns into real-time spawn events.
//!
//! Beat positions are quantised onto an integer tick grid before any
//! comparison is made, so collisions are detected exactly. Conflicting events
//! are pushed forward tick by tick until both the tick-domain and the
//! time-domain minimum gaps hold; nothing is ever dropped.

use serde::{Deserialize, Serialize};

use crate::config::{PlayfieldConfig, ScheduleConfig};
use crate::Pattern;

/// Session clock. Frame deltas are clamped before they reach the simulation.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    pub time_seconds: f32,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    /// Advances by `delta` clamped into `[0, max_delta]` and returns the delta
    /// actually applied. Motion and judgment must use that same value.
    pub fn advance(&mut self, delta: f32, max_delta: f32) -> f32 {
        let applied = clamp_frame_dt(delta, max_delta);
        self.time_seconds += applied;
        applied
    }
}

pub fn clamp_frame_dt(delta: f32, max_delta: f32) -> f32 {
    if delta.is_nan() {
        return 0.0;
    }
    delta.clamp(0.0, max_delta)
}

/// When a note must appear so that it reaches the judgment line on its tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnEvent {
    pub spawn_time: f32,
    pub lane: usize,
    /// Resolved position on the tick grid.
    pub tick: i64,
}

#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    config: ScheduleConfig,
    travel_time: f32,
}

impl ScheduleBuilder {
    pub fn new(config: ScheduleConfig, playfield: &PlayfieldConfig) -> Self {
        Self {
            config,
            travel_time: playfield.travel_time(),
        }
    }

    /// Builds the spawn sequence for a validated pattern.
    ///
    /// The output has one event per pattern event, strictly increasing in
    /// spawn time with consecutive spawns at least `min_time_gap` apart.
    /// Events sharing a beat keep their authored order: the first one listed
    /// keeps its tick and later ones are deferred.
    pub fn build(&self, pattern: &Pattern) -> Vec<SpawnEvent> {
        let ticks_per_beat = self.config.ticks_per_beat.max(1);
        let min_tick_gap = i64::from(self.config.min_tick_gap.max(1));
        let tick_seconds = pattern.seconds_per_beat() / ticks_per_beat as f32;

        let mut ordered: Vec<_> = pattern.events.iter().collect();
        // Stable sort so authored order breaks ties.
        ordered.sort_by(|a, b| a.beat.total_cmp(&b.beat));

        let mut schedule = Vec::with_capacity(ordered.len());
        let mut last_tick: Option<i64> = None;
        let mut last_spawn: Option<f32> = None;

        for event in ordered {
            let authored = (event.beat * ticks_per_beat as f32).round() as i64;

            // Ticks only move forward, so staying `min_tick_gap` past the last
            // used tick also rules out reusing any earlier tick.
            let mut tick = match last_tick {
                Some(last) => authored.max(last.saturating_add(min_tick_gap)),
                None => authored,
            };
            let mut spawn_time = self.spawn_time_for(tick, tick_seconds);

            if let Some(previous) = last_spawn {
                tick = tick.max(self.first_tick_after(previous, tick_seconds));
                spawn_time = self.spawn_time_for(tick, tick_seconds);
                // Rounding can leave the closed-form tick a step or two short.
                while spawn_time - previous < self.config.min_time_gap && tick < i64::MAX {
                    tick += 1;
                    spawn_time = self.spawn_time_for(tick, tick_seconds);
                }
            }

            if tick != authored {
                tracing::debug!(
                    beat = event.beat,
                    lane = event.lane,
                    authored,
                    resolved = tick,
                    "deferred note to keep the minimum gap"
                );
            }

            last_tick = Some(tick);
            last_spawn = Some(spawn_time);
            schedule.push(SpawnEvent {
                spawn_time,
                lane: event.lane,
                tick,
            });
        }

        schedule
    }

    /// Smallest tick whose spawn lands `min_time_gap` after `previous`.
    fn first_tick_after(&self, previous: f32, tick_seconds: f32) -> i64 {
        let hit_time = f64::from(previous)
            + f64::from(self.config.min_time_gap)
            + f64::from(self.travel_time);
        // `as` saturates, so an out-of-range quotient cannot wrap.
        (hit_time / f64::from(tick_seconds)).ceil() as i64
    }

    fn spawn_time_for(&self, tick: i64, tick_seconds: f32) -> f32 {
        let hit_time = tick as f32 * tick_seconds;
        (hit_time - self.travel_time).max(0.0)
    }
}

/// Pending spawns, consumed in order as session time passes.
#[derive(Debug, Default, Clone)]
pub struct SpawnQueue {
    events: Vec<SpawnEvent>,
    next_event: usize,
}

impl SpawnQueue {
    pub fn new(events: Vec<SpawnEvent>) -> Self {
        Self {
            events,
            next_event: 0,
        }
    }

    /// Pops the head if it is due at `elapsed`.
    pub fn pop_due(&mut self, elapsed: f32) -> Option<SpawnEvent> {
        let event = *self.events.get(self.next_event)?;
        if event.spawn_time <= elapsed {
            self.next_event += 1;
            Some(event)
        } else {
            None
        }
    }

    pub fn pending(&self) -> &[SpawnEvent] {
        &self.events[self.next_event..]
    }

    pub fn is_empty(&self) -> bool {
        self.next_event >= self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len() - self.next_event
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::EngineConfig;
    use crate::PatternEvent;

    fn builder() -> ScheduleBuilder {
        let config = EngineConfig::default();
        ScheduleBuilder::new(config.schedule, &config.playfield)
    }

    fn assert_well_formed(schedule: &[SpawnEvent], min_gap: f32) {
        for pair in schedule.windows(2) {
            assert!(pair[1].spawn_time > pair[0].spawn_time);
            assert!(pair[1].spawn_time - pair[0].spawn_time >= min_gap);
            assert!(pair[1].tick > pair[0].tick);
        }
    }

    #[test]
    fn first_level_spacing_respects_gap() {
        let pattern = Pattern::from_pairs(92.0, 2, &[(0.0, 0), (1.0, 0)]);
        let schedule = builder().build(&pattern);

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].spawn_time, 0.0);
        assert_eq!(schedule[0].tick, 0);
        // Beat 1 would spawn before zero; it is pushed out to tick 43.
        assert_eq!(schedule[1].tick, 43);
        assert!(schedule[1].spawn_time >= 0.5);
    }

    #[test]
    fn near_simultaneous_events_move_to_next_free_tick() {
        let playfield = PlayfieldConfig::default();
        let config = ScheduleConfig {
            min_time_gap: 0.001,
            ..ScheduleConfig::default()
        };
        let builder = ScheduleBuilder::new(config, &playfield);
        // Late enough that neither spawn is clamped to zero.
        let pattern = Pattern::from_pairs(120.0, 2, &[(10.0, 0), (10.01, 0)]);
        let schedule = builder.build(&pattern);

        assert_eq!(schedule[0].tick, 80);
        assert_eq!(schedule[1].tick, 81);
        assert!(schedule[1].spawn_time - schedule[0].spawn_time >= 0.001);
    }

    #[test]
    fn near_simultaneous_events_honour_time_gap() {
        let pattern = Pattern::from_pairs(92.0, 2, &[(0.0, 0), (0.01, 0)]);
        let schedule = builder().build(&pattern);

        assert_eq!(schedule.len(), 2);
        assert!(schedule[1].tick >= schedule[0].tick + 1);
        assert!(schedule[1].spawn_time - schedule[0].spawn_time >= 0.5);
    }

    #[test]
    fn ties_keep_authored_order() {
        let pattern = Pattern::from_pairs(100.0, 3, &[(8.0, 2), (8.0, 0), (8.0, 1)]);
        let schedule = builder().build(&pattern);

        let lanes: Vec<_> = schedule.iter().map(|event| event.lane).collect();
        assert_eq!(lanes, vec![2, 0, 1]);
        assert_eq!(schedule[0].tick, 64);
    }

    #[test]
    fn unsorted_input_is_ordered_by_beat() {
        let pattern = Pattern::new(
            100.0,
            2,
            vec![PatternEvent::new(12.0, 1), PatternEvent::new(6.0, 0)],
        );
        let schedule = builder().build(&pattern);
        assert_eq!(schedule[0].lane, 0);
        assert_eq!(schedule[1].lane, 1);
    }

    #[test]
    fn queue_releases_events_once_due() {
        let mut queue = SpawnQueue::new(vec![
            SpawnEvent { spawn_time: 0.0, lane: 0, tick: 0 },
            SpawnEvent { spawn_time: 1.0, lane: 1, tick: 8 },
        ]);

        assert_eq!(queue.pop_due(0.0).map(|event| event.lane), Some(0));
        assert!(queue.pop_due(0.5).is_none());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_due(1.0).map(|event| event.lane), Some(1));
        assert!(queue.is_empty());
        assert!(queue.pop_due(5.0).is_none());
    }

    #[test]
    fn clock_clamps_long_and_negative_frames() {
        let mut clock = PlaybackClock::default();
        assert_eq!(clock.advance(1.0, 0.05), 0.05);
        assert_eq!(clock.advance(-0.2, 0.05), 0.0);
        assert_eq!(clock.advance(f32::NAN, 0.05), 0.0);
        assert!((clock.time_seconds - 0.05).abs() < f32::EPSILON);
        clock.reset();
        assert_eq!(clock.time_seconds, 0.0);
    }

    #[test]
    fn fastest_tempo_defers_in_one_step() {
        // At the tempo cap a tick is 7.5 ms, so the gap spans dozens of ticks.
        let pattern = Pattern::from_pairs(
            crate::pattern::MAX_TEMPO_BPM,
            2,
            &[(0.0, 0), (1.0, 1), (2.0, 0)],
        );
        pattern.validate("fast").unwrap();
        let schedule = builder().build(&pattern);

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[0].tick, 0);
        // (0.5 + 3.0) / 0.0075 rounds up to 467.
        assert_eq!(schedule[1].tick, 467);
        assert_well_formed(&schedule, 0.5);
    }

    #[test]
    fn latest_beat_at_slowest_tempo_stays_in_range() {
        let pattern = Pattern::from_pairs(
            crate::pattern::MIN_TEMPO_BPM,
            2,
            &[(0.0, 0), (crate::pattern::MAX_BEAT, 1)],
        );
        pattern.validate("slow").unwrap();
        let schedule = builder().build(&pattern);

        assert_eq!(schedule[1].tick, 800_000);
        assert_well_formed(&schedule, 0.5);
    }

    #[test]
    fn finest_grid_keeps_gaps_on_long_patterns() {
        let playfield = PlayfieldConfig::default();
        let config = ScheduleConfig {
            ticks_per_beat: crate::config::MAX_TICKS_PER_BEAT,
            ..ScheduleConfig::default()
        };
        let builder = ScheduleBuilder::new(config, &playfield);
        let pairs: Vec<_> = (0..200).map(|i| (i as f32 * 0.01, i % 2)).collect();
        let pattern = Pattern::from_pairs(crate::pattern::MAX_TEMPO_BPM, 2, &pairs);
        let schedule = builder.build(&pattern);

        assert_eq!(schedule.len(), 200);
        assert_well_formed(&schedule, 0.5);
    }

    fn arb_pattern() -> impl Strategy<Value = Pattern> {
        (40.0f32..240.0, 2usize..=4).prop_flat_map(|(bpm, lanes)| {
            prop::collection::vec((0u32..256, 0..lanes), 1..40).prop_map(move |raw| {
                let events = raw
                    .into_iter()
                    .map(|(quarter_beats, lane)| PatternEvent::new(quarter_beats as f32 * 0.25, lane))
                    .collect();
                Pattern::new(bpm, lanes, events)
            })
        })
    }

    proptest! {
        #[test]
        fn schedule_is_ordered_gapped_and_complete(pattern in arb_pattern()) {
            let schedule = builder().build(&pattern);
            prop_assert_eq!(schedule.len(), pattern.events.len());
            for pair in schedule.windows(2) {
                prop_assert!(pair[1].spawn_time - pair[0].spawn_time >= 0.5);
            }

            let mut expected: Vec<_> = pattern.events.iter().map(|event| event.lane).collect();
            let mut actual: Vec<_> = schedule.iter().map(|event| event.lane).collect();
            expected.sort_unstable();
            actual.sort_unstable();
            prop_assert_eq!(expected, actual);
        }
    }

    #[test]
    fn builtin_levels_are_well_formed() {
        for level in crate::LevelTable::builtin().iter() {
            let schedule = builder().build(&level.pattern);
            assert_eq!(schedule.len(), level.pattern.events.len());
            assert_well_formed(&schedule, 0.5);
        }
    }
}

//! Live-note simulation: spawning, motion, hit/miss judgment and cleanup.

use serde::{Deserialize, Serialize};

use crate::config::PlayfieldConfig;
use crate::judgment::{FrameJudgments, HitJudgment};
use crate::schedule::{SpawnEvent, SpawnQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteState {
    Approaching,
    Hit,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub position_x: f32,
    pub lane: usize,
    pub state: NoteState,
}

impl Note {
    pub fn is_judgeable(&self) -> bool {
        self.state == NoteState::Approaching
    }
}

/// Owns the pending spawn queue and the live notes of one session.
#[derive(Debug, Clone)]
pub struct NoteField {
    playfield: PlayfieldConfig,
    pending: SpawnQueue,
    live: Vec<Note>,
}

impl NoteField {
    pub fn new(playfield: PlayfieldConfig, schedule: Vec<SpawnEvent>) -> Self {
        Self {
            playfield,
            pending: SpawnQueue::new(schedule),
            live: Vec::new(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.live
    }

    pub fn pending(&self) -> &SpawnQueue {
        &self.pending
    }

    /// True once every scheduled note has been spawned and removed.
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.live.is_empty()
    }

    /// Runs one frame. `dt` must already be clamped and must be the same delta
    /// that advanced `elapsed`.
    pub fn advance(&mut self, dt: f32, elapsed: f32, actor_lane: usize) -> FrameJudgments {
        let mut judgments = FrameJudgments::default();
        self.advance_into(dt, elapsed, actor_lane, &mut judgments);
        judgments
    }

    /// Like [`NoteField::advance`] but appends into a caller-owned buffer.
    pub fn advance_into(
        &mut self,
        dt: f32,
        elapsed: f32,
        actor_lane: usize,
        judgments: &mut FrameJudgments,
    ) {
        let p = &self.playfield;

        while let Some(event) = self.pending.pop_due(elapsed) {
            self.live.push(Note {
                position_x: p.spawn_x,
                lane: event.lane,
                state: NoteState::Approaching,
            });
        }

        let miss_line = p.judgment_x - p.hit_window;
        for note in &mut self.live {
            note.position_x -= p.note_speed * dt;

            // The state guard keeps each note to a single terminal judgment.
            if note.state != NoteState::Approaching {
                continue;
            }
            if note.position_x < miss_line {
                note.state = NoteState::Missed;
                judgments.misses.push(note.lane);
            } else if note.lane == actor_lane
                && (note.position_x - p.judgment_x).abs() <= p.hit_window
            {
                note.state = NoteState::Hit;
                let offset = (note.position_x - p.judgment_x) / p.note_speed;
                judgments.hits.push(HitJudgment::new(note.lane, offset));
            }
        }

        self.compact();
    }

    fn compact(&mut self) {
        let p = &self.playfield;
        let hit_exit = p.judgment_x - p.hit_linger;

        let mut index = 0;
        while index < self.live.len() {
            let note = self.live[index];
            let expired = note.position_x <= p.despawn_x
                || (note.state == NoteState::Hit && note.position_x < hit_exit);
            if expired {
                self.live.swap_remove(index);
            } else {
                index += 1;
            }
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// Discrete events for the audio collaborator. The engine never waits on them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AudioCue {
    Hit { lane: usize },
    Miss,
    LevelStart { bpm: f32 },
    LevelEnd,
}

/// Implemented by whatever turns cues into sound. Mute is read from `settings`.
pub trait CueDispatcher {
    fn dispatch(&mut self, cue: &AudioCue, settings: &Settings);
}

/// Cues emitted during the most recent frame.
#[derive(Debug, Default, Clone)]
pub struct CueBuffer {
    cues: Vec<AudioCue>,
}

impl CueBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }

    pub fn cues(&self) -> &[AudioCue] {
        &self.cues
    }

    pub fn push(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }

    pub fn dispatch_to(&self, dispatcher: &mut dyn CueDispatcher, settings: &Settings) {
        for cue in &self.cues {
            dispatcher.dispatch(cue, settings);
        }
    }
}

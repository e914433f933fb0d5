use serde::{Deserialize, Serialize};

/// The duck: one lane at a time, plus a short feeding animation after a hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duck {
    lane: usize,
    lane_count: usize,
    feeding_timer: f32,
    feeding_time: f32,
}

impl Duck {
    /// Starts on lane 1, or lane 0 when the track has a single lane.
    pub fn new(lane_count: usize, feeding_time: f32) -> Self {
        let lane_count = lane_count.max(1);
        Self {
            lane: 1.min(lane_count - 1),
            lane_count,
            feeding_timer: 0.0,
            feeding_time,
        }
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn feeding_timer(&self) -> f32 {
        self.feeding_timer
    }

    pub fn is_feeding(&self) -> bool {
        self.feeding_timer > 0.0
    }

    /// Moves one lane towards lane 0. No-op at the top.
    pub fn move_up(&mut self) {
        self.lane = self.lane.saturating_sub(1);
    }

    /// Moves one lane towards the last lane. No-op at the bottom.
    pub fn move_down(&mut self) {
        if self.lane + 1 < self.lane_count {
            self.lane += 1;
        }
    }

    pub fn on_hit(&mut self) {
        self.feeding_timer = self.feeding_time;
    }

    pub fn tick(&mut self, dt: f32) {
        self.feeding_timer = (self.feeding_timer - dt).max(0.0);
    }
}

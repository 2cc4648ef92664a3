// Fixed-step frame clock for the headless driver
//
// Each frame feeds in how long it took; the clock answers with the number of
// fixed simulation ticks to run so the world always advances by the same dt.

use std::time::{Duration, Instant};

/// Simulation tick length in seconds
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
pub const FIXED_TIMESTEP_DURATION: Duration = Duration::from_micros(16_667);

/// Ticks allowed per frame; a slower backlog is dropped
const MAX_TICKS_PER_FRAME: u32 = 5;

pub struct FrameClock {
    /// Frame time not yet turned into ticks
    backlog: Duration,
    last_frame: Instant,
    /// Sum of every frame time fed in
    total_time: Duration,
    frame_count: u64,
    update_count: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            backlog: Duration::ZERO,
            last_frame: Instant::now(),
            total_time: Duration::ZERO,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Measure the frame against the wall clock and return the ticks to run
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(frame_time)
    }

    /// Feed a frame of known length and return the ticks to run
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        self.frame_count += 1;
        self.total_time += frame_time;
        self.backlog += frame_time;

        let ready = self.backlog.as_nanos() / FIXED_TIMESTEP_DURATION.as_nanos();
        let ticks = u32::try_from(ready)
            .unwrap_or(u32::MAX)
            .min(MAX_TICKS_PER_FRAME);
        self.backlog -= FIXED_TIMESTEP_DURATION * ticks;
        if ticks == MAX_TICKS_PER_FRAME {
            self.backlog = self.backlog.min(FIXED_TIMESTEP_DURATION);
        }

        self.update_count += u64::from(ticks);
        ticks
    }

    pub fn fixed_timestep(&self) -> f32 {
        FIXED_TIMESTEP
    }

    /// Average frames per second over the whole run
    pub fn fps(&self) -> f32 {
        let secs = self.total_time.as_secs_f32();
        if secs > 0.0 {
            self.frame_count as f32 / secs
        } else {
            0.0
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

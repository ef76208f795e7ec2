use std::time::Duration;

/// Frame-fed clock owned by a single attached instance.
///
/// Unlike a wall-clock timer it only advances when the frame loop ticks it, so
/// an instance that is not attached does not accumulate time.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    /// Time since last tick
    pub delta: Duration,
    /// Total elapsed time since creation
    pub elapsed: Duration,
    /// Total number of ticks
    pub frame_count: u64,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `dt` seconds. Negative values are ignored.
    pub fn tick(&mut self, dt: f32) {
        self.delta = Duration::from_secs_f32(dt.max(0.0));
        self.elapsed += self.delta;
        self.frame_count += 1;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

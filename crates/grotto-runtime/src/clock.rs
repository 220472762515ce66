use crate::config::Clock;

/// Fixed-rate tick accumulator fed with wall-clock frame times.
#[derive(Clone, Debug)]
pub struct FixedStep {
    tick_ms: f64,
    max_frame_ms: f64,
    accumulator: f64,
}

impl FixedStep {
    pub fn new(cfg: &Clock) -> Self {
        Self {
            tick_ms: cfg.tick_ms.max(f64::EPSILON),
            max_frame_ms: if cfg.max_frame_ms.is_nan() { 0.0 } else { cfg.max_frame_ms },
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn tick_ms(&self) -> f64 {
        self.tick_ms
    }

    #[inline]
    pub fn tick_seconds(&self) -> f32 {
        (self.tick_ms / 1000.0) as f32
    }

    /// Adds one frame (clamped) and returns how many ticks are due.
    /// A remainder of exactly one tick is carried to the next frame.
    /// Non-finite frame times are dropped.
    pub fn advance(&mut self, frame_ms: f64) -> u32 {
        if !frame_ms.is_finite() {
            return 0;
        }
        self.accumulator += frame_ms.min(self.max_frame_ms).max(0.0);
        let mut ticks = 0;
        while self.accumulator - self.tick_ms > 0.0 {
            self.accumulator -= self.tick_ms;
            ticks += 1;
        }
        ticks
    }
}

/// Mean of the last `window` samples.
#[derive(Clone, Debug)]
pub struct RollingAverage {
    buffer: Vec<f64>,
    capacity: usize,
    index: usize,
}

impl RollingAverage {
    pub fn new(window: usize) -> Self {
        let capacity = window.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            index: 0,
        }
    }

    pub fn add(&mut self, x: f64) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(x);
        } else {
            self.buffer[self.index] = x;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    /// `None` before the first sample.
    pub fn average(&self) -> Option<f64> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.buffer.iter().sum::<f64>() / self.buffer.len() as f64)
    }
}

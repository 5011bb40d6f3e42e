use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Outcome of one invocation of a repeating frame task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The task wants to run again on the next display frame.
    Scheduled,
    /// The task was cancelled and did no work.
    Cancelled,
}

/// Cancels a repeating task. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    cancelled: Arc<AtomicBool>,
}

impl StopHandle {
    /// Creates a handle that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the task. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the task has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Display frame timestamps for hosts that drive the loop themselves.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_seconds: f64,
    frames: u64,
}

impl FrameClock {
    /// Creates a clock ticking `frames_per_second` times a second.
    pub fn new(frames_per_second: u32) -> Self {
        Self {
            frame_seconds: 1.0 / f64::from(frames_per_second.max(1)),
            frames: 0,
        }
    }

    /// Returns the length of one frame in seconds.
    pub fn frame_seconds(&self) -> f64 {
        self.frame_seconds
    }

    /// Returns the number of frames elapsed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns the time elapsed in seconds.
    pub fn time_seconds(&self) -> f64 {
        self.frames as f64 * self.frame_seconds
    }

    /// Advances one frame and returns the new timestamp.
    pub fn advance(&mut self) -> f64 {
        self.frames += 1;
        self.time_seconds()
    }

    /// Rewinds the clock to frame zero.
    pub fn reset(&mut self) {
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_cancellation() {
        let handle = StopHandle::new();
        let shared = handle.clone();
        assert!(!shared.is_cancelled());

        handle.cancel();
        assert!(shared.is_cancelled());
    }

    #[test]
    fn clock_advances_in_whole_frames() {
        let mut clock = FrameClock::new(50);
        clock.advance();
        let t = clock.advance();
        assert!((t - 0.04).abs() < 1e-12);
        assert_eq!(clock.frames(), 2);

        clock.reset();
        assert_eq!(clock.time_seconds(), 0.0);
    }
}

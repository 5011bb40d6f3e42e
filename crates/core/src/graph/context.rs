use crate::{Result, WidgetError};

/// Processing state of an [`AudioContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// Host audio subsystem. Starts suspended until a user gesture resumes it;
/// only a running context moves audio through the graph.
#[derive(Debug, Clone)]
pub struct AudioContext {
    sample_rate: u32,
    state: ContextState,
}

impl AudioContext {
    /// Creates a suspended context running at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: ContextState::Suspended,
        }
    }

    /// Returns the sample rate of the context.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the current processing state.
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Whether audio is currently being processed.
    pub fn is_running(&self) -> bool {
        self.state == ContextState::Running
    }

    /// Starts processing. Fails once the context is closed.
    pub fn resume(&mut self) -> Result<()> {
        self.transition(ContextState::Running)
    }

    /// Stops processing without releasing anything. Fails once the context is
    /// closed.
    pub fn suspend(&mut self) -> Result<()> {
        self.transition(ContextState::Suspended)
    }

    /// Closes the context for good. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.state = ContextState::Closed;
    }

    fn transition(&mut self, next: ContextState) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(WidgetError::ContextClosed);
        }
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "audio context state change");
            self.state = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_and_suspend_until_closed() {
        let mut context = AudioContext::new(48_000);
        assert_eq!(context.state(), ContextState::Suspended);

        context.resume().unwrap();
        assert!(context.is_running());
        context.resume().unwrap();
        context.suspend().unwrap();
        assert_eq!(context.state(), ContextState::Suspended);

        context.close();
        assert!(matches!(context.resume(), Err(WidgetError::ContextClosed)));
    }
}

// Bounded polling for screens that should eventually appear
use crate::error::{BotError, BotResult};
use tokio::time::{Duration, sleep};

/// Attempt counter for a wait that must not spin forever.
///
/// Call [`BoundedPoll::miss`] after every attempt that did not find what it
/// was waiting for. Once the attempts are used up it returns
/// [`BotError::StuckState`] naming the state that never changed.
#[derive(Debug)]
pub struct BoundedPoll {
    state: String,
    max_attempts: u32,
    delay: Duration,
    attempts: u32,
}

impl BoundedPoll {
    pub fn new(state: impl Into<String>, max_attempts: u32, delay: Duration) -> Self {
        Self {
            state: state.into(),
            max_attempts: max_attempts.max(1),
            delay,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub async fn miss(&mut self) -> BotResult<()> {
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            log::warn!(
                "⏳ Gave up waiting in '{}' after {} attempts",
                self.state,
                self.attempts
            );
            return Err(BotError::StuckState {
                state: self.state.clone(),
                attempts: self.attempts,
            });
        }
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        Ok(())
    }
}

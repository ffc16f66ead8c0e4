//! Reconnect policy: bounded retries with a fixed delay, then terminal fallback.
//!
//! Pure state machine; it owns no timers. The channel performs the sleep it
//! is told to, so tearing the channel down cancels any pending retry.

use std::time::Duration;

pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    /// Channel open or connecting normally.
    Active,
    /// Waiting out the delay before retry number `n`.
    Retrying(u32),
    /// Realtime abandoned for this instance; REST fallback took over.
    FallenBack,
}

/// What the channel should do after an unexpected close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Sleep `delay`, then attempt reconnect number `attempt`.
    Retry { attempt: u32, delay: Duration },
    /// Budget exhausted: fetch once over REST, then stop. Returned exactly once.
    FallBack,
    /// Already fallen back; nothing left to do.
    Halt,
}

#[derive(Debug)]
pub struct ReconnectPolicy {
    state: PolicyState,
    max_attempts: u32,
    delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            state: PolicyState::Active,
            max_attempts,
            delay,
        }
    }

    pub fn state(&self) -> PolicyState {
        self.state
    }

    pub fn is_fallen_back(&self) -> bool {
        self.state == PolicyState::FallenBack
    }

    /// A connection opened successfully: zero the budget, back to `Active`.
    /// `FallenBack` is terminal and stays terminal.
    pub fn on_open(&mut self) {
        if self.state != PolicyState::FallenBack {
            self.state = PolicyState::Active;
        }
    }

    /// An unexpected close (or failed open). Exactly one decision per close.
    pub fn on_close(&mut self) -> CloseDecision {
        match self.state {
            PolicyState::FallenBack => CloseDecision::Halt,
            PolicyState::Active => {
                self.state = PolicyState::Retrying(1);
                CloseDecision::Retry { attempt: 1, delay: self.delay }
            }
            PolicyState::Retrying(n) if n < self.max_attempts => {
                self.state = PolicyState::Retrying(n + 1);
                CloseDecision::Retry { attempt: n + 1, delay: self.delay }
            }
            PolicyState::Retrying(_) => {
                self.state = PolicyState::FallenBack;
                CloseDecision::FallBack
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_one_retry_per_close_with_fixed_delay() {
        let mut policy = ReconnectPolicy::default();
        for expected in 1..=MAX_RECONNECT_ATTEMPTS {
            match policy.on_close() {
                CloseDecision::Retry { attempt, delay } => {
                    assert_eq!(attempt, expected);
                    assert_eq!(delay, RECONNECT_DELAY);
                }
                other => panic!("close {} gave {:?}", expected, other),
            }
            assert_eq!(policy.state(), PolicyState::Retrying(expected));
        }
    }

    #[test]
    fn exhausted_budget_falls_back_exactly_once() {
        let mut policy = ReconnectPolicy::default();
        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            assert!(matches!(policy.on_close(), CloseDecision::Retry { .. }));
        }
        assert_eq!(policy.on_close(), CloseDecision::FallBack);
        assert!(policy.is_fallen_back());

        // Terminal: every later close is a no-op.
        assert_eq!(policy.on_close(), CloseDecision::Halt);
        assert_eq!(policy.on_close(), CloseDecision::Halt);
    }

    #[test]
    fn successful_open_resets_the_counter() {
        let mut policy = ReconnectPolicy::default();
        policy.on_close();
        policy.on_close();
        assert_eq!(policy.state(), PolicyState::Retrying(2));

        policy.on_open();
        assert_eq!(policy.state(), PolicyState::Active);

        // Budget starts over after the reset.
        assert_eq!(
            policy.on_close(),
            CloseDecision::Retry { attempt: 1, delay: RECONNECT_DELAY }
        );
    }

    #[test]
    fn open_after_fallback_stays_terminal() {
        let mut policy = ReconnectPolicy::new(1, Duration::from_millis(1));
        policy.on_close();
        assert_eq!(policy.on_close(), CloseDecision::FallBack);

        policy.on_open();
        assert!(policy.is_fallen_back());
        assert_eq!(policy.on_close(), CloseDecision::Halt);
    }
}

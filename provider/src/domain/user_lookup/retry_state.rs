//! Call-scoped attempt accounting for one user lookup.
//!
//! Every round-trip counts against the budget. A rate-limit signal extends the
//! budget by one, so the throttled round-trip is refunded rather than charged,
//! and extensions stop once the configured cap is reached.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct RetryState {
    attempts_used: u32,
    attempt_budget: u32,
    grace_extensions: u32,
    max_grace_extensions: u32,
}

impl RetryState {
    pub(super) fn new(attempt_budget: u32, max_grace_extensions: u32) -> Self {
        Self {
            attempts_used: 0,
            attempt_budget: attempt_budget.max(1),
            grace_extensions: 0,
            max_grace_extensions,
        }
    }

    pub(super) fn has_remaining_attempts(&self) -> bool {
        self.attempts_used < self.attempt_budget
    }

    /// Charge one round-trip and return its 1-based attempt number.
    pub(super) fn begin_attempt(&mut self) -> u32 {
        self.attempts_used = self.attempts_used.saturating_add(1);
        self.attempts_used
    }

    /// Extend the budget by one attempt; `false` once the cap is used up.
    pub(super) fn grant_grace(&mut self) -> bool {
        if self.grace_extensions >= self.max_grace_extensions {
            return false;
        }
        self.grace_extensions += 1;
        self.attempt_budget = self.attempt_budget.saturating_add(1);
        true
    }

    pub(super) fn grace_extensions(&self) -> u32 {
        self.grace_extensions
    }

    pub(super) fn rate_limit_grace_granted(&self) -> bool {
        self.grace_extensions > 0
    }

    pub(super) fn attempts_used(&self) -> u32 {
        self.attempts_used
    }
}

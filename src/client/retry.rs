//! Retry state machine for authenticated report calls.
//!
//! The machine is pure: it never sleeps, refreshes or performs I/O. The
//! client reads [`RetryMachine::state`], performs the side effect the state
//! asks for, and reports back via [`RetryMachine::observe`] or
//! [`RetryMachine::resume`].
//!
//! ```text
//! Attempting --200--> Succeeded
//! Attempting --401--> RefreshingAuth --resume--> Attempting | Exhausted
//! Attempting --other--> Backoff(d) --resume--> Attempting | Exhausted
//! ```

use reqwest::StatusCode;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total number of requests, including the first.
    pub max_attempts: u32,
    /// Delay after the first rate-limited or failed attempt.
    pub initial_backoff: Duration,
    /// Factor applied to the delay after each backoff.
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Issue the next request.
    Attempting,
    /// The access token was rejected; refresh it before the next attempt.
    RefreshingAuth,
    /// Wait this long before the next attempt.
    Backoff(Duration),
    Succeeded,
    Exhausted,
}

#[derive(Debug)]
pub struct RetryMachine {
    policy: RetryPolicy,
    attempts: u32,
    next_backoff: Duration,
    state: RetryState,
}

impl RetryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        let state = if policy.max_attempts == 0 {
            RetryState::Exhausted
        } else {
            RetryState::Attempting
        };

        Self {
            next_backoff: policy.initial_backoff,
            policy,
            attempts: 0,
            state,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Requests issued so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record the status of the request just issued. Ignored outside `Attempting`.
    pub fn observe(&mut self, status: StatusCode) -> RetryState {
        if self.state != RetryState::Attempting {
            return self.state;
        }

        self.attempts += 1;
        self.state = match status {
            StatusCode::OK => RetryState::Succeeded,
            StatusCode::UNAUTHORIZED => RetryState::RefreshingAuth,
            _ => {
                let delay = self.next_backoff;
                self.next_backoff = delay.saturating_mul(self.policy.backoff_multiplier);
                RetryState::Backoff(delay)
            }
        };
        self.state
    }

    /// Leave `RefreshingAuth` or `Backoff` once the refresh or sleep is done.
    pub fn resume(&mut self) -> RetryState {
        if !matches!(self.state, RetryState::RefreshingAuth | RetryState::Backoff(_)) {
            return self.state;
        }

        self.state = if self.attempts >= self.policy.max_attempts {
            RetryState::Exhausted
        } else {
            RetryState::Attempting
        };
        self.state
    }
}

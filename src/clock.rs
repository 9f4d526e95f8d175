//! Time sources injected into the token manager and API client.
//!
//! Production code uses [`SystemClock`] and [`TokioSleeper`]; tests swap in
//! fixed clocks and sleepers that only record the requested delay.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Wall-clock time used for token expiry and report dates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Suspends the current task between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

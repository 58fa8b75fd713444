//! Accept failure damping.
//!
//! The accept loop retries immediately and carries no policy; under
//! sustained failure (file-descriptor exhaustion, for instance) that
//! is a tight spin. [`BackoffAccept`] is the opt-in caller policy: it
//! wraps any listening endpoint and delays each attempt that follows
//! a failure, exponentially and with jitter, resetting on success.

use std::time::Duration;

use rand::Rng;

use crate::net::accept::Accept;

/// Listening-endpoint decorator that damps repeated accept failures.
pub struct BackoffAccept<L> {
    inner: L,
    base_ms: u64,
    max_ms: u64,
    failures: u32,
}

impl<L> BackoffAccept<L> {
    /// Wrap `inner`, delaying post-failure retries between `base_ms`
    /// and `max_ms` milliseconds.
    pub fn new(inner: L, base_ms: u64, max_ms: u64) -> Self {
        Self {
            inner,
            base_ms,
            max_ms,
            failures: 0,
        }
    }

    /// Consecutive failures observed since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay before the next attempt: zero after a success, otherwise
    /// base * 2^(failures - 1) capped at max, plus up to 10% jitter.
    fn delay(&self) -> Duration {
        if self.failures == 0 {
            return Duration::ZERO;
        }

        let exponential = 2u64.saturating_pow(self.failures - 1);
        let capped = self.base_ms.saturating_mul(exponential).min(self.max_ms);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }
}

impl<L: Accept> Accept for BackoffAccept<L> {
    type Conn = L::Conn;
    type Error = L::Error;

    async fn accept(&mut self, conn: &mut L::Conn) -> Result<(), L::Error> {
        let delay = self.delay();
        if !delay.is_zero() {
            tracing::debug!(
                failures = self.failures,
                delay_ms = delay.as_millis() as u64,
                "Backing off before accept retry"
            );
            tokio::time::sleep(delay).await;
        }

        let outcome = self.inner.accept(conn).await;
        match outcome {
            Ok(()) => self.failures = 0,
            Err(_) => self.failures = self.failures.saturating_add(1),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    struct Scripted {
        outcomes: VecDeque<Result<(), &'static str>>,
    }

    impl Accept for Scripted {
        type Conn = ();
        type Error = &'static str;

        async fn accept(&mut self, _conn: &mut ()) -> Result<(), &'static str> {
            self.outcomes.pop_front().unwrap_or(Err("script exhausted"))
        }
    }

    async fn timed_accept(listener: &mut BackoffAccept<Scripted>) -> Duration {
        let start = Instant::now();
        let _ = listener.accept(&mut ()).await;
        start.elapsed()
    }

    #[tokio::test(start_paused = true)]
    async fn failures_grow_the_delay_and_success_resets_it() {
        let inner = Scripted {
            outcomes: [Err("full"), Err("full"), Ok(()), Ok(())].into(),
        };
        let mut listener = BackoffAccept::new(inner, 100, 2_000);

        // First attempt goes straight through.
        assert_eq!(timed_accept(&mut listener).await, Duration::ZERO);
        assert_eq!(listener.failures(), 1);

        // One failure: base delay plus at most 10% jitter.
        let second = timed_accept(&mut listener).await;
        assert!(second >= Duration::from_millis(100));
        assert!(second < Duration::from_millis(111));
        assert_eq!(listener.failures(), 2);

        // Two failures double the base; this attempt succeeds.
        let third = timed_accept(&mut listener).await;
        assert!(third >= Duration::from_millis(200));
        assert!(third < Duration::from_millis(221));
        assert_eq!(listener.failures(), 0);

        // Success resets: next attempt is immediate again.
        assert_eq!(timed_accept(&mut listener).await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_capped_at_max() {
        let inner = Scripted {
            outcomes: VecDeque::from(vec![Err("full"); 20]),
        };
        let mut listener = BackoffAccept::new(inner, 100, 1_000);

        for _ in 0..10 {
            let _ = listener.accept(&mut ()).await;
        }

        let capped = timed_accept(&mut listener).await;
        assert!(capped >= Duration::from_millis(1_000));
        assert!(capped < Duration::from_millis(1_101));
    }
}

//! Exponential backoff with jitter.
//!
//! Used by the ingest pipeline (`logaggr-ingest`) to retry a *transient* relational
//! or search-store failure a bounded number of times before giving up
//! and routing the record to the DLQ — validation and constraint
//! failures are not transient and skip this path entirely.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]

use std::ops::ControlFlow;
use std::time::Duration;

use rand::prelude::*;

/// Backoff parameters.
///
/// See <https://aws.amazon.com/blogs/architecture/exponential-backoff-and-jitter/>.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub init_backoff: Duration,
    pub max_backoff: Duration,
    pub base: f64,
    /// Give up (return the last error) after this many attempts.
    pub max_retries: usize,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            init_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            base: 2.0,
            max_retries: 3,
        }
    }
}

/// Stateful backoff sequence generator.
pub struct Backoff {
    init_backoff: f64,
    next_backoff_secs: f64,
    max_backoff_secs: f64,
    base: f64,
    max_retries: usize,
    attempt: usize,
    rng: Option<Box<dyn RngCore + Send + Sync>>,
}

impl std::fmt::Debug for Backoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backoff")
            .field("next_backoff_secs", &self.next_backoff_secs)
            .field("attempt", &self.attempt)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Backoff {
    pub fn new(config: &BackoffConfig) -> Self {
        Self::new_with_rng(config, None)
    }

    pub fn new_with_rng(config: &BackoffConfig, rng: Option<Box<dyn RngCore + Send + Sync>>) -> Self {
        Self {
            init_backoff: config.init_backoff.as_secs_f64(),
            next_backoff_secs: config.init_backoff.as_secs_f64(),
            max_backoff_secs: config.max_backoff.as_secs_f64(),
            base: config.base,
            max_retries: config.max_retries,
            attempt: 0,
            rng,
        }
    }

    /// Sleep for the next backoff interval (full jitter), then advance
    /// the interval. Returns `ControlFlow::Break(())` once `max_retries`
    /// attempts have been consumed, so callers can stop retrying.
    pub async fn next(&mut self) -> ControlFlow<()> {
        if self.attempt >= self.max_retries {
            return ControlFlow::Break(());
        }
        self.attempt += 1;

        let jittered = if self.next_backoff_secs <= 0.0 {
            0.0
        } else {
            match self.rng.as_mut() {
                Some(rng) => rng.gen_range(0.0..self.next_backoff_secs),
                None => thread_rng().gen_range(0.0..self.next_backoff_secs),
            }
        };

        tokio::time::sleep(Duration::from_secs_f64(jittered)).await;

        self.next_backoff_secs = (self.next_backoff_secs * self.base)
            .min(self.max_backoff_secs)
            .max(self.init_backoff);

        ControlFlow::Continue(())
    }

    pub fn attempt(&self) -> usize {
        self.attempt
    }
}

/// Retry `f` until it succeeds or the backoff budget is exhausted,
/// returning the last error if retries are exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(config: &BackoffConfig, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut backoff = Backoff::new(config);
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                tracing::warn!(attempt = backoff.attempt(), "transient store error, retrying");
                if backoff.next().await.is_break() {
                    return Err(e);
                }
            }
        }
    }
}

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Single-slot cache whose value is fresh for `ttl` after it was stored.
#[derive(Debug)]
pub struct TimedCache<T> {
    ttl: Duration,
    entry: Option<(Instant, T)>,
}

impl<T> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Returns the fresh value or computes, stores and returns a new one.
    /// Errors are not cached.
    pub async fn get_or_try_refresh<F, Fut, E>(&mut self, now: Instant, compute: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let ttl = self.ttl;
        match self.entry.take() {
            Some((computed_at, value)) if now.saturating_duration_since(computed_at) < ttl => {
                Ok(&self.entry.insert((computed_at, value)).1)
            }
            _ => {
                let value = compute().await?;
                Ok(&self.entry.insert((now, value)).1)
            }
        }
    }
}

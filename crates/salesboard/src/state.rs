use std::sync::Arc;

use chrono::Utc;
use salesboard_core::config::DashboardConfig;
use salesboard_core::{refresh_dashboard, Dashboard, DashboardError, TimedCache, WorksheetSource};
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Clone)]
pub struct AppState {
    config: Arc<DashboardConfig>,
    source: Arc<dyn WorksheetSource>,
    cache: Arc<Mutex<TimedCache<Arc<Dashboard>>>>,
}

impl AppState {
    pub fn new(config: DashboardConfig, source: Arc<dyn WorksheetSource>) -> Self {
        let cache = TimedCache::new(config.refresh_interval());
        Self {
            config: Arc::new(config),
            source,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// The cached dashboard, recomputed once the refresh interval has passed.
    /// The lock is held during recomputation so concurrent viewers share it.
    pub async fn current(&self) -> Result<Arc<Dashboard>, DashboardError> {
        let mut cache = self.cache.lock().await;
        let config = self.config.as_ref();
        let source = self.source.as_ref();
        let dashboard = cache
            .get_or_try_refresh(Instant::now(), || async move {
                refresh_dashboard(config, source, Utc::now())
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(dashboard))
    }
}

//! Page-view and visitor counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::CacheError;
use crate::store::LocalStore;

pub const PAGE_VIEWS_KEY: &str = "page_views";
pub const VISITOR_COUNT_KEY: &str = "visitor_count";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSnapshot {
    pub page_views: BTreeMap<String, u64>,
    pub total_page_views: u64,
    pub visitor_count: u64,
}

#[derive(Clone)]
pub struct Analytics {
    store: Arc<dyn LocalStore>,
    write_lock: Arc<Mutex<()>>,
}

impl Analytics {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Count one view of `path`; returns the new count for that path.
    /// A visit that is new to the caller also bumps the visitor count.
    pub async fn record_page_view(&self, path: &str, new_visitor: bool) -> Result<u64, CacheError> {
        let _guard = self.write_lock.lock().await;

        let mut views = self.page_views().await?;
        let count = views.entry(path.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        self.store
            .set(PAGE_VIEWS_KEY, serde_json::to_string(&views)?)
            .await?;

        if new_visitor {
            let visitors = self.visitor_count().await? + 1;
            self.store
                .set(VISITOR_COUNT_KEY, visitors.to_string())
                .await?;
        }
        Ok(count)
    }

    pub async fn page_views(&self) -> Result<BTreeMap<String, u64>, CacheError> {
        match self.store.get(PAGE_VIEWS_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(views) => Ok(views),
                Err(e) => {
                    tracing::warn!(error = %e, "Resetting unreadable page view counters");
                    Ok(BTreeMap::new())
                }
            },
            None => Ok(BTreeMap::new()),
        }
    }

    pub async fn visitor_count(&self) -> Result<u64, CacheError> {
        Ok(self
            .store
            .get(VISITOR_COUNT_KEY)
            .await?
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0))
    }

    pub async fn snapshot(&self) -> Result<AnalyticsSnapshot, CacheError> {
        let page_views = self.page_views().await?;
        let total_page_views = page_views.values().sum();
        Ok(AnalyticsSnapshot {
            page_views,
            total_page_views,
            visitor_count: self.visitor_count().await?,
        })
    }
}

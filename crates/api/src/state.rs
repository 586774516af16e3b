use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use content_feed_core::feed::FeedCache;
use content_feed_core::media::AssetUrls;

use crate::config::AppConfig;
use crate::content::ContentLibrary;
use crate::error::ApiError;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    config: AppConfig,
    library: ContentLibrary,
    asset_urls: AssetUrls,
    feed_cache: Mutex<FeedCache>,
    loaded_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, library: ContentLibrary) -> Self {
        let asset_urls = match &config.asset_base_url {
            Some(base) => AssetUrls::new(base.as_str()),
            None => AssetUrls::relative(),
        };
        Self {
            inner: Arc::new(InnerState {
                config,
                library,
                asset_urls,
                feed_cache: Mutex::new(FeedCache::new()),
                loaded_at: Utc::now(),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn library(&self) -> &ContentLibrary {
        &self.inner.library
    }

    pub fn asset_urls(&self) -> &AssetUrls {
        &self.inner.asset_urls
    }

    /// When the content library was handed to the server.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.inner.loaded_at
    }

    pub fn feed_cache(&self) -> Result<MutexGuard<'_, FeedCache>, ApiError> {
        self.inner
            .feed_cache
            .lock()
            .map_err(|_| ApiError::Internal("feed cache lock poisoned".to_string()))
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use content_feed_core::locale::{canonical_key, CorrelationMap, Locale};
use content_feed_core::post::{ingest_report, parse_page, Post};
use serde_json::Value;

use crate::config::AppConfig;

/// Posts ingested at startup, one source per page file.
#[derive(Debug, Default)]
pub struct ContentLibrary {
    sources: Vec<Vec<Post>>,
    rejected: usize,
    correlation: Option<Arc<CorrelationMap>>,
}

impl ContentLibrary {
    /// Ingest already-decoded page payloads.
    pub fn from_payloads(
        payloads: &[Value],
        correlation: Option<CorrelationMap>,
    ) -> anyhow::Result<Self> {
        let mut library = Self {
            correlation: correlation.map(Arc::new),
            ..Self::default()
        };
        for (index, payload) in payloads.iter().enumerate() {
            let records = parse_page(payload).with_context(|| format!("source page {index}"))?;
            let report = ingest_report(records);
            if report.rejected_count() > 0 {
                tracing::warn!(
                    page = index,
                    rejected = report.rejected_count(),
                    "source page contained invalid records"
                );
            }
            library.rejected += report.rejected_count();
            library.sources.push(report.posts);
        }
        Ok(library)
    }

    pub fn sources(&self) -> &[Vec<Post>] {
        &self.sources
    }

    pub fn post_count(&self) -> usize {
        self.sources.iter().map(Vec::len).sum()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn correlation(&self) -> Option<&Arc<CorrelationMap>> {
        self.correlation.as_ref()
    }

    fn published(&self) -> impl Iterator<Item = &Post> {
        self.sources.iter().flatten().filter(|p| p.is_published())
    }

    /// Published post carrying `slug`. Slugs are unique per locale only, so
    /// a post in `locale` wins, then the newest.
    pub fn find_published(&self, slug: &str, locale: Option<&Locale>) -> Option<&Post> {
        self.published()
            .filter(|p| p.slug == slug)
            .max_by_key(|p| (Some(&p.locale) == locale, p.published_at, p.id))
    }

    /// Published posts in the same translation group as `post`.
    pub fn siblings_of<'a>(&'a self, post: &Post) -> Vec<&'a Post> {
        let correlation = self.correlation.as_deref();
        let key = canonical_key(post, correlation);
        self.published()
            .filter(|p| canonical_key(p, correlation) == key)
            .collect()
    }
}

/// Read every `*.json` page under the configured content directory, in file
/// name order, plus the optional correlation map.
pub async fn load_library(config: &AppConfig) -> anyhow::Result<ContentLibrary> {
    let mut payloads = Vec::new();
    for path in page_files(&config.content_dir).await? {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload: Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded source page");
        payloads.push(payload);
    }

    let correlation = match &config.correlation_map {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let map: CorrelationMap = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a slug to id object", path.display()))?;
            tracing::info!(entries = map.len(), "loaded correlation map");
            Some(map)
        }
        None => None,
    };

    ContentLibrary::from_payloads(&payloads, correlation)
}

async fn page_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to open content directory {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    const PAGES: [&str; 3] = [
        include_str!("../../../fixtures/posts/page-1.json"),
        include_str!("../../../fixtures/posts/page-2.json"),
        include_str!("../../../fixtures/posts/page-3.json"),
    ];
    const CORRELATION: &str = include_str!("../../../fixtures/correlation.json");

    pub fn library() -> ContentLibrary {
        let payloads: Vec<Value> = PAGES
            .iter()
            .map(|page| serde_json::from_str(page).unwrap())
            .collect();
        let correlation = serde_json::from_str(CORRELATION).unwrap();
        ContentLibrary::from_payloads(&payloads, Some(correlation)).unwrap()
    }
}

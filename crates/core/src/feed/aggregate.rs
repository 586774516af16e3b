use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::cache::FeedCache;
use crate::error::{ContentError, Result};
use crate::locale::{group_translations, CorrelationMap, Locale};
use crate::post::{Post, PostType, ValidationError, ValidationErrorKind};

/// How a feed is filtered and windowed.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub page_size: usize,
    /// Show one translation per locale group, preferring this locale.
    pub locale: Option<Locale>,
    /// Tried in order when a group lacks `locale`.
    pub fallback: Vec<Locale>,
    pub post_type: Option<PostType>,
    pub correlation: Option<Arc<CorrelationMap>>,
}

impl FeedOptions {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            locale: None,
            fallback: Vec::new(),
            post_type: None,
            correlation: None,
        }
    }

    pub fn with_locale(mut self, locale: Locale, fallback: Vec<Locale>) -> Self {
        self.locale = Some(locale);
        self.fallback = fallback;
        self
    }

    pub fn with_post_type(mut self, post_type: PostType) -> Self {
        self.post_type = Some(post_type);
        self
    }

    pub fn with_correlation(mut self, correlation: Arc<CorrelationMap>) -> Self {
        self.correlation = Some(correlation);
        self
    }

    fn check(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ContentError::InvalidArgument(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Published posts in display order.
#[derive(Debug, Clone)]
pub struct Feed {
    items: Vec<Post>,
    page_size: usize,
    rejected: Vec<ValidationError>,
}

/// One window of a [`Feed`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<'a> {
    pub number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub items: &'a [Post],
}

impl Feed {
    /// Items `[n * page_size, (n + 1) * page_size)`. Past the end the page is
    /// empty.
    pub fn page(&self, n: usize) -> Page<'_> {
        let start = n.saturating_mul(self.page_size).min(self.items.len());
        let end = start.saturating_add(self.page_size).min(self.items.len());
        Page {
            number: n,
            page_size: self.page_size,
            total_items: self.items.len(),
            total_pages: self.page_count(),
            has_next: end < self.items.len(),
            items: &self.items[start..end],
        }
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn items(&self) -> &[Post] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Posts dropped because their slug was already taken in their locale.
    pub fn rejected(&self) -> &[ValidationError] {
        &self.rejected
    }
}

/// Newest `published_at` first, then highest `id`. Locale and slug only
/// break the remaining ties so the order is total.
pub(crate) fn feed_order(a: &Post, b: &Post) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.id.cmp(&a.id))
        .then_with(|| a.locale.cmp(&b.locale))
        .then_with(|| a.slug.cmp(&b.slug))
}

/// Every published post across `sources`, in feed order.
pub(crate) fn merge_published<S: AsRef<[Post]>>(sources: &[S]) -> Vec<Post> {
    let mut merged: Vec<Post> = sources
        .iter()
        .flat_map(|source| source.as_ref())
        .filter(|post| post.is_published())
        .cloned()
        .collect();
    merged.sort_by(feed_order);
    merged
}

/// Merge source pages into a feed.
///
/// Drafts are dropped, the rest is ordered newest first. When a locale is
/// requested each translation group contributes at most one post.
pub fn build_feed<S: AsRef<[Post]>>(sources: &[S], opts: &FeedOptions) -> Result<Feed> {
    opts.check()?;
    Ok(window(&merge_published(sources), opts))
}

/// [`build_feed`] reusing the merged, sorted posts held in `cache` while the
/// sources are unchanged.
pub fn build_feed_cached<S: AsRef<[Post]>>(
    cache: &mut FeedCache,
    sources: &[S],
    opts: &FeedOptions,
) -> Result<Feed> {
    opts.check()?;
    let merged = cache.merged(sources);
    Ok(window(&merged, opts))
}

fn window(merged: &[Post], opts: &FeedOptions) -> Feed {
    let mut rejected = Vec::new();
    let mut taken: HashSet<(&Locale, &str)> = HashSet::new();

    let mut unique: Vec<&Post> = Vec::new();
    for post in merged {
        if !taken.insert((&post.locale, post.slug.as_str())) {
            tracing::warn!(id = post.id, slug = %post.slug, locale = %post.locale, "duplicate slug in locale feed");
            rejected.push(
                ValidationError::new(ValidationErrorKind::DuplicateSlug, "attributes.slug")
                    .for_post(post.id),
            );
            continue;
        }
        unique.push(post);
    }
    // Collisions are decided over the whole feed, before type filtering.
    if let Some(post_type) = opts.post_type {
        unique.retain(|post| post.post_type == post_type);
    }

    let items = match &opts.locale {
        None => unique.into_iter().cloned().collect(),
        Some(locale) => {
            let groups = group_translations(unique, opts.correlation.as_deref());
            let mut chosen: Vec<Post> = groups
                .values()
                .filter_map(|group| group.find(locale, &opts.fallback))
                .cloned()
                .collect();
            chosen.sort_by(feed_order);
            chosen
        }
    };

    Feed {
        items,
        page_size: opts.page_size,
        rejected,
    }
}

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::aggregate::merge_published;
use crate::post::Post;

/// Memoized merge of source pages.
///
/// Holds the most recent merged, sorted set of published posts together
/// with a fingerprint of the sources it was built from. Owned by the caller;
/// nothing here is global.
#[derive(Debug, Default)]
pub struct FeedCache {
    entry: Option<(u64, Arc<[Post]>)>,
    hits: u64,
    misses: u64,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merged posts for `sources`, rebuilt only when their fingerprint moved.
    pub fn merged<S: AsRef<[Post]>>(&mut self, sources: &[S]) -> Arc<[Post]> {
        let key = fingerprint(sources);
        if let Some((cached_key, merged)) = &self.entry {
            if *cached_key == key {
                self.hits += 1;
                tracing::debug!(key, "feed cache hit");
                return merged.clone();
            }
        }

        self.misses += 1;
        tracing::debug!(key, "feed cache miss");
        let merged: Arc<[Post]> = merge_published(sources).into();
        self.entry = Some((key, merged.clone()));
        merged
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Hash of every post in every source, including source boundaries.
fn fingerprint<S: AsRef<[Post]>>(sources: &[S]) -> u64 {
    let mut hasher = DefaultHasher::new();
    sources.len().hash(&mut hasher);
    for source in sources {
        source.as_ref().hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{build_feed, build_feed_cached, FeedOptions};
    use crate::post::testing::{asset, post};
    use crate::post::FormatName;

    fn sources() -> Vec<Vec<Post>> {
        vec![
            vec![post(1, "one", "en"), post(2, "two", "en")],
            vec![post(3, "three", "ko")],
        ]
    }

    #[test]
    fn reuses_merge_for_unchanged_sources() {
        let mut cache = FeedCache::new();
        let first = cache.merged(&sources());
        let second = cache.merged(&sources());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn invalidates_on_content_change() {
        let mut cache = FeedCache::new();
        let mut sources = sources();
        let before = cache.merged(&sources);

        sources[1][0].updated_at = Some("2024-01-01T00:00:00Z".parse().unwrap());
        let after = cache.merged(&sources);
        assert!(!Arc::ptr_eq(&before, &after));

        sources[1].push(post(4, "four", "ko"));
        cache.merged(&sources);
        assert_eq!(cache.misses(), 3);
    }

    #[test]
    fn cached_feed_matches_uncached() {
        let mut cache = FeedCache::new();
        let opts = FeedOptions::new(2);
        for _ in 0..2 {
            let cached = build_feed_cached(&mut cache, &sources(), &opts).unwrap();
            let plain = build_feed(&sources(), &opts).unwrap();
            assert_eq!(cached.page(0), plain.page(0));
            assert_eq!(cached.page(1), plain.page(1));
        }
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn body_and_image_edits_invalidate() {
        let mut cache = FeedCache::new();
        let opts = FeedOptions::new(10);
        let mut sources = sources();
        build_feed_cached(&mut cache, &sources, &opts).unwrap();

        sources[0][0].content = Some("<p>corrected body</p>".to_string());
        sources[0][0].image = Some(asset(&[FormatName::Thumbnail]));
        let cached = build_feed_cached(&mut cache, &sources, &opts).unwrap();
        let plain = build_feed(&sources, &opts).unwrap();
        assert_eq!(cached.page(0), plain.page(0));
        assert_eq!(cache.misses(), 2);

        let edited = cached.items().iter().find(|p| p.id == 1).unwrap();
        assert_eq!(edited.content.as_deref(), Some("<p>corrected body</p>"));
        assert!(edited.image.is_some());
    }

    #[test]
    fn clear_forces_rebuild() {
        let mut cache = FeedCache::new();
        cache.merged(&sources());
        cache.clear();
        cache.merged(&sources());
        assert_eq!(cache.misses(), 2);
    }
}

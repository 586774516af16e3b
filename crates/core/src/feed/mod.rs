pub mod aggregate;
pub mod cache;

pub use aggregate::{build_feed, build_feed_cached, Feed, FeedOptions, Page};
pub use cache::FeedCache;

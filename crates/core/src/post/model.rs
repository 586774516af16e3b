use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::locale::Locale;

/// Canonical blog post, normalized from a Strapi `{id, attributes}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub short_content: Option<String>,
    /// Untrusted HTML. Stored verbatim; sanitising is the renderer's job.
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub slug: String,
    pub locale: Locale,
    /// Human-facing date string, kept exactly as authored.
    pub publish_date: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Authoritative for ordering. `None` means the post is a draft.
    pub published_at: Option<DateTime<Utc>>,
    pub media_link: Option<String>,
    pub image: Option<Arc<MediaAsset>>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

impl Hash for Post {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.title.hash(state);
        self.short_content.hash(state);
        self.content.hash(state);
        self.post_type.hash(state);
        self.slug.hash(state);
        self.locale.hash(state);
        self.publish_date.hash(state);
        self.created_at.hash(state);
        self.updated_at.hash(state);
        self.published_at.hash(state);
        self.media_link.hash(state);
        self.image.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PostType {
    Blog,
    News,
}

impl PostType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Blog" => Some(PostType::Blog),
            "News" => Some(PostType::News),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Blog => "Blog",
            PostType::News => "News",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded image referenced by one or more posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub id: i64,
    pub name: String,
    pub alternative_text: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Pre-rendered renditions. Only the keys the CMS generated are present.
    pub formats: BTreeMap<FormatName, FormatVariant>,
    pub hash: String,
    pub ext: String,
    pub mime: String,
    /// Size of the original upload in KB.
    pub size: Option<f64>,
    pub url: String,
}

impl MediaAsset {
    /// The original upload described as a variant of itself.
    pub fn original(&self) -> FormatVariant {
        FormatVariant {
            url: self.url.clone(),
            width: self.width,
            height: self.height,
            size: self.size.unwrap_or_default(),
            mime: self.mime.clone(),
        }
    }
}

impl Hash for MediaAsset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
        self.alternative_text.hash(state);
        self.width.hash(state);
        self.height.hash(state);
        self.formats.hash(state);
        self.hash.hash(state);
        self.ext.hash(state);
        self.mime.hash(state);
        self.size.map(f64::to_bits).hash(state);
        self.url.hash(state);
    }
}

/// Named rendition sizes, ordered smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatName {
    Thumbnail,
    Small,
    Medium,
    Large,
}

impl FormatName {
    pub const ALL: [FormatName; 4] = [
        FormatName::Thumbnail,
        FormatName::Small,
        FormatName::Medium,
        FormatName::Large,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "thumbnail" => Some(FormatName::Thumbnail),
            "small" => Some(FormatName::Small),
            "medium" => Some(FormatName::Medium),
            "large" => Some(FormatName::Large),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatName::Thumbnail => "thumbnail",
            FormatName::Small => "small",
            FormatName::Medium => "medium",
            FormatName::Large => "large",
        }
    }
}

impl fmt::Display for FormatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resized copy of a [`MediaAsset`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatVariant {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Size in KB.
    pub size: f64,
    pub mime: String,
}

impl Hash for FormatVariant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
        self.width.hash(state);
        self.height.hash(state);
        self.size.to_bits().hash(state);
        self.mime.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_order_by_size() {
        let mut names = vec![
            FormatName::Large,
            FormatName::Thumbnail,
            FormatName::Medium,
            FormatName::Small,
        ];
        names.sort();
        assert_eq!(names, FormatName::ALL.to_vec());
    }

    #[test]
    fn format_keys_round_trip_through_str() {
        for name in FormatName::ALL {
            assert_eq!(FormatName::from_key(name.as_str()), Some(name));
        }
        assert_eq!(FormatName::from_key("xlarge"), None);
    }

    fn hash_of(post: &Post) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        post.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn hash_covers_body_and_image() {
        let original = crate::post::testing::post(1, "one", "en");
        let mut edited = original.clone();
        assert_eq!(hash_of(&original), hash_of(&edited));

        edited.content = Some("<p>corrected body</p>".to_string());
        assert_ne!(hash_of(&original), hash_of(&edited));

        let mut illustrated = original.clone();
        illustrated.image = Some(crate::post::testing::asset(&[FormatName::Small]));
        let mut resized = illustrated.clone();
        resized.image = Some(crate::post::testing::asset(&[FormatName::Medium]));
        assert_ne!(hash_of(&original), hash_of(&illustrated));
        assert_ne!(hash_of(&illustrated), hash_of(&resized));
    }

    #[test]
    fn post_type_is_case_sensitive() {
        assert_eq!(PostType::parse("News"), Some(PostType::News));
        assert_eq!(PostType::parse("news"), None);
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ContentError, Result};
use crate::locale::Locale;
use crate::post::Post;

/// Editorial table linking translated slugs to a shared canonical id.
///
/// The CMS stores no foreign key between translations, so this mapping has
/// to come from outside the post data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationMap(BTreeMap<String, String>);

impl CorrelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slug: impl Into<String>, canonical_id: impl Into<String>) {
        self.0.insert(slug.into(), canonical_id.into());
    }

    pub fn canonical_id(&self, slug: &str) -> Option<&str> {
        self.0.get(slug).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, C: Into<String>> FromIterator<(S, C)> for CorrelationMap {
    fn from_iter<I: IntoIterator<Item = (S, C)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(slug, id)| (slug.into(), id.into()))
                .collect(),
        )
    }
}

/// Identity of a locale group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalKey {
    /// Taken from a [`CorrelationMap`] entry.
    Mapped(String),
    /// A post with no correlation entry stands alone.
    Singleton { locale: Locale, slug: String },
}

impl CanonicalKey {
    pub fn mapped(id: impl Into<String>) -> Self {
        CanonicalKey::Mapped(id.into())
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalKey::Mapped(id) => f.write_str(id),
            CanonicalKey::Singleton { locale, slug } => write!(f, "{locale}/{slug}"),
        }
    }
}

/// Posts carrying the same editorial content in different languages.
///
/// Members are kept ordered by locale, then newest `published_at`, then
/// highest `id`, so lookups are deterministic.
#[derive(Debug, Clone)]
pub struct LocaleGroup<'a> {
    key: CanonicalKey,
    members: Vec<&'a Post>,
}

impl<'a> LocaleGroup<'a> {
    fn new(key: CanonicalKey) -> Self {
        Self {
            key,
            members: Vec::new(),
        }
    }

    fn insert(&mut self, post: &'a Post) {
        let at = self
            .members
            .partition_point(|m| member_order(m, post) == std::cmp::Ordering::Less);
        self.members.insert(at, post);
    }

    pub fn key(&self) -> &CanonicalKey {
        &self.key
    }

    pub fn members(&self) -> &[&'a Post] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Distinct locales available in this group, in member order.
    pub fn locales(&self) -> Vec<&Locale> {
        let mut locales: Vec<&Locale> = self.members.iter().map(|p| &p.locale).collect();
        locales.dedup();
        locales
    }

    pub fn contains(&self, locale: &Locale) -> bool {
        self.members.iter().any(|p| &p.locale == locale)
    }

    /// First member matching `[requested, ...fallback]`, or `None` when the
    /// group has none of those locales.
    pub fn find(&self, requested: &Locale, fallback: &[Locale]) -> Option<&'a Post> {
        std::iter::once(requested)
            .chain(fallback)
            .find_map(|locale| self.members.iter().copied().find(|p| &p.locale == locale))
    }
}

fn member_order(a: &Post, b: &Post) -> std::cmp::Ordering {
    a.locale
        .cmp(&b.locale)
        .then_with(|| b.published_at.cmp(&a.published_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// The group `post` belongs to under `correlation`.
pub fn canonical_key(post: &Post, correlation: Option<&CorrelationMap>) -> CanonicalKey {
    match correlation.and_then(|map| map.canonical_id(&post.slug)) {
        Some(id) => CanonicalKey::mapped(id),
        None => CanonicalKey::Singleton {
            locale: post.locale.clone(),
            slug: post.slug.clone(),
        },
    }
}

/// Group posts into translation sets.
///
/// Posts whose slug appears in `correlation` share the mapped canonical id.
/// Everything else becomes a singleton group keyed by locale and slug.
pub fn group_translations<'a, I>(
    posts: I,
    correlation: Option<&CorrelationMap>,
) -> BTreeMap<CanonicalKey, LocaleGroup<'a>>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut groups: BTreeMap<CanonicalKey, LocaleGroup<'a>> = BTreeMap::new();
    for post in posts {
        let key = canonical_key(post, correlation);
        groups
            .entry(key.clone())
            .or_insert_with(|| LocaleGroup::new(key))
            .insert(post);
    }
    groups
}

/// Pick the translation to show for `requested`, trying `fallback` in order.
///
/// When no priority locale is present the group's first member is returned.
/// Only an empty group is an error.
pub fn resolve_locale<'a>(
    group: &LocaleGroup<'a>,
    requested: &Locale,
    fallback: &[Locale],
) -> Result<&'a Post> {
    if let Some(post) = group.find(requested, fallback) {
        return Ok(post);
    }
    group
        .members
        .first()
        .copied()
        .ok_or_else(|| ContentError::NoTranslationAvailable(group.key.to_string()))
}

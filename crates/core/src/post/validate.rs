//! Record validation for Strapi-style post envelopes.
//!
//! A raw record looks like `{"id": 54, "attributes": {...}}`. Only `id` is
//! assumed to exist; everything under `attributes` is checked here before a
//! [`Post`] is built.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use super::model::{FormatName, FormatVariant, MediaAsset, Post, PostType};
use super::slug;
use crate::error::ContentError;
use crate::locale::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingField,
    InvalidEnum,
    MalformedDate,
    InvalidSlug,
    InvalidLocale,
    InvalidMedia,
    DuplicateSlug,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationErrorKind::MissingField => "missing field",
            ValidationErrorKind::InvalidEnum => "invalid enum value",
            ValidationErrorKind::MalformedDate => "malformed date",
            ValidationErrorKind::InvalidSlug => "invalid slug",
            ValidationErrorKind::InvalidLocale => "invalid locale",
            ValidationErrorKind::InvalidMedia => "invalid media",
            ValidationErrorKind::DuplicateSlug => "duplicate slug",
        };
        f.write_str(name)
    }
}

/// A raw record that cannot become a [`Post`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at `{field}`{}", .post_id.map(|id| format!(" (post {id})")).unwrap_or_default())]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Dotted path of the offending field, e.g. `attributes.slug`.
    pub field: String,
    pub post_id: Option<i64>,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            post_id: None,
        }
    }

    pub fn for_post(mut self, id: i64) -> Self {
        self.post_id = Some(id);
        self
    }
}

type Checked<T> = Result<T, ValidationError>;

/// Typed access to one JSON object, with error paths rooted at `path`.
struct Fields<'a> {
    object: &'a Value,
    path: String,
}

impl<'a> Fields<'a> {
    fn new(object: &'a Value, path: impl Into<String>) -> Self {
        Self {
            object,
            path: path.into(),
        }
    }

    fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// The value under `key`, treating JSON `null` as absent.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    fn nested(&self, key: &str) -> Option<Fields<'a>> {
        self.get(key)
            .filter(|v| v.is_object())
            .map(|v| Fields::new(v, self.path_of(key)))
    }

    fn error(&self, kind: ValidationErrorKind, key: &str) -> ValidationError {
        ValidationError::new(kind, self.path_of(key))
    }

    fn required_str(&self, key: &str) -> Checked<&'a str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| self.error(ValidationErrorKind::MissingField, key))
    }

    fn optional_str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    fn required_i64(&self, key: &str) -> Checked<i64> {
        self.get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| self.error(ValidationErrorKind::MissingField, key))
    }

    fn required_dimension(&self, key: &str) -> Checked<u32> {
        let raw = self
            .get(key)
            .and_then(Value::as_u64)
            .ok_or_else(|| self.error(ValidationErrorKind::MissingField, key))?;
        u32::try_from(raw)
            .ok()
            .filter(|px| *px > 0)
            .ok_or_else(|| self.error(ValidationErrorKind::InvalidMedia, key))
    }

    fn optional_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    fn timestamp(&self, key: &str) -> Checked<Option<DateTime<Utc>>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .ok_or_else(|| self.error(ValidationErrorKind::MalformedDate, key))
    }
}

/// Validate and normalize one raw post record.
pub fn validate(raw: &Value) -> Result<Post, ValidationError> {
    let root = Fields::new(raw, "");
    let id = root.required_i64("id")?;
    let attributes = root
        .nested("attributes")
        .ok_or_else(|| root.error(ValidationErrorKind::MissingField, "attributes"))
        .map_err(|e| e.for_post(id))?;
    validate_attributes(id, &attributes).map_err(|e| e.for_post(id))
}

fn validate_attributes(id: i64, attrs: &Fields<'_>) -> Checked<Post> {
    let title = attrs.required_str("title")?;

    let slug = attrs.required_str("slug")?;
    if !slug::is_url_safe(slug) {
        return Err(attrs.error(ValidationErrorKind::InvalidSlug, "slug"));
    }

    let post_type = PostType::parse(attrs.required_str("type")?)
        .ok_or_else(|| attrs.error(ValidationErrorKind::InvalidEnum, "type"))?;

    let locale = match attrs.optional_str("locale") {
        None => Locale::default(),
        Some(tag) => Locale::parse(tag)
            .ok_or_else(|| attrs.error(ValidationErrorKind::InvalidLocale, "locale"))?,
    };

    Ok(Post {
        id,
        title: title.to_string(),
        short_content: attrs.optional_str("shortContent").map(str::to_string),
        content: attrs.optional_str("content").map(str::to_string),
        post_type,
        slug: slug.to_string(),
        locale,
        publish_date: attrs.optional_str("publishDate").map(str::to_string),
        created_at: attrs.timestamp("createdAt")?,
        updated_at: attrs.timestamp("updatedAt")?,
        published_at: attrs.timestamp("publishedAt")?,
        media_link: attrs.optional_str("mediaLink").map(str::to_string),
        image: media_asset(attrs)?.map(Arc::new),
    })
}

/// Read `image.data`. A missing `image` or a `null` `data` means no media.
fn media_asset(attrs: &Fields<'_>) -> Checked<Option<MediaAsset>> {
    let Some(image) = attrs.nested("image") else {
        return Ok(None);
    };
    let Some(data) = image.get("data") else {
        return Ok(None);
    };
    if !data.is_object() {
        return Err(image.error(ValidationErrorKind::InvalidMedia, "data"));
    }
    let data = Fields::new(data, image.path_of("data"));
    let id = data.required_i64("id")?;
    let fields = data
        .nested("attributes")
        .ok_or_else(|| data.error(ValidationErrorKind::MissingField, "attributes"))?;

    let mime = fields.optional_str("mime").unwrap_or_default().to_string();
    let mut asset = MediaAsset {
        id,
        name: fields.optional_str("name").unwrap_or_default().to_string(),
        alternative_text: fields.optional_str("alternativeText").map(str::to_string),
        width: fields.required_dimension("width")?,
        height: fields.required_dimension("height")?,
        formats: format_variants(&fields, &mime)?,
        hash: fields.optional_str("hash").unwrap_or_default().to_string(),
        ext: fields.optional_str("ext").unwrap_or_default().to_string(),
        size: fields.optional_f64("size"),
        url: fields.required_str("url")?.to_string(),
        mime,
    };
    prune_formats(&mut asset, &fields);
    Ok(Some(asset))
}

fn format_variants(asset: &Fields<'_>, asset_mime: &str) -> Checked<BTreeMap<FormatName, FormatVariant>> {
    let Some(formats) = asset.nested("formats") else {
        return Ok(BTreeMap::new());
    };
    let Some(entries) = formats.object.as_object() else {
        return Ok(BTreeMap::new());
    };

    let mut variants = BTreeMap::new();
    for (key, value) in entries {
        let Some(name) = FormatName::from_key(key) else {
            tracing::debug!(format = %key, "ignoring unknown image format");
            continue;
        };
        if !value.is_object() {
            return Err(formats.error(ValidationErrorKind::InvalidMedia, key));
        }
        let variant = Fields::new(value, formats.path_of(key));
        variants.insert(
            name,
            FormatVariant {
                url: variant.required_str("url")?.to_string(),
                width: variant.required_dimension("width")?,
                height: variant.required_dimension("height")?,
                size: variant.optional_f64("size").unwrap_or_default(),
                mime: variant.optional_str("mime").unwrap_or(asset_mime).to_string(),
            },
        );
    }
    Ok(variants)
}

/// Drop renditions that are narrower than a smaller-named one, wider than
/// the original, or off the original aspect ratio by more than one pixel of
/// height. The post keeps its remaining renditions.
fn prune_formats(asset: &mut MediaAsset, fields: &Fields<'_>) {
    let (asset_id, width, height) = (asset.id, asset.width, asset.height);
    let formats_path = fields.path_of("formats");
    let mut previous_width = 0;
    asset.formats.retain(|name, variant| {
        let expected_height = f64::from(height) * f64::from(variant.width) / f64::from(width);
        let drifted = (f64::from(variant.height) - expected_height).abs() > 1.0 + f64::EPSILON;
        if variant.width < previous_width || variant.width > width || drifted {
            tracing::warn!(
                asset = asset_id,
                field = %format!("{formats_path}.{name}"),
                width = variant.width,
                height = variant.height,
                "dropping rendition with inconsistent dimensions"
            );
            return false;
        }
        previous_width = variant.width;
        true
    });
}

/// Result of ingesting one source page.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub posts: Vec<Post>,
    pub rejected: Vec<ValidationError>,
}

impl IngestReport {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Validate every record of a page, dropping the ones that fail.
pub fn ingest(raw_page: &[Value]) -> Vec<Post> {
    ingest_report(raw_page).posts
}

/// Like [`ingest`], but also returns the rejected records' errors.
///
/// Posts referencing the same asset id with identical content share one
/// `Arc<MediaAsset>`.
pub fn ingest_report(raw_page: &[Value]) -> IngestReport {
    let mut report = IngestReport::default();
    let mut assets: HashMap<i64, Arc<MediaAsset>> = HashMap::new();

    for (index, raw) in raw_page.iter().enumerate() {
        match validate(raw) {
            Ok(mut post) => {
                if let Some(image) = post.image.take() {
                    let shared = assets.entry(image.id).or_insert_with(|| image.clone());
                    post.image = Some(if **shared == *image {
                        shared.clone()
                    } else {
                        image
                    });
                }
                report.posts.push(post);
            }
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping invalid post record");
                report.rejected.push(err);
            }
        }
    }
    report
}

/// Extract the record array from a CMS response.
///
/// Accepts a Strapi envelope (`{"data": [...], "meta": {...}}`) or a bare
/// array of records.
pub fn parse_page(payload: &Value) -> Result<&[Value], ContentError> {
    match payload {
        Value::Array(records) => Ok(records),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(ContentError::MalformedPayload(
                "expected a `data` array in the response envelope".to_string(),
            )),
        },
        _ => Err(ContentError::MalformedPayload(
            "expected an array of records or a response envelope".to_string(),
        )),
    }
}

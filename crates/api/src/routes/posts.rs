use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use content_feed_core::feed::{build_feed_cached, FeedOptions, Page};
use content_feed_core::locale::{canonical_key, group_translations, resolve_locale, Locale};
use content_feed_core::media::{resolve_candidate, srcset, RenderTarget};
use content_feed_core::post::{FormatName, Post, PostType};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiQuery;
use crate::state::AppState;

const MAX_PAGE_SIZE: usize = 100;

/// Feed, single post and image rendition routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/posts", get(list_posts))
        .route("/v1/posts/{slug}", get(get_post))
        .route("/v1/posts/{slug}/image", get(get_image))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedQuery {
    page: Option<usize>,
    page_size: Option<i64>,
    locale: Option<String>,
    /// Comma separated, e.g. `en,ko`.
    fallback: Option<String>,
    #[serde(rename = "type")]
    post_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LocaleQuery {
    locale: Option<String>,
    fallback: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageQuery {
    max_width: Option<f64>,
    dpr: Option<f64>,
}

#[derive(Serialize)]
struct FeedResponse<'a> {
    #[serde(flatten)]
    page: Page<'a>,
    /// Posts dropped for reusing a slug within their locale.
    rejected: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostResponse<'a> {
    #[serde(flatten)]
    post: &'a Post,
    available_locales: Vec<&'a Locale>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    /// `None` when the original upload was chosen.
    format: Option<FormatName>,
    url: String,
    width: u32,
    height: u32,
    mime: String,
    alternative_text: Option<String>,
    srcset: String,
}

fn fallback_locales(state: &AppState, list: Option<&str>) -> ApiResult<Vec<Locale>> {
    match list {
        Some(list) => Ok(Locale::parse_list(list)?),
        None => Ok(state.config().fallback_locales.clone()),
    }
}

fn feed_options(state: &AppState, query: &FeedQuery) -> ApiResult<FeedOptions> {
    let page_size = match query.page_size {
        // Negative sizes become zero and are rejected by the feed builder.
        Some(size) => usize::try_from(size).unwrap_or(0),
        None => state.config().default_page_size,
    };
    if page_size > MAX_PAGE_SIZE {
        return Err(ApiError::BadRequest(format!(
            "page size must be at most {MAX_PAGE_SIZE}"
        )));
    }

    let mut opts = FeedOptions::new(page_size);
    if let Some(correlation) = state.library().correlation() {
        opts = opts.with_correlation(correlation.clone());
    }
    if let Some(tag) = &query.locale {
        let locale: Locale = tag.parse()?;
        let fallback = fallback_locales(state, query.fallback.as_deref())?;
        opts = opts.with_locale(locale, fallback);
    }
    if let Some(kind) = &query.post_type {
        let post_type = PostType::parse(kind)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown post type '{kind}'")))?;
        opts = opts.with_post_type(post_type);
    }
    Ok(opts)
}

/// One page of the merged, published feed.
async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> ApiResult<Response> {
    let opts = feed_options(&state, &query)?;
    let feed = {
        let mut cache = state.feed_cache()?;
        build_feed_cached(&mut cache, state.library().sources(), &opts)?
    };

    let body = FeedResponse {
        page: feed.page(query.page.unwrap_or(0)),
        rejected: feed.rejected().len(),
    };
    Ok(Json(body).into_response())
}

fn published_post<'a>(
    state: &'a AppState,
    slug: &str,
    locale: Option<&Locale>,
) -> ApiResult<&'a Post> {
    state
        .library()
        .find_published(slug, locale)
        .ok_or_else(|| ApiError::NotFound(format!("post '{slug}'")))
}

/// The translation of `slug`'s group that best matches the requested locale.
async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiQuery(query): ApiQuery<LocaleQuery>,
) -> ApiResult<Response> {
    let requested: Option<Locale> = query
        .locale
        .as_deref()
        .map(str::parse::<Locale>)
        .transpose()?;
    let post = published_post(&state, &slug, requested.as_ref())?;
    let requested = requested.unwrap_or_else(|| post.locale.clone());
    let fallback = fallback_locales(&state, query.fallback.as_deref())?;

    let library = state.library();
    let correlation = library.correlation().map(|map| map.as_ref());
    let key = canonical_key(post, correlation);
    let groups = group_translations(library.siblings_of(post), correlation);
    let group = groups
        .get(&key)
        .ok_or_else(|| ApiError::Internal(format!("post '{slug}' missing from its group {key}")))?;
    let chosen = resolve_locale(group, &requested, &fallback)?;

    let body = PostResponse {
        post: chosen,
        available_locales: group.locales(),
    };
    Ok(Json(body).into_response())
}

/// Best rendition of a post's image for the given slot width and pixel density.
async fn get_image(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiQuery(query): ApiQuery<ImageQuery>,
) -> ApiResult<Json<ImageResponse>> {
    let post = published_post(&state, &slug, None)?;
    let asset = post
        .image
        .as_deref()
        .ok_or_else(|| ApiError::NotFound(format!("post '{slug}' has no image")))?;
    let max_width = query
        .max_width
        .ok_or_else(|| ApiError::BadRequest("maxWidth is required".to_string()))?;

    let chosen = resolve_candidate(asset, RenderTarget::new(max_width, query.dpr.unwrap_or(1.0)))?;
    let urls = state.asset_urls();
    Ok(Json(ImageResponse {
        format: chosen.format,
        url: urls.absolute(&chosen.variant.url),
        width: chosen.variant.width,
        height: chosen.variant.height,
        mime: chosen.variant.mime,
        alternative_text: asset.alternative_text.clone(),
        srcset: srcset(asset, urls),
    }))
}

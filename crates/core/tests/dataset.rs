use std::sync::Arc;

use content_feed_core::feed::{build_feed, build_feed_cached, FeedCache, FeedOptions};
use content_feed_core::locale::{group_translations, resolve_locale, CanonicalKey, CorrelationMap, Locale};
use content_feed_core::media::{candidates, resolve, RenderTarget};
use content_feed_core::post::{ingest_report, parse_page, validate, FormatName, Post, ValidationErrorKind};
use serde_json::Value;

const PAGES: [&str; 3] = [
    include_str!("../../../fixtures/posts/page-1.json"),
    include_str!("../../../fixtures/posts/page-2.json"),
    include_str!("../../../fixtures/posts/page-3.json"),
];
const CORRELATION: &str = include_str!("../../../fixtures/correlation.json");

fn raw_pages() -> Vec<Vec<Value>> {
    PAGES
        .iter()
        .map(|page| {
            let payload: Value = serde_json::from_str(page).unwrap();
            parse_page(&payload).unwrap().to_vec()
        })
        .collect()
}

fn sources() -> Vec<Vec<Post>> {
    raw_pages()
        .iter()
        .map(|page| {
            let report = ingest_report(page);
            assert_eq!(report.rejected_count(), 0);
            report.posts
        })
        .collect()
}

fn locale(tag: &str) -> Locale {
    Locale::parse(tag).unwrap()
}

fn all_posts() -> Vec<Post> {
    sources().into_iter().flatten().collect()
}

#[test]
fn every_fixture_record_validates() {
    for page in raw_pages() {
        assert_eq!(page.len(), 4);
        for raw in &page {
            if let Err(err) = validate(raw) {
                panic!("fixture record failed validation: {err}");
            }
        }
    }
}

#[test]
fn fixture_record_without_title_is_rejected() {
    let mut raw = raw_pages()[1][0].clone();
    raw["attributes"].as_object_mut().unwrap().remove("title");
    let err = validate(&raw).unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::MissingField);
    assert_eq!(err.post_id, Some(54));
}

#[test]
fn feed_is_ordered_and_skips_drafts() {
    let feed = build_feed(&sources(), &FeedOptions::new(10)).unwrap();
    let ids: Vec<i64> = feed.items().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![58, 57, 56, 53, 54, 52, 51, 49, 50, 48, 47]);

    for pair in feed.items().windows(2) {
        assert!(pair[0].published_at >= pair[1].published_at);
    }

    assert_eq!(feed.page(0).items.len(), 10);
    assert_eq!(feed.page(1).items.len(), 1);
    assert!(feed.page(2).items.is_empty());
}

#[test]
fn first_page_is_idempotent() {
    let sources = sources();
    let opts = FeedOptions::new(10);
    let first = build_feed(&sources, &opts).unwrap();
    let second = build_feed(&sources, &opts).unwrap();
    assert_eq!(first.page(0).items, second.page(0).items);

    let mut cache = FeedCache::new();
    let cached = build_feed_cached(&mut cache, &sources, &opts).unwrap();
    assert_eq!(cached.page(0).items, first.page(0).items);
}

#[test]
fn ecash_day_recap_translations_form_one_group() {
    let posts = all_posts();
    let map: CorrelationMap = [
        ("ecash-day-celebration-ama-recap", "G1"),
        ("ecash-day-celebration-ama-recap-ko", "G1"),
    ]
    .into_iter()
    .collect();

    let groups = group_translations(&posts, Some(&map));
    let group = &groups[&CanonicalKey::mapped("G1")];
    assert_eq!(group.len(), 2);

    let korean = resolve_locale(group, &locale("ko"), &[locale("en")]).unwrap();
    assert_eq!(korean.id, 52);

    let fallback = resolve_locale(group, &locale("fr"), &[locale("en")]).unwrap();
    assert_eq!(fallback.id, 54);
}

#[test]
fn localized_feed_uses_editorial_correlation() {
    let map: CorrelationMap = serde_json::from_str(CORRELATION).unwrap();
    let opts = FeedOptions::new(20)
        .with_correlation(Arc::new(map))
        .with_locale(locale("ko"), vec![locale("en")]);

    let feed = build_feed(&sources(), &opts).unwrap();
    let ids: Vec<i64> = feed.items().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![58, 57, 52, 51, 49, 48, 47]);
}

#[test]
fn translations_share_one_asset() {
    let sources = sources();
    let recap = &sources[1];
    let (en, ko) = (&recap[0], &recap[2]);
    assert_eq!((en.id, ko.id), (54, 52));
    assert!(Arc::ptr_eq(en.image.as_ref().unwrap(), ko.image.as_ref().unwrap()));
}

#[test]
fn resolver_respects_fixture_images() {
    for post in all_posts() {
        let Some(asset) = &post.image else { continue };
        let mut previous = 0;
        for width in [50.0, 200.0, 320.0, 480.0, 768.0, 1024.0, 1440.0, 2560.0] {
            let variant = resolve(asset, RenderTarget::new(width, 1.0)).unwrap();
            assert!(variant.width <= asset.width, "post {} upscaled", post.id);
            assert!(variant.width >= previous, "post {} went smaller", post.id);
            previous = variant.width;
        }
        assert!(!candidates(asset).is_empty());
    }
}

#[test]
fn small_upload_only_offers_a_thumbnail() {
    let posts = all_posts();
    let cashtab = posts.iter().find(|p| p.id == 51).unwrap();
    let asset = cashtab.image.as_ref().unwrap();
    assert_eq!((asset.width, asset.height), (320, 193));
    assert_eq!(asset.formats.keys().copied().collect::<Vec<_>>(), vec![FormatName::Thumbnail]);

    let variant = resolve(asset, RenderTarget::new(1200.0, 2.0)).unwrap();
    assert_eq!(variant.width, 245);
}

use serde::Serialize;

use super::urls::AssetUrls;
use crate::error::{ContentError, Result};
use crate::post::{FormatName, FormatVariant, MediaAsset};

/// Where an image will be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    /// Layout width of the image slot in CSS pixels.
    pub max_width_px: f64,
    pub device_pixel_ratio: f64,
}

impl RenderTarget {
    pub fn new(max_width_px: f64, device_pixel_ratio: f64) -> Self {
        Self {
            max_width_px,
            device_pixel_ratio,
        }
    }

    /// Physical pixels needed to fill the slot without upscaling.
    pub fn needed_width(&self) -> Result<u32> {
        if !(self.max_width_px.is_finite() && self.max_width_px > 0.0) {
            return Err(ContentError::InvalidArgument(format!(
                "max width must be positive, got {}",
                self.max_width_px
            )));
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(ContentError::InvalidArgument(format!(
                "device pixel ratio must be positive, got {}",
                self.device_pixel_ratio
            )));
        }
        // `as` saturates at u32::MAX.
        Ok((self.max_width_px * self.device_pixel_ratio).ceil() as u32)
    }
}

/// One rendition an asset can be served as.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// `None` for the original upload.
    pub format: Option<FormatName>,
    #[serde(flatten)]
    pub variant: FormatVariant,
}

/// Renditions of `asset`, narrowest first.
///
/// Variants wider than the original are never offered. An asset without
/// usable formats is offered as its original upload alone.
pub fn candidates(asset: &MediaAsset) -> Vec<Candidate> {
    let mut found: Vec<Candidate> = asset
        .formats
        .iter()
        .filter(|(_, variant)| variant.width <= asset.width)
        .map(|(name, variant)| Candidate {
            format: Some(*name),
            variant: variant.clone(),
        })
        .collect();

    if found.is_empty() {
        return vec![Candidate {
            format: None,
            variant: asset.original(),
        }];
    }
    found.sort_by_key(|c| (c.variant.width, c.format));
    found
}

/// Pick the smallest rendition at least as wide as the target needs, or the
/// widest one available when none is wide enough.
pub fn resolve_candidate(asset: &MediaAsset, target: RenderTarget) -> Result<Candidate> {
    let needed = target.needed_width()?;
    let mut found = candidates(asset);
    let index = found
        .iter()
        .position(|c| c.variant.width >= needed)
        .unwrap_or(found.len() - 1);
    tracing::trace!(asset = asset.id, needed, chosen = ?found[index].format, "resolved rendition");
    Ok(found.swap_remove(index))
}

/// Like [`resolve_candidate`], returning only the variant.
pub fn resolve(asset: &MediaAsset, target: RenderTarget) -> Result<FormatVariant> {
    resolve_candidate(asset, target).map(|c| c.variant)
}

/// A `srcset` attribute value listing every rendition with its width
/// descriptor, e.g. `/uploads/thumbnail_a.png 245w, /uploads/small_a.png 500w`.
pub fn srcset(asset: &MediaAsset, urls: &AssetUrls) -> String {
    let mut found = candidates(asset);
    found.dedup_by_key(|c| c.variant.width);
    found
        .iter()
        .map(|c| format!("{} {}w", urls.absolute(&c.variant.url), c.variant.width))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::testing::asset;

    const ALL: [FormatName; 4] = FormatName::ALL;

    fn chosen(asset: &MediaAsset, width: f64, dpr: f64) -> Option<FormatName> {
        resolve_candidate(asset, RenderTarget::new(width, dpr))
            .unwrap()
            .format
    }

    #[test]
    fn picks_smallest_sufficient_variant() {
        let asset = asset(&ALL);
        assert_eq!(chosen(&asset, 100.0, 1.0), Some(FormatName::Thumbnail));
        assert_eq!(chosen(&asset, 245.0, 1.0), Some(FormatName::Thumbnail));
        assert_eq!(chosen(&asset, 246.0, 1.0), Some(FormatName::Small));
        assert_eq!(chosen(&asset, 375.0, 2.0), Some(FormatName::Medium));
        assert_eq!(chosen(&asset, 400.0, 2.5), Some(FormatName::Large));
    }

    #[test]
    fn never_upscales_past_the_widest_variant() {
        let asset = asset(&ALL);
        let variant = resolve(&asset, RenderTarget::new(1440.0, 2.0)).unwrap();
        assert_eq!(variant.width, 1000);
    }

    #[test]
    fn respects_partial_format_presence() {
        let asset = asset(&[FormatName::Thumbnail, FormatName::Medium]);
        assert_eq!(chosen(&asset, 300.0, 1.0), Some(FormatName::Medium));
        assert_eq!(chosen(&asset, 900.0, 1.0), Some(FormatName::Medium));
    }

    #[test]
    fn falls_back_to_original_without_formats() {
        let asset = asset(&[]);
        let picked = resolve_candidate(&asset, RenderTarget::new(200.0, 1.0)).unwrap();
        assert_eq!(picked.format, None);
        assert_eq!(picked.variant.url, "/uploads/hero_abc123.png");
        assert_eq!((picked.variant.width, picked.variant.height), (1200, 675));
    }

    #[test]
    fn width_is_monotonic_and_bounded_by_original() {
        let subsets: [&[FormatName]; 4] = [&ALL, &ALL[..1], &ALL[1..3], &[]];
        for names in subsets {
            let asset = asset(names);
            let mut previous = 0;
            for width in (10..=2000).step_by(15) {
                for dpr in [1.0, 1.5, 2.0, 3.0] {
                    let variant = resolve(&asset, RenderTarget::new(f64::from(width), dpr)).unwrap();
                    assert!(variant.width <= asset.width);
                    if dpr == 1.0 {
                        assert!(variant.width >= previous);
                        previous = variant.width;
                    }
                }
            }
        }
    }

    #[test]
    fn drops_variants_wider_than_original() {
        let mut asset = (*asset(&ALL)).clone();
        asset.width = 600;
        let variant = resolve(&asset, RenderTarget::new(2000.0, 1.0)).unwrap();
        assert_eq!(variant.width, 500);
    }

    #[test]
    fn rejects_non_positive_targets() {
        let asset = asset(&ALL);
        for (width, dpr) in [(0.0, 1.0), (-5.0, 1.0), (300.0, 0.0), (300.0, -1.0), (f64::NAN, 1.0)] {
            let err = resolve(&asset, RenderTarget::new(width, dpr)).unwrap_err();
            assert!(matches!(err, ContentError::InvalidArgument(_)));
        }
    }

    #[test]
    fn builds_srcset_over_all_candidates() {
        let partial = asset(&[FormatName::Thumbnail, FormatName::Small]);
        assert_eq!(
            srcset(&partial, &AssetUrls::relative()),
            "/uploads/thumbnail_hero_abc123.png 245w, /uploads/small_hero_abc123.png 500w"
        );
        assert_eq!(
            srcset(&asset(&[]), &AssetUrls::new("https://cms.example.org")),
            "https://cms.example.org/uploads/hero_abc123.png 1200w"
        );
    }
}

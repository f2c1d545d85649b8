use image::imageops::FilterType;
use image::{imageops, GrayImage, RgbImage};

use segflag_storage::StorageBackend;
use segflag_types::error::{Result, SegflagError};

/// Canonical edge length both base images and masks are resized to before
/// composition, matching the review UI's fixed tile size.
pub const CANONICAL_SIZE: u32 = 256;

/// Prior mask renders green, current mask red, both at half opacity.
pub const PRIOR_MASK_COLOR: [u8; 3] = [0, 255, 0];
pub const CURRENT_MASK_COLOR: [u8; 3] = [255, 0, 0];
pub const DEFAULT_ALPHA: u8 = 128;

/// Overlay a binary mask onto a base image.
///
/// A mask pixel is active iff its intensity is greater than zero; the
/// threshold is binary, not magnitude-weighted. Active pixels are blended
/// with `color` at opacity `alpha` using the standard "over" blend,
/// evaluated in integer arithmetic with round-half-up:
///
/// ```text
/// out = (color * alpha + base * (255 - alpha) + 127) / 255
/// ```
///
/// No randomness and no floating point, so identical inputs always produce
/// byte-identical output. Dimensions must already match; callers resize both
/// sides to [`CANONICAL_SIZE`] first, and a mismatch is a contract violation
/// fatal to this one record only.
pub fn overlay_mask(
    base: &RgbImage,
    mask: &GrayImage,
    color: [u8; 3],
    alpha: u8,
) -> Result<RgbImage> {
    let (image_w, image_h) = base.dimensions();
    let (mask_w, mask_h) = mask.dimensions();
    if (image_w, image_h) != (mask_w, mask_h) {
        return Err(SegflagError::DimensionMismatch {
            image_w,
            image_h,
            mask_w,
            mask_h,
        });
    }

    let mut out = base.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        if mask.get_pixel(x, y)[0] > 0 {
            for c in 0..3 {
                px[c] = blend(color[c], px[c], alpha);
            }
        }
    }
    Ok(out)
}

/// Render the combined two-mask view: prior mask first, current mask onto
/// the result of the first pass, each at the same alpha.
///
/// This is additive sequential compositing, not boolean intersection:
/// overlapping active regions show a blended third color rather than a
/// distinct highlight. That is the shipped behavior of the review tool's
/// combined tile and is preserved as-is.
pub fn overlay_pair(
    base: &RgbImage,
    prior_mask: &GrayImage,
    current_mask: &GrayImage,
    alpha: u8,
) -> Result<RgbImage> {
    let first = overlay_mask(base, prior_mask, PRIOR_MASK_COLOR, alpha)?;
    overlay_mask(&first, current_mask, CURRENT_MASK_COLOR, alpha)
}

#[inline]
fn blend(layer: u8, base: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((layer as u32 * a + base as u32 * (255 - a) + 127) / 255) as u8
}

/// Fetch and decode a base image, resized to the canonical square.
///
/// Every failure (missing key, transient store error, undecodable bytes)
/// surfaces as `ImageUnavailable` for this one record, so the caller renders
/// a placeholder and the rest of the page still displays.
pub fn fetch_image(storage: &dyn StorageBackend, key: &str) -> Result<RgbImage> {
    let bytes = fetch_bytes(storage, key)?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| unavailable(key, e))?;
    Ok(imageops::resize(
        &decoded.to_rgb8(),
        CANONICAL_SIZE,
        CANONICAL_SIZE,
        FilterType::CatmullRom,
    ))
}

/// Fetch and decode a mask as single-channel intensity, resized with
/// nearest-neighbor so values stay binary through resampling.
pub fn fetch_mask(storage: &dyn StorageBackend, key: &str) -> Result<GrayImage> {
    let bytes = fetch_bytes(storage, key)?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| unavailable(key, e))?;
    Ok(imageops::resize(
        &decoded.to_luma8(),
        CANONICAL_SIZE,
        CANONICAL_SIZE,
        FilterType::Nearest,
    ))
}

fn fetch_bytes(storage: &dyn StorageBackend, key: &str) -> Result<Vec<u8>> {
    storage
        .get(key)
        .map_err(|e| unavailable(key, e))?
        .ok_or_else(|| unavailable(key, "object not found"))
}

fn unavailable(key: &str, reason: impl ToString) -> SegflagError {
    SegflagError::ImageUnavailable {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

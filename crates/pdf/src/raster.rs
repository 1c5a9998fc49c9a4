//! Inline images carried as `data:` URIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A decoded image as 8-bit RGB rows, ready for an image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RasterImage {
    /// Height over width.
    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width.max(1) as f32
    }
}

/// Decode a `data:image/...;base64,` source.
///
/// Returns `None` for remote URLs and anything that fails to decode.
/// Transparent pixels are flattened onto white.
pub fn decode_data_uri(src: &str) -> Option<RasterImage> {
    if is_remote(src) {
        log::warn!("Skipping remote image {}: only inline data: images are embedded", src);
        return None;
    }
    let rest = src.strip_prefix("data:image")?;
    let (header, payload) = rest.split_once(',')?;
    if !header.contains(";base64") {
        log::debug!("Skipping non-base64 image source");
        return None;
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = match STANDARD.decode(cleaned.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Skipping image with invalid base64: {}", e);
            return None;
        }
    };

    let decoded = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("Skipping undecodable image: {}", e);
            return None;
        }
    };

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let mut rgb = Vec::with_capacity(rgb_len(width, height));
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        for channel in [r, g, b] {
            let blended = (channel as u32 * alpha + 255 * (255 - alpha)) / 255;
            rgb.push(blended as u8);
        }
    }

    Some(RasterImage { width, height, rgb })
}

fn is_remote(src: &str) -> bool {
    let scheme = src.split_once("://").map(|(scheme, _)| scheme);
    matches!(scheme, Some(s) if s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https"))
}

/// Byte length of an RGB buffer, computed in `usize`.
fn rgb_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(3)
}

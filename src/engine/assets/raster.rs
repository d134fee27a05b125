// Portable encoding of pixel regions

use super::AssetError;
use crate::core::Rect;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbaImage};

/// Encoding of a zero-area region
pub const EMPTY_DATA_URL: &str = "data:,";

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Crops a region out of a source image and serializes it to a string
pub trait Rasterizer {
    fn encode(&self, source: &RgbaImage, region: Rect) -> Result<String, AssetError>;
}

/// Rasterizer producing `data:image/png;base64,...` URLs
///
/// The output canvas is always `region.width` x `region.height`; any part of
/// the region outside the source stays fully transparent.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngDataUrlRasterizer;

impl PngDataUrlRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Copy the region into a fresh canvas
    pub fn crop(source: &RgbaImage, region: Rect) -> RgbaImage {
        let mut canvas = RgbaImage::new(region.width, region.height);
        image::imageops::replace(
            &mut canvas,
            source,
            -(region.x as i64),
            -(region.y as i64),
        );
        canvas
    }
}

impl Rasterizer for PngDataUrlRasterizer {
    fn encode(&self, source: &RgbaImage, region: Rect) -> Result<String, AssetError> {
        if region.is_empty() {
            return Ok(EMPTY_DATA_URL.to_string());
        }

        let addressable = region
            .area()
            .checked_mul(4)
            .and_then(|bytes| isize::try_from(bytes).ok())
            .is_some();
        if !addressable {
            return Err(AssetError::InvalidGeometry(format!(
                "{:?} is too large to rasterize",
                region
            )));
        }

        let canvas = Self::crop(source, region);

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ColorType::Rgba8,
        )?;

        Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png)))
    }
}

/// Decode a base64 `data:` URL back into pixels
pub fn decode_data_url(url: &str) -> Result<RgbaImage, AssetError> {
    if url == EMPTY_DATA_URL {
        return Ok(RgbaImage::new(0, 0));
    }

    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| AssetError::Encode(format!("not a base64 data URL: {:.32}", url)))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| AssetError::Encode(format!("invalid base64 payload: {}", e)))?;

    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn quadrants() -> RgbaImage {
        // 4x4: red top-left, green top-right, blue bottom-left, white bottom-right
        RgbaImage::from_fn(4, 4, |x, y| match (x < 2, y < 2) {
            (true, true) => Rgba([255, 0, 0, 255]),
            (false, true) => Rgba([0, 255, 0, 255]),
            (true, false) => Rgba([0, 0, 255, 255]),
            (false, false) => Rgba([255, 255, 255, 255]),
        })
    }

    #[test]
    fn test_encode_is_png_data_url() {
        let url = PngDataUrlRasterizer
            .encode(&quadrants(), Rect::from_size(4, 4))
            .unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_encode_crops_region() {
        let url = PngDataUrlRasterizer
            .encode(&quadrants(), Rect::new(2, 0, 2, 2))
            .unwrap();
        let decoded = decode_data_url(&url).unwrap();

        assert_eq!(decoded.dimensions(), (2, 2));
        assert!(decoded.pixels().all(|p| *p == Rgba([0, 255, 0, 255])));
    }

    #[test]
    fn test_region_past_source_is_transparent() {
        let region = Rect::new(2, 2, 4, 4);
        let canvas = PngDataUrlRasterizer::crop(&quadrants(), region);

        assert_eq!(canvas.dimensions(), (4, 4));
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*canvas.get_pixel(3, 3), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_empty_region_encodes_empty_url() {
        let url = PngDataUrlRasterizer
            .encode(&quadrants(), Rect::new(0, 0, 0, 4))
            .unwrap();
        assert_eq!(url, EMPTY_DATA_URL);
        assert_eq!(decode_data_url(&url).unwrap().dimensions(), (0, 0));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = PngDataUrlRasterizer
            .encode(&quadrants(), Rect::new(1, 1, 2, 2))
            .unwrap();
        let b = PngDataUrlRasterizer
            .encode(&quadrants(), Rect::new(1, 1, 2, 2))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_rejects_plain_strings() {
        assert!(matches!(
            decode_data_url("tiles.png"),
            Err(AssetError::Encode(_))
        ));
    }

    #[test]
    fn test_unaddressable_region_is_rejected() {
        let err = PngDataUrlRasterizer
            .encode(&quadrants(), Rect::new(0, 0, u32::MAX, u32::MAX))
            .unwrap_err();
        assert!(matches!(err, AssetError::InvalidGeometry(_)));
    }

}

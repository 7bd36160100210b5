/// Image ingestion pipeline
///
/// Validates an uploaded buffer, auto-orients it from EXIF metadata,
/// and derives two JPEG renditions: a bounded full-size image and a
/// fixed square thumbnail. Every step is a hard gate; a failure at any
/// point surfaces as `InvalidImage` and no rendition is reported.
use crate::error::{GalleryError, GalleryResult};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Full renditions are bounded to fit entirely within this square
pub const FULL_MAX_WIDTH: u32 = 2000;
pub const FULL_MAX_HEIGHT: u32 = 2000;

/// Thumbnails are exactly this size, cover-fit and center-cropped
pub const THUMBNAIL_WIDTH: u32 = 400;
pub const THUMBNAIL_HEIGHT: u32 = 400;

/// Both renditions re-encode to JPEG at this quality
pub const JPEG_QUALITY: u8 = 85;

/// Normalized output format for every rendition
pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";
pub const OUTPUT_EXTENSION: &str = "jpg";

/// The two derived renditions plus the full rendition's dimensions
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub full: Vec<u8>,
    pub thumbnail: Vec<u8>,
    /// Pixel dimensions of the full rendition (post-downscale)
    pub width: u32,
    pub height: u32,
}

/// Raster formats accepted for upload
const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Gif,
    ImageFormat::Avif,
];

/// Run the full pipeline over an uploaded buffer
pub fn process_image(data: &[u8]) -> GalleryResult<ProcessedImage> {
    let img = decode(data)?;
    let img = apply_orientation(data, img);

    // Full rendition: fit within the cap, never upscale
    let (width, height) = (img.width(), img.height());
    let full_img = if width > FULL_MAX_WIDTH || height > FULL_MAX_HEIGHT {
        img.resize(FULL_MAX_WIDTH, FULL_MAX_HEIGHT, FilterType::Lanczos3)
    } else {
        img.clone()
    };
    let full = encode_jpeg(&full_img)?;

    // Thumbnail: cover-fit to the fixed square, centered crop
    let thumb_img = img.resize_to_fill(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Lanczos3);
    let thumbnail = encode_jpeg(&thumb_img)?;

    Ok(ProcessedImage {
        full,
        thumbnail,
        width: full_img.width(),
        height: full_img.height(),
    })
}

/// Decode the buffer, enforcing the format allow-list
fn decode(data: &[u8]) -> GalleryResult<DynamicImage> {
    let format = image::guess_format(data)
        .map_err(|_| GalleryError::InvalidImage("Not a recognized image format".to_string()))?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(GalleryError::InvalidImage(format!(
            "Unsupported image format: {:?}",
            format
        )));
    }

    image::load_from_memory_with_format(data, format)
        .map_err(|e| GalleryError::InvalidImage(format!("Failed to decode image: {}", e)))
}

/// Apply EXIF orientation so pixel data matches intended display
/// orientation
///
/// Re-encoding afterwards bakes the orientation in and drops the tag,
/// so outputs never carry orientation metadata. Buffers without EXIF
/// (or with an unknown orientation value) pass through unchanged.
fn apply_orientation(data: &[u8], img: DynamicImage) -> DynamicImage {
    let orientation = read_exif_orientation(data).unwrap_or(1);

    match orientation {
        1 => img,
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

fn read_exif_orientation(data: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(data);
    let exifreader = exif::Reader::new();
    let exif = exifreader.read_from_container(&mut cursor).ok()?;

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
}

/// Re-encode to JPEG at the fixed quality
///
/// JPEG carries no alpha, so sources with transparency flatten to RGB
/// first.
fn encode_jpeg(img: &DynamicImage) -> GalleryResult<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| GalleryError::InvalidImage(format!("Failed to encode image: {}", e)))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::new(width, height);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::new(width, height);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    /// Splice a minimal EXIF APP1 segment (one orientation entry)
    /// right after the JPEG SOI marker
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II*\0");
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation
        tiff.extend_from_slice(&3u16.to_le_bytes()); // SHORT
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&0u16.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn decoded_dimensions(jpeg: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(jpeg).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_non_image_buffer_is_rejected() {
        let garbage = vec![0x42u8; 256];
        let err = process_image(&garbage).unwrap_err();
        assert!(matches!(err, GalleryError::InvalidImage(_)));
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        assert!(matches!(
            process_image(&[]).unwrap_err(),
            GalleryError::InvalidImage(_)
        ));
    }

    #[test]
    fn test_disallowed_format_is_rejected() {
        // BMP decodes fine but is not on the allow-list
        let img = RgbImage::new(8, 8);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp)
            .unwrap();

        let err = process_image(&buf).unwrap_err();
        assert!(matches!(err, GalleryError::InvalidImage(_)));
    }

    #[test]
    fn test_large_image_fits_within_cap_preserving_aspect() {
        let processed = process_image(&png_bytes(4000, 3000)).unwrap();

        assert!(processed.width <= FULL_MAX_WIDTH);
        assert!(processed.height <= FULL_MAX_HEIGHT);
        assert_eq!(processed.width.max(processed.height), 2000);

        // 4:3 within one-pixel rounding
        let expected_height = processed.width as f64 * 3.0 / 4.0;
        assert!((processed.height as f64 - expected_height).abs() <= 1.0);

        // Reported dimensions match the encoded rendition
        assert_eq!(
            decoded_dimensions(&processed.full),
            (processed.width, processed.height)
        );
    }

    #[test]
    fn test_small_image_is_never_upscaled() {
        let processed = process_image(&png_bytes(640, 480)).unwrap();
        assert_eq!(processed.width, 640);
        assert_eq!(processed.height, 480);
    }

    #[test]
    fn test_thumbnail_is_exactly_square_for_any_aspect() {
        for (w, h) in [(3000, 500), (500, 3000), (800, 800)] {
            let processed = process_image(&png_bytes(w, h)).unwrap();
            assert_eq!(
                decoded_dimensions(&processed.thumbnail),
                (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)
            );
        }
    }

    #[test]
    fn test_output_is_jpeg() {
        let processed = process_image(&png_bytes(100, 100)).unwrap();
        assert_eq!(
            image::guess_format(&processed.full).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            image::guess_format(&processed.thumbnail).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_avif_input_is_decoded() {
        let img = RgbImage::new(32, 32);
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut cursor, 10, 80);
        img.write_with_encoder(encoder).unwrap();
        assert_eq!(image::guess_format(&buf).unwrap(), ImageFormat::Avif);

        let processed = process_image(&buf).unwrap();
        assert_eq!((processed.width, processed.height), (32, 32));
        assert_eq!(
            image::guess_format(&processed.full).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_exif_orientation_is_applied_and_stripped() {
        // Orientation 6 means the camera was rotated: display requires
        // a 90-degree turn, swapping the axes
        let tagged = with_exif_orientation(&jpeg_bytes(100, 40), 6);
        assert_eq!(read_exif_orientation(&tagged), Some(6));

        let processed = process_image(&tagged).unwrap();
        assert_eq!((processed.width, processed.height), (40, 100));

        // Re-encoding bakes the orientation in; no tag survives
        assert_eq!(read_exif_orientation(&processed.full), None);
        assert_eq!(read_exif_orientation(&processed.thumbnail), None);
    }

    #[test]
    fn test_buffer_without_exif_passes_through() {
        // PNGs carry no EXIF container; orientation defaults to 1
        assert_eq!(read_exif_orientation(&png_bytes(10, 10)), None);
        let processed = process_image(&png_bytes(10, 20)).unwrap();
        assert_eq!((processed.width, processed.height), (10, 20));
    }
}

//! Image preprocessing for the leaf classifier.
//!
//! Pipeline: decode → EXIF orientation → RGB → exact square resize →
//! MobileNetV2 scaling (`x / 127.5 - 1`) into an NHWC tensor buffer.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat};

use super::ClassifierError;

/// Number of colour channels fed to the model.
pub const CHANNELS: usize = 3;

/// A decoded, resized image flattened to model input.
///
/// `data` is NHWC with batch size 1: `[1, size, size, 3]`.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub size: u32,
    pub data: Vec<f32>,
}

impl PreparedImage {
    /// Tensor shape as `[batch, height, width, channels]`.
    pub fn shape(&self) -> [usize; 4] {
        [1, self.size as usize, self.size as usize, CHANNELS]
    }
}

/// Decode raw upload bytes and apply EXIF orientation.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
    let img = image::load_from_memory(bytes)?;
    let orientation = read_exif_orientation(bytes);
    Ok(apply_orientation(img, orientation))
}

/// Full preprocessing from raw bytes.
pub fn prepare_image(bytes: &[u8], size: u32) -> Result<PreparedImage, ClassifierError> {
    let img = decode_image(bytes)?;
    Ok(prepare_decoded(&img, size))
}

/// Resize an already-decoded image and scale it for MobileNetV2.
pub fn prepare_decoded(img: &DynamicImage, size: u32) -> PreparedImage {
    let rgb = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();

    let mut data = Vec::with_capacity((size * size) as usize * CHANNELS);
    for pixel in rgb.pixels() {
        for channel in pixel.0 {
            data.push(scale_pixel(channel));
        }
    }

    PreparedImage { size, data }
}

/// MobileNetV2 `preprocess_input`: map [0, 255] to [-1, 1].
pub fn scale_pixel(value: u8) -> f32 {
    value as f32 / 127.5 - 1.0
}

/// Re-encode an image as RGB JPEG (alpha dropped).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ClassifierError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut cursor = Cursor::new(Vec::new());
    rgb.write_to(&mut cursor, ImageOutputFormat::Jpeg(quality))
        .map_err(|e| ClassifierError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
///
/// 1 = normal, 2 = mirrored, 3 = 180°, 4 = flipped vertically,
/// 5-8 = the 90°/270° rotations with and without mirroring.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
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

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .unwrap();
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn scale_pixel_maps_to_unit_range() {
        assert_eq!(scale_pixel(0), -1.0);
        assert_eq!(scale_pixel(255), 1.0);
        assert!(scale_pixel(128).abs() < 0.01);
    }

    #[test]
    fn prepared_image_has_nhwc_length() {
        let bytes = sample_png(40, 30, [10, 200, 30]);
        let prepared = prepare_image(&bytes, 224).unwrap();
        assert_eq!(prepared.shape(), [1, 224, 224, 3]);
        assert_eq!(prepared.data.len(), 224 * 224 * 3);
    }

    #[test]
    fn channels_are_interleaved_per_pixel() {
        let bytes = sample_png(8, 8, [255, 0, 255]);
        let prepared = prepare_image(&bytes, 4).unwrap();
        let first = &prepared.data[..3];
        assert!((first[0] - 1.0).abs() < 0.02);
        assert!((first[1] + 1.0).abs() < 0.02);
        assert!((first[2] - 1.0).abs() < 0.02);
        assert!(prepared.data.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = prepare_image(b"definitely not an image", 224).unwrap_err();
        assert!(matches!(err, ClassifierError::Decode(_)));
    }

    #[test]
    fn exif_orientation_defaults_to_normal() {
        let bytes = sample_png(4, 4, [0, 0, 0]);
        assert_eq!(read_exif_orientation(&bytes), 1);
        assert_eq!(read_exif_orientation(&[]), 1);
    }

    #[test]
    fn orientation_six_rotates_dimensions() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(4, 2));
        let rotated = apply_orientation(img, 6);
        assert_eq!((rotated.width(), rotated.height()), (2, 4));
    }

    #[test]
    fn encode_jpeg_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(5, 5));
        let jpeg = encode_jpeg(&rgba, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}

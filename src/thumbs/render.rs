//! Resizing and encoding of thumbnail images.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

use crate::error::{ItemError, ItemResult};

/// Shrink `image` to fit within `max_width` x `max_height`, keeping the
/// aspect ratio. Images that already fit are returned unchanged.
pub fn shrink_to_fit(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    if image.width() <= max_width && image.height() <= max_height {
        return image;
    }
    image.resize(max_width, max_height, FilterType::Lanczos3)
}

/// Center `image` on a black canvas of exactly `width` x `height`,
/// shrinking it first if needed.
pub fn letterbox(image: DynamicImage, width: u32, height: u32) -> RgbImage {
    let fitted = shrink_to_fit(image, width, height).to_rgb8();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    let x = (width.saturating_sub(fitted.width()) / 2) as i64;
    let y = (height.saturating_sub(fitted.height()) / 2) as i64;
    imageops::overlay(&mut canvas, &fitted, x, y);
    canvas
}

pub fn save_jpeg(image: &DynamicImage, path: &Path, quality: u8) -> ItemResult<()> {
    save_rgb(&image.to_rgb8(), path, quality)
}

pub fn save_rgb(image: &RgbImage, path: &Path, quality: u8) -> ItemResult<()> {
    let file = File::create(path).map_err(|e| ItemError::io("create", path, e))?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    image.write_with_encoder(encoder)?;
    writer.flush().map_err(|e| ItemError::io("write", path, e))?;
    Ok(())
}

/// Turn the image upright according to the EXIF orientation of `path`.
///
/// Only the rotations a camera produces (3, 6 and 8) are handled; anything
/// else, including a missing or unreadable tag, leaves the image as is.
pub fn apply_orientation(image: DynamicImage, path: &Path) -> DynamicImage {
    match read_orientation(path) {
        Some(3) => image.rotate180(),
        Some(6) => image.rotate90(),
        Some(8) => image.rotate270(),
        _ => image,
    }
}

fn read_orientation(path: &Path) -> Option<u32> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut bufreader).ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 10, 10])))
    }

    #[test]
    fn test_shrink_keeps_aspect_ratio() {
        let shrunk = shrink_to_fit(solid(400, 200), 160, 160);
        assert_eq!((shrunk.width(), shrunk.height()), (160, 80));
    }

    #[test]
    fn test_never_enlarges() {
        let small = shrink_to_fit(solid(100, 50), 1280, 1280);
        assert_eq!((small.width(), small.height()), (100, 50));
    }

    #[test]
    fn test_letterbox_centers_on_black() {
        let preview = letterbox(solid(400, 200), 120, 160);
        assert_eq!(preview.dimensions(), (120, 160));
        // 400x200 fits as 120x60, leaving 50 rows above and below.
        assert_eq!(preview.get_pixel(60, 10), &Rgb([0, 0, 0]));
        assert_eq!(preview.get_pixel(60, 150), &Rgb([0, 0, 0]));
        assert_ne!(preview.get_pixel(60, 80), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_save_jpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thumb.jpg");
        save_jpeg(&solid(32, 16), &path, 90).unwrap();

        let reopened = image::open(&path).unwrap();
        assert_eq!((reopened.width(), reopened.height()), (32, 16));
    }

    #[test]
    fn test_orientation_without_exif_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        save_jpeg(&solid(30, 10), &path, 90).unwrap();

        let image = apply_orientation(image::open(&path).unwrap(), &path);
        assert_eq!((image.width(), image.height()), (30, 10));
    }
}

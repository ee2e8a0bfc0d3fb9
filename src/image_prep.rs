//! アップロード前の画像チェックと縮小

use crate::error::{ReelkixError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use reelkix_common::ImageUpload;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Gif,
    ImageFormat::Bmp,
];

/// 画像ファイルを読み込んで送信用に整える
pub fn load_image_file(path: &Path, max_size: u32) -> Result<ImageUpload> {
    if !path.is_file() {
        return Err(ReelkixError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    prepare_image(bytes, &file_name, max_size)
}

/// 形式を判定し、長辺が max_size を超える場合は JPEG に縮小する
///
/// max_size が 0 なら縮小しない
pub fn prepare_image(bytes: Vec<u8>, file_name: &str, max_size: u32) -> Result<ImageUpload> {
    let format = image::guess_format(&bytes)
        .map_err(|_| ReelkixError::UnsupportedImage(file_name.to_string()))?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(ReelkixError::UnsupportedImage(format!("{} ({:?})", file_name, format)));
    }

    if max_size == 0 {
        return Ok(ImageUpload::new(bytes, file_name, format.to_mime_type()));
    }

    let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format)
        .into_dimensions()
        .map_err(|e| ReelkixError::ImageLoad(e.to_string()))?;

    if width.max(height) <= max_size {
        return Ok(ImageUpload::new(bytes, file_name, format.to_mime_type()));
    }

    debug!(width, height, max_size, "画像を縮小");
    let image = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| ReelkixError::ImageLoad(e.to_string()))?;
    let resized = DynamicImage::ImageRgb8(image.resize(max_size, max_size, FilterType::Triangle).to_rgb8());

    let mut buffer = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|e| ReelkixError::ImageLoad(e.to_string()))?;

    Ok(ImageUpload::new(buffer, jpeg_file_name(file_name), ImageFormat::Jpeg.to_mime_type()))
}

/// 拡張子を .jpg に置き換える
fn jpeg_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    format!("{}.jpg", stem)
}

use crate::RgbFrame;
use anyhow::Context;
use common::span;
use image::ImageReader;
use std::path::Path;

/// Decode an image file into packed RGB.
///
/// The format is sniffed from the content, so extensions such as `.JPEG`
/// need not match what the codec expects. Grayscale, alpha and 16-bit
/// sources are converted to 8-bit RGB.
pub fn load_rgb(path: &Path) -> anyhow::Result<RgbFrame> {
    let _s = span!("decode_image");

    let img = ImageReader::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("Failed to decode image {}", path.display()))?
        .to_rgb8();

    let (width, height) = img.dimensions();
    tracing::trace!(width, height, path = %path.display(), "Decoded image");

    RgbFrame::new(width, height, img.into_raw())
}

/// Name fragment marking a pre-converted raw RGB input.
pub const RAW_INPUT_MARKER: &str = ".bin";

/// Whether the file name marks `path` as a raw RGB input.
pub fn is_raw_input(name: &str) -> bool {
    name.contains(RAW_INPUT_MARKER)
}

/// Read a pre-converted `.bin` input: packed RGB bytes already at `size`.
pub fn load_raw_rgb(path: &Path, size: (u32, u32)) -> anyhow::Result<RgbFrame> {
    let pixels =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    RgbFrame::new(size.0, size.1, pixels)
        .with_context(|| format!("Raw input {} does not match the model input", path.display()))
}

/// Decode `path`, treating raw inputs (see [`is_raw_input`]) as RGB at `raw_size`.
pub fn load_input(path: &Path, raw_size: (u32, u32)) -> anyhow::Result<RgbFrame> {
    let raw = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(is_raw_input);
    if raw {
        load_raw_rgb(path, raw_size)
    } else {
        load_rgb(path)
    }
}

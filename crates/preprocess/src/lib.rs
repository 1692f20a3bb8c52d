pub mod cpu;
pub mod decode;
pub mod tensor;

pub use cpu::{CpuPreProcessor, Prepared};
pub use decode::{RAW_INPUT_MARKER, is_raw_input, load_input, load_raw_rgb, load_rgb};
pub use tensor::{Layout, to_f32_tensor, to_u8_tensor};

/// Packed 8-bit RGB image in HWC order.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> anyhow::Result<Self> {
        let expected_size = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| anyhow::anyhow!("Frame size {width}x{height} overflows"))?;
        if pixels.len() != expected_size {
            anyhow::bail!(
                "Buffer size mismatch: expected {}, got {} bytes",
                expected_size,
                pixels.len()
            );
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

use crate::RgbFrame;
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};

/// A frame sized for the model input.
#[derive(Debug)]
pub struct Prepared {
    pub frame: RgbFrame,
    /// Dimensions of the decoded source image
    pub source_size: (u32, u32),
    pub resized: bool,
}

/// Stretches decoded frames to the model input size.
///
/// Aspect ratio is not preserved: classification models trained on
/// center-cropped squares expect the whole image squeezed into the input.
pub struct CpuPreProcessor {
    pub input_size: (u32, u32),
    resizer: Resizer,
}

impl CpuPreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            resizer: Resizer::new(),
        }
    }

    /// Resize `frame` to the input size if it differs; pass it through otherwise.
    pub fn fit(&mut self, frame: RgbFrame) -> anyhow::Result<Prepared> {
        let source_size = frame.size();
        if source_size == self.input_size {
            return Ok(Prepared {
                frame,
                source_size,
                resized: false,
            });
        }

        tracing::info!(
            "resize {} {} to {} {}",
            source_size.0,
            source_size.1,
            self.input_size.0,
            self.input_size.1
        );

        let pixels = self.resize(&frame.pixels, frame.width, frame.height)?;
        Ok(Prepared {
            frame: RgbFrame::new(self.input_size.0, self.input_size.1, pixels)?,
            source_size,
            resized: true,
        })
    }

    fn resize(&mut self, pixels: &[u8], width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
        let _s = span!("resize");

        let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;
        let mut resized = Image::new(self.input_size.0, self.input_size.1, PixelType::U8x3);

        self.resizer.resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        Ok(resized.buffer().to_vec())
    }
}

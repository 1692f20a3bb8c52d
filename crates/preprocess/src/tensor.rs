use crate::RgbFrame;
use ndarray::{Array, IxDyn};

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Nchw,
    Nhwc,
}

/// Batch-of-one `u8` tensor, raw pixel values.
pub fn to_u8_tensor(frame: &RgbFrame, layout: Layout) -> anyhow::Result<Array<u8, IxDyn>> {
    let (w, h) = (frame.width as usize, frame.height as usize);
    match layout {
        Layout::Nhwc => Ok(Array::from_shape_vec(
            IxDyn(&[1, h, w, 3]),
            frame.pixels.clone(),
        )?),
        Layout::Nchw => {
            let spatial = w * h;
            let mut planar = vec![0u8; 3 * spatial];
            for (i, px) in frame.pixels.chunks_exact(3).enumerate() {
                planar[i] = px[0];
                planar[i + spatial] = px[1];
                planar[i + 2 * spatial] = px[2];
            }
            Ok(Array::from_shape_vec(IxDyn(&[1, 3, h, w]), planar)?)
        }
    }
}

/// Batch-of-one `f32` tensor, `(x / 255 - mean) / std` per channel.
pub fn to_f32_tensor(frame: &RgbFrame, layout: Layout) -> anyhow::Result<Array<f32, IxDyn>> {
    let (w, h) = (frame.width as usize, frame.height as usize);
    let spatial = w * h;
    let mut output = vec![0.0f32; 3 * spatial];

    for (i, px) in frame.pixels.chunks_exact(3).enumerate() {
        for c in 0..3 {
            let v = (px[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            let idx = match layout {
                Layout::Nchw => i + c * spatial,
                Layout::Nhwc => i * 3 + c,
            };
            output[idx] = v;
        }
    }

    let shape = match layout {
        Layout::Nchw => [1, 3, h, w],
        Layout::Nhwc => [1, h, w, 3],
    };
    Ok(Array::from_shape_vec(IxDyn(&shape), output)?)
}

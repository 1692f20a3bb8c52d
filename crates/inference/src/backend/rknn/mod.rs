mod sys;

use super::InferenceBackend;
use crate::tensor::{QuantType, TensorAttr, TensorFormat, TensorType};
use preprocess::RgbFrame;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use thiserror::Error;

/// A failed call into the vendor runtime.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{call} fail! ret={code} ({})", error_name(*code))]
pub struct RknnError {
    pub call: &'static str,
    pub code: i32,
}

pub fn error_name(code: i32) -> &'static str {
    match code {
        sys::RKNN_ERR_FAIL => "RKNN_ERR_FAIL",
        sys::RKNN_ERR_TIMEOUT => "RKNN_ERR_TIMEOUT",
        sys::RKNN_ERR_DEVICE_UNAVAILABLE => "RKNN_ERR_DEVICE_UNAVAILABLE",
        sys::RKNN_ERR_MALLOC_FAIL => "RKNN_ERR_MALLOC_FAIL",
        sys::RKNN_ERR_PARAM_INVALID => "RKNN_ERR_PARAM_INVALID",
        sys::RKNN_ERR_MODEL_INVALID => "RKNN_ERR_MODEL_INVALID",
        sys::RKNN_ERR_CTX_INVALID => "RKNN_ERR_CTX_INVALID",
        sys::RKNN_ERR_INPUT_INVALID => "RKNN_ERR_INPUT_INVALID",
        sys::RKNN_ERR_OUTPUT_INVALID => "RKNN_ERR_OUTPUT_INVALID",
        sys::RKNN_ERR_DEVICE_UNMATCH => "RKNN_ERR_DEVICE_UNMATCH",
        sys::RKNN_ERR_INCOMPATILE_PRE_COMPILE_MODEL => "RKNN_ERR_INCOMPATILE_PRE_COMPILE_MODEL",
        sys::RKNN_ERR_INCOMPATILE_OPTIMIZATION_LEVEL_VERSION => {
            "RKNN_ERR_INCOMPATILE_OPTIMIZATION_LEVEL_VERSION"
        }
        sys::RKNN_ERR_TARGET_PLATFORM_UNMATCH => "RKNN_ERR_TARGET_PLATFORM_UNMATCH",
        sys::RKNN_ERR_NON_PRE_COMPILED_MODEL_ON_MINI_DRIVER => {
            "RKNN_ERR_NON_PRE_COMPILED_MODEL_ON_MINI_DRIVER"
        }
        _ => "unknown error",
    }
}

fn check(call: &'static str, ret: c_int) -> Result<(), RknnError> {
    if ret < sys::RKNN_SUCC {
        Err(RknnError { call, code: ret })
    } else {
        Ok(())
    }
}

/// Owns an initialized context; destroys it on drop.
struct Context(sys::rknn_context);

impl Context {
    fn query<T>(&self, cmd: sys::rknn_query_cmd, info: &mut T) -> Result<(), RknnError> {
        let ret = unsafe {
            sys::rknn_query(
                self.0,
                cmd,
                info as *mut T as *mut c_void,
                std::mem::size_of::<T>() as u32,
            )
        };
        if ret != sys::RKNN_SUCC {
            return Err(RknnError {
                call: "rknn_query",
                code: ret,
            });
        }
        Ok(())
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let ret = unsafe { sys::rknn_destroy(self.0) };
        if ret < sys::RKNN_SUCC {
            tracing::warn!(ret, "rknn_destroy failed");
        }
    }
}

/// Output buffers handed out by `rknn_outputs_get`; released on drop.
struct Outputs<'a> {
    ctx: &'a Context,
    raw: Vec<sys::rknn_output>,
}

impl Outputs<'_> {
    fn to_f32(&self) -> Vec<Vec<f32>> {
        self.raw
            .iter()
            .map(|o| {
                if o.buf.is_null() {
                    return Vec::new();
                }
                let len = o.size as usize / std::mem::size_of::<f32>();
                // SAFETY: want_float was set, so the runtime filled `size` bytes of f32
                unsafe { std::slice::from_raw_parts(o.buf as *const f32, len) }.to_vec()
            })
            .collect()
    }
}

impl Drop for Outputs<'_> {
    fn drop(&mut self) {
        let ret = unsafe {
            sys::rknn_outputs_release(self.ctx.0, self.raw.len() as u32, self.raw.as_mut_ptr())
        };
        if ret < sys::RKNN_SUCC {
            tracing::warn!(ret, "rknn_outputs_release failed");
        }
    }
}

pub struct RknnBackend {
    // Declared before `_model` so the context is destroyed before the blob is freed
    ctx: Context,
    _model: Vec<u8>,
    input_attrs: Vec<TensorAttr>,
    output_attrs: Vec<TensorAttr>,
    sdk_version: Option<String>,
    // The runtime may read from the submitted buffer until the next run
    input: Vec<u8>,
}

impl InferenceBackend for RknnBackend {
    fn load_model(model: &[u8]) -> anyhow::Result<Self> {
        let mut blob = model.to_vec();
        let mut raw_ctx: sys::rknn_context = 0;

        check("rknn_init", unsafe {
            sys::rknn_init(
                &mut raw_ctx,
                blob.as_mut_ptr() as *mut c_void,
                blob.len() as u32,
                0,
            )
        })?;
        let ctx = Context(raw_ctx);

        let mut io_num = sys::rknn_input_output_num::default();
        ctx.query(sys::RKNN_QUERY_IN_OUT_NUM, &mut io_num)?;

        let mut input_attrs = Vec::with_capacity(io_num.n_input as usize);
        for i in 0..io_num.n_input {
            let mut raw = sys::rknn_tensor_attr::zeroed(i);
            ctx.query(sys::RKNN_QUERY_INPUT_ATTR, &mut raw)?;
            input_attrs.push(TensorAttr::from(&raw));
        }

        let mut output_attrs = Vec::with_capacity(io_num.n_output as usize);
        for i in 0..io_num.n_output {
            let mut raw = sys::rknn_tensor_attr::zeroed(i);
            ctx.query(sys::RKNN_QUERY_OUTPUT_ATTR, &mut raw)?;
            output_attrs.push(TensorAttr::from(&raw));
        }

        let mut version = sys::rknn_sdk_version {
            api_version: [0; 256],
            drv_version: [0; 256],
        };
        // Older drivers do not answer this query; it is informational only
        let sdk_version = match ctx.query(sys::RKNN_QUERY_SDK_VERSION, &mut version) {
            Ok(()) => Some(format!(
                "api {} driver {}",
                c_name(&version.api_version),
                c_name(&version.drv_version)
            )),
            Err(e) => {
                tracing::debug!(error = %e, "SDK version query not supported");
                None
            }
        };

        Ok(Self {
            ctx,
            _model: blob,
            input_attrs,
            output_attrs,
            sdk_version,
            input: Vec::new(),
        })
    }

    fn input_attrs(&self) -> &[TensorAttr] {
        &self.input_attrs
    }

    fn output_attrs(&self) -> &[TensorAttr] {
        &self.output_attrs
    }

    fn sdk_version(&self) -> Option<String> {
        self.sdk_version.clone()
    }

    fn set_input(&mut self, frame: &RgbFrame) -> anyhow::Result<()> {
        self.input.clear();
        self.input.extend_from_slice(&frame.pixels);

        let mut inputs = [sys::rknn_input {
            index: 0,
            buf: self.input.as_mut_ptr() as *mut c_void,
            size: self.input.len() as u32,
            pass_through: 0,
            type_: sys::RKNN_TENSOR_UINT8,
            fmt: sys::RKNN_TENSOR_NHWC,
        }];

        check("rknn_input_set", unsafe {
            sys::rknn_inputs_set(self.ctx.0, inputs.len() as u32, inputs.as_mut_ptr())
        })?;
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<()> {
        check("rknn_run", unsafe { sys::rknn_run(self.ctx.0, ptr::null_mut()) })?;
        Ok(())
    }

    fn outputs(&mut self) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut raw: Vec<sys::rknn_output> = (0..self.output_attrs.len() as u32)
            .map(|index| sys::rknn_output {
                want_float: 1,
                is_prealloc: 0,
                index,
                buf: ptr::null_mut(),
                size: 0,
            })
            .collect();

        check("rknn_outputs_get", unsafe {
            sys::rknn_outputs_get(
                self.ctx.0,
                raw.len() as u32,
                raw.as_mut_ptr(),
                ptr::null_mut(),
            )
        })?;

        let outputs = Outputs { ctx: &self.ctx, raw };
        Ok(outputs.to_f32())
    }
}

fn c_name(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl From<&sys::rknn_tensor_attr> for TensorAttr {
    fn from(raw: &sys::rknn_tensor_attr) -> Self {
        let n_dims = (raw.n_dims as usize).min(sys::RKNN_MAX_DIMS);
        TensorAttr {
            index: raw.index,
            name: c_name(&raw.name),
            dims: raw.dims[..n_dims].iter().rev().map(|&d| d as i64).collect(),
            n_elems: raw.n_elems,
            size: raw.size,
            fmt: match raw.fmt {
                sys::RKNN_TENSOR_NCHW => TensorFormat::Nchw,
                sys::RKNN_TENSOR_NHWC => TensorFormat::Nhwc,
                _ => TensorFormat::Undefined,
            },
            dtype: match raw.type_ {
                sys::RKNN_TENSOR_FLOAT32 => TensorType::F32,
                sys::RKNN_TENSOR_FLOAT16 => TensorType::F16,
                sys::RKNN_TENSOR_INT8 => TensorType::I8,
                sys::RKNN_TENSOR_UINT8 => TensorType::U8,
                sys::RKNN_TENSOR_INT16 => TensorType::I16,
                _ => TensorType::Other,
            },
            qnt_type: match raw.qnt_type {
                sys::RKNN_TENSOR_QNT_DFP => QuantType::Dfp,
                sys::RKNN_TENSOR_QNT_AFFINE_ASYMMETRIC => QuantType::Affine,
                _ => QuantType::None,
            },
            fl: raw.fl,
            zp: raw.zp as i32,
            scale: raw.scale,
        }
    }
}

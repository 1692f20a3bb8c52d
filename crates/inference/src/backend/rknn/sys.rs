//! Raw declarations for the RKNN C API (`rknn_api.h`, toolkit 1.x).
#![allow(non_camel_case_types, dead_code)]

use std::os::raw::{c_char, c_int, c_void};

pub type rknn_context = u64;

pub const RKNN_SUCC: c_int = 0;
pub const RKNN_ERR_FAIL: c_int = -1;
pub const RKNN_ERR_TIMEOUT: c_int = -2;
pub const RKNN_ERR_DEVICE_UNAVAILABLE: c_int = -3;
pub const RKNN_ERR_MALLOC_FAIL: c_int = -4;
pub const RKNN_ERR_PARAM_INVALID: c_int = -5;
pub const RKNN_ERR_MODEL_INVALID: c_int = -6;
pub const RKNN_ERR_CTX_INVALID: c_int = -7;
pub const RKNN_ERR_INPUT_INVALID: c_int = -8;
pub const RKNN_ERR_OUTPUT_INVALID: c_int = -9;
pub const RKNN_ERR_DEVICE_UNMATCH: c_int = -10;
pub const RKNN_ERR_INCOMPATILE_PRE_COMPILE_MODEL: c_int = -11;
pub const RKNN_ERR_INCOMPATILE_OPTIMIZATION_LEVEL_VERSION: c_int = -12;
pub const RKNN_ERR_TARGET_PLATFORM_UNMATCH: c_int = -13;
pub const RKNN_ERR_NON_PRE_COMPILED_MODEL_ON_MINI_DRIVER: c_int = -14;

pub const RKNN_MAX_DIMS: usize = 16;
pub const RKNN_MAX_NAME_LEN: usize = 256;

pub type rknn_query_cmd = u32;
pub const RKNN_QUERY_IN_OUT_NUM: rknn_query_cmd = 0;
pub const RKNN_QUERY_INPUT_ATTR: rknn_query_cmd = 1;
pub const RKNN_QUERY_OUTPUT_ATTR: rknn_query_cmd = 2;
pub const RKNN_QUERY_SDK_VERSION: rknn_query_cmd = 5;

pub type rknn_tensor_type = u32;
pub const RKNN_TENSOR_FLOAT32: rknn_tensor_type = 0;
pub const RKNN_TENSOR_FLOAT16: rknn_tensor_type = 1;
pub const RKNN_TENSOR_INT8: rknn_tensor_type = 2;
pub const RKNN_TENSOR_UINT8: rknn_tensor_type = 3;
pub const RKNN_TENSOR_INT16: rknn_tensor_type = 4;

pub type rknn_tensor_qnt_type = u32;
pub const RKNN_TENSOR_QNT_NONE: rknn_tensor_qnt_type = 0;
pub const RKNN_TENSOR_QNT_DFP: rknn_tensor_qnt_type = 1;
pub const RKNN_TENSOR_QNT_AFFINE_ASYMMETRIC: rknn_tensor_qnt_type = 2;

pub type rknn_tensor_format = u32;
pub const RKNN_TENSOR_NCHW: rknn_tensor_format = 0;
pub const RKNN_TENSOR_NHWC: rknn_tensor_format = 1;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct rknn_input_output_num {
    pub n_input: u32,
    pub n_output: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct rknn_tensor_attr {
    pub index: u32,
    pub n_dims: u32,
    /// Innermost dimension first
    pub dims: [u32; RKNN_MAX_DIMS],
    pub name: [c_char; RKNN_MAX_NAME_LEN],
    pub n_elems: u32,
    pub size: u32,
    pub fmt: rknn_tensor_format,
    pub type_: rknn_tensor_type,
    pub qnt_type: rknn_tensor_qnt_type,
    pub fl: i8,
    pub zp: u32,
    pub scale: f32,
}

impl rknn_tensor_attr {
    pub fn zeroed(index: u32) -> Self {
        Self {
            index,
            n_dims: 0,
            dims: [0; RKNN_MAX_DIMS],
            name: [0; RKNN_MAX_NAME_LEN],
            n_elems: 0,
            size: 0,
            fmt: 0,
            type_: 0,
            qnt_type: 0,
            fl: 0,
            zp: 0,
            scale: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct rknn_sdk_version {
    pub api_version: [c_char; 256],
    pub drv_version: [c_char; 256],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rknn_input {
    pub index: u32,
    pub buf: *mut c_void,
    pub size: u32,
    pub pass_through: u8,
    pub type_: rknn_tensor_type,
    pub fmt: rknn_tensor_format,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rknn_output {
    pub want_float: u8,
    pub is_prealloc: u8,
    pub index: u32,
    pub buf: *mut c_void,
    pub size: u32,
}

unsafe extern "C" {
    pub fn rknn_init(
        context: *mut rknn_context,
        model: *mut c_void,
        size: u32,
        flag: u32,
    ) -> c_int;

    pub fn rknn_destroy(context: rknn_context) -> c_int;

    pub fn rknn_query(
        context: rknn_context,
        cmd: rknn_query_cmd,
        info: *mut c_void,
        size: u32,
    ) -> c_int;

    pub fn rknn_inputs_set(context: rknn_context, n_inputs: u32, inputs: *mut rknn_input) -> c_int;

    pub fn rknn_run(context: rknn_context, extend: *mut c_void) -> c_int;

    pub fn rknn_outputs_get(
        context: rknn_context,
        n_outputs: u32,
        outputs: *mut rknn_output,
        extend: *mut c_void,
    ) -> c_int;

    pub fn rknn_outputs_release(
        context: rknn_context,
        n_outputs: u32,
        outputs: *mut rknn_output,
    ) -> c_int;
}

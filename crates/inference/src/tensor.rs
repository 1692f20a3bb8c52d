use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorFormat {
    Nchw,
    Nhwc,
    Undefined,
}

impl TensorFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TensorFormat::Nchw => "NCHW",
            TensorFormat::Nhwc => "NHWC",
            TensorFormat::Undefined => "UNDEFINED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorType {
    F32,
    F16,
    I8,
    U8,
    I16,
    Other,
}

impl TensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TensorType::F32 => "FP32",
            TensorType::F16 => "FP16",
            TensorType::I8 => "INT8",
            TensorType::U8 => "UINT8",
            TensorType::I16 => "INT16",
            TensorType::Other => "OTHER",
        }
    }

    pub fn byte_width(&self) -> usize {
        match self {
            TensorType::F32 => 4,
            TensorType::F16 | TensorType::I16 => 2,
            TensorType::I8 | TensorType::U8 => 1,
            TensorType::Other => 0,
        }
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantType {
    None,
    /// Dynamic fixed point, `fl` fractional bits
    Dfp,
    /// `(q - zp) * scale`
    Affine,
}

impl QuantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantType::None => "NONE",
            QuantType::Dfp => "DFP",
            QuantType::Affine => "AFFINE",
        }
    }
}

/// Shape, element type and quantization of one model input or output.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorAttr {
    pub index: u32,
    pub name: String,
    /// Outermost dimension first; dynamic dimensions are negative
    pub dims: Vec<i64>,
    pub n_elems: u32,
    /// Size in bytes
    pub size: u32,
    pub fmt: TensorFormat,
    pub dtype: TensorType,
    pub qnt_type: QuantType,
    pub fl: i8,
    pub zp: i32,
    pub scale: f32,
}

impl TensorAttr {
    /// Unquantized tensor with the layout guessed from the shape.
    pub fn unquantized(index: u32, name: impl Into<String>, dims: Vec<i64>, dtype: TensorType) -> Self {
        let n_elems = if dims.iter().all(|&d| d > 0) {
            dims.iter().product::<i64>() as u32
        } else {
            0
        };
        Self {
            index,
            name: name.into(),
            fmt: guess_format(&dims),
            n_elems,
            size: n_elems * dtype.byte_width() as u32,
            dims,
            dtype,
            qnt_type: QuantType::None,
            fl: 0,
            zp: 0,
            scale: 1.0,
        }
    }

    /// `(width, height)` of a 4-D RGB tensor, when both are known and the
    /// channel axis named by `fmt` holds 3.
    pub fn spatial_size(&self) -> Option<(u32, u32)> {
        let &[_, d1, d2, d3] = self.dims.as_slice() else {
            return None;
        };
        let (w, h) = match self.fmt {
            TensorFormat::Nhwc if d3 == 3 => (d2, d1),
            TensorFormat::Nchw if d1 == 3 => (d3, d2),
            _ => return None,
        };
        if w > 0 && h > 0 {
            Some((w as u32, h as u32))
        } else {
            None
        }
    }
}

/// Infer the layout of a 4-D image tensor from where its 3 channels sit.
pub fn guess_format(dims: &[i64]) -> TensorFormat {
    match dims {
        [_, 3, _, _] => TensorFormat::Nchw,
        [_, _, _, 3] => TensorFormat::Nhwc,
        _ => TensorFormat::Undefined,
    }
}

impl fmt::Display for TensorAttr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dims = self
            .dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            f,
            "index={} name={} n_dims={} dims=[{}] n_elems={} size={} fmt={} type={} qnt_type={} fl={} zp={} scale={:.6}",
            self.index,
            self.name,
            self.dims.len(),
            dims,
            self.n_elems,
            self.size,
            self.fmt.as_str(),
            self.dtype.as_str(),
            self.qnt_type.as_str(),
            self.fl,
            self.zp,
            self.scale
        )
    }
}

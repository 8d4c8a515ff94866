//! Owned host tensors exchanged with a [`Session`](crate::Session).

use crate::error::OnnxError;

/// Element type of a graph input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Float32,
    Int64,
    /// Any type this crate does not exchange.
    Other,
}

/// Tensor payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    I64(Vec<i64>),
}

/// N-dimensional tensor held in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<i64>,
    data: TensorData,
}

fn check_shape(shape: &[i64], len: usize) -> Result<(), OnnxError> {
    if shape.iter().any(|&d| d < 0) {
        return Err(OnnxError::Shape {
            shape: shape.to_vec(),
            expected: 0,
            actual: len,
        });
    }
    let expected: usize = shape.iter().map(|&d| d as usize).product();
    if expected != len {
        return Err(OnnxError::Shape {
            shape: shape.to_vec(),
            expected,
            actual: len,
        });
    }
    Ok(())
}

impl Tensor {
    /// Creates a float32 tensor with the given shape and data.
    pub fn new(shape: &[i64], data: &[f32]) -> Result<Self, OnnxError> {
        Self::from_f32(shape, data.to_vec())
    }

    /// Creates a float32 tensor, taking ownership of `data`.
    pub fn from_f32(shape: &[i64], data: Vec<f32>) -> Result<Self, OnnxError> {
        if data.is_empty() {
            return Err(OnnxError::EmptyData);
        }
        check_shape(shape, data.len())?;
        Ok(Self {
            shape: shape.to_vec(),
            data: TensorData::F32(data),
        })
    }

    /// Creates an int64 tensor, taking ownership of `data`.
    pub fn from_i64(shape: &[i64], data: Vec<i64>) -> Result<Self, OnnxError> {
        if data.is_empty() {
            return Err(OnnxError::EmptyData);
        }
        check_shape(shape, data.len())?;
        Ok(Self {
            shape: shape.to_vec(),
            data: TensorData::I64(data),
        })
    }

    /// Returns the tensor dimensions.
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Returns the element type.
    pub fn element_type(&self) -> ElementType {
        match self.data {
            TensorData::F32(_) => ElementType::Float32,
            TensorData::I64(_) => ElementType::Int64,
        }
    }

    /// Returns the payload.
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Returns the float32 data, or an error for other element types.
    pub fn float_data(&self) -> Result<&[f32], OnnxError> {
        match &self.data {
            TensorData::F32(v) => Ok(v),
            TensorData::I64(_) => Err(OnnxError::Runtime("tensor is int64, not float32".into())),
        }
    }

    /// Consumes the tensor, returning its float32 data.
    pub fn into_float_data(self) -> Result<Vec<f32>, OnnxError> {
        match self.data {
            TensorData::F32(v) => Ok(v),
            TensorData::I64(_) => Err(OnnxError::Runtime("tensor is int64, not float32".into())),
        }
    }

    /// Returns the int64 data, or an error for other element types.
    pub fn i64_data(&self) -> Result<&[i64], OnnxError> {
        match &self.data {
            TensorData::I64(v) => Ok(v),
            TensorData::F32(_) => Err(OnnxError::Runtime("tensor is float32, not int64".into())),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match &self.data {
            TensorData::F32(v) => v.len(),
            TensorData::I64(v) => v.len(),
        }
    }

    /// Always false for a constructed tensor.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn from_parts(shape: Vec<i64>, data: TensorData) -> Self {
        Self { shape, data }
    }
}

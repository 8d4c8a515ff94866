use thiserror::Error;

/// Errors returned by ONNX Runtime operations.
#[derive(Debug, Error)]
pub enum OnnxError {
    #[error("onnx: {0}")]
    Runtime(String),

    #[error("onnx: empty data")]
    EmptyData,

    #[error("onnx: shape {shape:?} needs {expected} element(s), got {actual}")]
    Shape {
        shape: Vec<i64>,
        expected: usize,
        actual: usize,
    },
}

//! Safe ONNX Runtime sessions for the voice conversion models.
//!
//! This crate wraps the `ort` bindings with owned host tensors, so callers
//! exchange plain `Vec<f32>` / `Vec<i64>` buffers and never touch runtime
//! values directly. Sessions expose their declared inputs and outputs,
//! which lets callers discover optional inputs and parameter tensors.
//!
//! # Usage
//!
//! ```no_run
//! use rvc_onnx::{Session, SessionOptions, Tensor};
//!
//! let session = Session::from_file("hubert_base.onnx", &SessionOptions::default()).unwrap();
//! let audio = vec![0.0f32; 16000];
//! let input = Tensor::new(&[1, 16000], &audio).unwrap();
//! let outputs = session.run(&[("source", &input)], &["embed"]).unwrap();
//! let features = outputs[0].float_data().unwrap();
//! ```
//!
//! # Runtime Library
//!
//! ONNX Runtime binaries are fetched and linked by `ort` at build time.

mod error;
mod onnx;
mod tensor;

pub use error::OnnxError;
pub use onnx::{IoSpec, Session, SessionOptions};
pub use tensor::{ElementType, Tensor, TensorData};

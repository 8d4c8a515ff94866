//! Safe wrapper around an ONNX Runtime inference session.

use std::path::Path;

use ort::session::Session as OrtSession;
use ort::session::builder::GraphOptimizationLevel;
use ort::tensor::TensorElementType;
use ort::value::{DynValue, Tensor as OrtTensor, ValueType};
use tracing::debug;

use crate::error::OnnxError;
use crate::tensor::{ElementType, Tensor, TensorData};

fn runtime(context: &str, e: impl std::fmt::Display) -> OnnxError {
    OnnxError::Runtime(format!("{context}: {e}"))
}

/// Options applied when a session is created.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Threads used within a single operator; 0 lets the runtime decide.
    pub intra_threads: usize,
}

/// Name, element type and declared dimensions of a graph input or output.
///
/// Dynamic dimensions are reported as `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoSpec {
    pub name: String,
    pub element_type: ElementType,
    pub dims: Vec<i64>,
}

fn io_spec(name: &str, value_type: &ValueType) -> IoSpec {
    let (element_type, dims) = match value_type {
        ValueType::Tensor { ty, dimensions, .. } => {
            let et = match ty {
                TensorElementType::Float32 => ElementType::Float32,
                TensorElementType::Int64 => ElementType::Int64,
                _ => ElementType::Other,
            };
            (et, dimensions.clone())
        }
        _ => (ElementType::Other, Vec::new()),
    };
    IoSpec {
        name: name.to_string(),
        element_type,
        dims,
    }
}

/// Holds a loaded ONNX model.
pub struct Session {
    session: OrtSession,
    inputs: Vec<IoSpec>,
    outputs: Vec<IoSpec>,
}

impl Session {
    /// Loads a model from an `.onnx` file.
    pub fn from_file(path: impl AsRef<Path>, opts: &SessionOptions) -> Result<Self, OnnxError> {
        let path = path.as_ref();
        let mut builder = OrtSession::builder()
            .map_err(|e| runtime("create session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| runtime("set optimization level", e))?;
        if opts.intra_threads > 0 {
            builder = builder
                .with_intra_threads(opts.intra_threads)
                .map_err(|e| runtime("set intra threads", e))?;
        }
        let session = builder
            .commit_from_file(path)
            .map_err(|e| runtime(&format!("load {}", path.display()), e))?;
        Ok(Self::wrap(session, &path.display().to_string()))
    }

    fn wrap(session: OrtSession, origin: &str) -> Self {
        let inputs: Vec<IoSpec> = session
            .inputs
            .iter()
            .map(|i| io_spec(&i.name, &i.input_type))
            .collect();
        let outputs: Vec<IoSpec> = session
            .outputs
            .iter()
            .map(|o| io_spec(&o.name, &o.output_type))
            .collect();
        debug!(
            "loaded {origin}: {} input(s), {} output(s)",
            inputs.len(),
            outputs.len()
        );
        Self {
            session,
            inputs,
            outputs,
        }
    }

    /// Declared graph inputs, in graph order.
    pub fn inputs(&self) -> &[IoSpec] {
        &self.inputs
    }

    /// Declared graph outputs, in graph order.
    pub fn outputs(&self) -> &[IoSpec] {
        &self.outputs
    }

    /// Looks up a declared input by name.
    pub fn input(&self, name: &str) -> Option<&IoSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Runs inference with named inputs and returns the named outputs in order.
    pub fn run(
        &self,
        inputs: &[(&str, &Tensor)],
        output_names: &[&str],
    ) -> Result<Vec<Tensor>, OnnxError> {
        let mut values: Vec<(&str, DynValue)> = Vec::with_capacity(inputs.len());
        for (name, tensor) in inputs {
            values.push((*name, to_ort(tensor)?));
        }

        let mut outputs = self
            .session
            .run(values)
            .map_err(|e| runtime("run", e))?;

        let mut result = Vec::with_capacity(output_names.len());
        for name in output_names {
            let value = outputs
                .remove(*name)
                .ok_or_else(|| OnnxError::Runtime(format!("missing output {name:?}")))?;
            result.push(from_ort(name, &value)?);
        }
        Ok(result)
    }
}

fn to_ort(tensor: &Tensor) -> Result<DynValue, OnnxError> {
    let shape: Vec<usize> = tensor.shape().iter().map(|&d| d as usize).collect();
    let value = match tensor.data() {
        TensorData::F32(v) => OrtTensor::<f32>::from_array((shape, v.clone().into_boxed_slice()))
            .map_err(|e| runtime("create f32 tensor", e))?
            .into_dyn(),
        TensorData::I64(v) => OrtTensor::<i64>::from_array((shape, v.clone().into_boxed_slice()))
            .map_err(|e| runtime("create i64 tensor", e))?
            .into_dyn(),
    };
    Ok(value)
}

fn from_ort(name: &str, value: &DynValue) -> Result<Tensor, OnnxError> {
    if let Ok((shape, data)) = value.try_extract_raw_tensor::<f32>() {
        return Ok(Tensor::from_parts(shape.to_vec(), TensorData::F32(data.to_vec())));
    }
    if let Ok((shape, data)) = value.try_extract_raw_tensor::<i64>() {
        return Ok(Tensor::from_parts(shape.to_vec(), TensorData::I64(data.to_vec())));
    }
    Err(OnnxError::Runtime(format!(
        "output {name:?} is neither float32 nor int64"
    )))
}

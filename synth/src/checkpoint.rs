//! Checkpoint container: safetensors layout with record metadata.
//!
//! ```text
//! [u64 LE header length]
//! [JSON header: {"__metadata__": {"sr": "40k", "f0": "1", "config": "[...]", "version": "v2"},
//!                "<weight name>": {"dtype": "F32", "shape": [..], "data_offsets": [s, e]}, ...}]
//! [raw little-endian tensor data]
//! ```
//!
//! Every tensor entry is a synthesis network weight. F16 and BF16 tensors
//! are widened to f32 on access.
//!
//! PyTorch pickles (zip archives or the legacy pickle stream) are not read;
//! they must be re-saved in this layout first. Such files are recognized by
//! their leading bytes and rejected with a message saying so.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SynthError;

const METADATA_KEY: &str = "__metadata__";

/// Upper bound on the JSON header, guarding against corrupt length fields.
const MAX_HEADER_LEN: u64 = 100 * 1024 * 1024;

/// Local file header of a zip archive, the container `torch.save` writes.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Opening of a legacy `torch.save` stream: protocol 2, then the magic long.
const LEGACY_MAGIC: &[u8] = &[0x80, 0x02, 0x8a, 0x0a];

/// Element type of a stored weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    F32,
    F16,
    BF16,
}

impl DType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "F32" => Some(DType::F32),
            "F16" => Some(DType::F16),
            "BF16" => Some(DType::BF16),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 | DType::BF16 => 2,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DType::F32 => "F32",
            DType::F16 => "F16",
            DType::BF16 => "BF16",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TensorHeader {
    dtype: String,
    shape: Vec<usize>,
    data_offsets: [usize; 2],
}

#[derive(Debug, Clone)]
struct TensorEntry {
    dtype: DType,
    shape: Vec<usize>,
    start: usize,
    end: usize,
}

/// A named weight tensor widened to f32.
#[derive(Debug, Clone, PartialEq)]
pub struct Weight {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl Weight {
    /// Creates a weight, checking that `data` fills `shape`.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, SynthError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(SynthError::InvalidCheckpoint(format!(
                "weight shape {shape:?} needs {expected} value(s), got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }
}

/// A parsed checkpoint record.
#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    metadata: BTreeMap<String, String>,
    tensors: BTreeMap<String, TensorEntry>,
    data: Vec<u8>,
}

fn invalid(path: &Path, reason: impl std::fmt::Display) -> SynthError {
    SynthError::InvalidCheckpoint(format!("{}: {reason}", path.display()))
}

impl Checkpoint {
    /// Reads and validates a checkpoint file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SynthError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SynthError::MissingFile(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|source| SynthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, bytes)
    }

    fn parse(path: &Path, bytes: Vec<u8>) -> Result<Self, SynthError> {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(LEGACY_MAGIC) {
            return Err(invalid(
                path,
                "PyTorch pickle checkpoint; re-save it in safetensors layout with its metadata",
            ));
        }
        let len_bytes: [u8; 8] = bytes
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| invalid(path, "file too short for header length"))?;
        let header_len = u64::from_le_bytes(len_bytes);
        if header_len > MAX_HEADER_LEN || 8 + header_len > bytes.len() as u64 {
            return Err(invalid(path, format!("header length {header_len} out of range")));
        }
        let header_end = 8 + header_len as usize;

        let header: BTreeMap<String, serde_json::Value> =
            serde_json::from_slice(&bytes[8..header_end])
                .map_err(|e| invalid(path, format!("header is not a JSON object: {e}")))?;

        let data = bytes[header_end..].to_vec();
        let mut metadata = BTreeMap::new();
        let mut tensors = BTreeMap::new();

        for (name, value) in header {
            if name == METADATA_KEY {
                metadata = serde_json::from_value(value)
                    .map_err(|e| invalid(path, format!("{METADATA_KEY}: {e}")))?;
                continue;
            }
            let th: TensorHeader = serde_json::from_value(value)
                .map_err(|e| invalid(path, format!("tensor {name:?}: {e}")))?;
            let dtype = DType::parse(&th.dtype)
                .ok_or_else(|| invalid(path, format!("tensor {name:?}: unsupported dtype {}", th.dtype)))?;
            let [start, end] = th.data_offsets;
            let count: usize = th.shape.iter().product();
            if start > end || end > data.len() || end - start != count * dtype.size() {
                return Err(invalid(
                    path,
                    format!("tensor {name:?}: offsets [{start}, {end}] do not fit shape {:?}", th.shape),
                ));
            }
            tensors.insert(
                name,
                TensorEntry {
                    dtype,
                    shape: th.shape,
                    start,
                    end,
                },
            );
        }

        debug!(
            "checkpoint {}: {} weight(s), metadata keys {:?}",
            path.display(),
            tensors.len(),
            metadata.keys().collect::<Vec<_>>()
        );
        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            tensors,
            data,
        })
    }

    /// File the checkpoint was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record-level string metadata (`sr`, `f0`, `config`, `version`).
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Names of all stored weights, sorted.
    pub fn weight_names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Number of stored weights.
    pub fn weight_count(&self) -> usize {
        self.tensors.len()
    }

    /// Stored element type and shape of a weight, without decoding it.
    pub fn weight_info(&self, name: &str) -> Option<(DType, &[usize])> {
        self.tensors
            .get(name)
            .map(|entry| (entry.dtype, entry.shape.as_slice()))
    }

    /// Decodes one weight to f32.
    pub fn weight(&self, name: &str) -> Option<Weight> {
        let entry = self.tensors.get(name)?;
        let raw = &self.data[entry.start..entry.end];
        let data = match entry.dtype {
            DType::F32 => raw
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            DType::F16 => raw
                .chunks_exact(2)
                .map(|c| f16_to_f32(u16::from_le_bytes([c[0], c[1]])))
                .collect(),
            DType::BF16 => raw
                .chunks_exact(2)
                .map(|c| f32::from_bits((u16::from_le_bytes([c[0], c[1]]) as u32) << 16))
                .collect(),
        };
        Some(Weight {
            shape: entry.shape.clone(),
            data,
        })
    }
}

/// IEEE 754 half to single precision.
fn f16_to_f32(h: u16) -> f32 {
    let sign = ((h & 0x8000) as u32) << 16;
    let exp = ((h >> 10) & 0x1F) as u32;
    let mant = (h & 0x03FF) as u32;
    let bits = match (exp, mant) {
        (0, 0) => sign,
        (0, _) => {
            // Subnormal: renormalize.
            let mut e: i32 = -14;
            let mut m = mant;
            while m & 0x0400 == 0 {
                m <<= 1;
                e -= 1;
            }
            sign | (((e + 127) as u32) << 23) | ((m & 0x03FF) << 13)
        }
        (0x1F, 0) => sign | 0x7F80_0000,
        (0x1F, _) => sign | 0x7FC0_0000 | (mant << 13),
        _ => sign | ((exp + 127 - 15) << 23) | (mant << 13),
    };
    f32::from_bits(bits)
}

/// Writes a checkpoint with f32 weights.
///
/// `metadata` becomes the `__metadata__` header section.
pub fn save_checkpoint(
    path: impl AsRef<Path>,
    metadata: &BTreeMap<String, String>,
    weights: &BTreeMap<String, Weight>,
) -> Result<(), SynthError> {
    let path = path.as_ref();
    let mut header = serde_json::Map::new();
    if !metadata.is_empty() {
        let meta = serde_json::to_value(metadata)
            .map_err(|e| invalid(path, format!("metadata: {e}")))?;
        header.insert(METADATA_KEY.to_string(), meta);
    }

    let mut raw = Vec::new();
    for (name, weight) in weights {
        let start = raw.len();
        for v in &weight.data {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let th = TensorHeader {
            dtype: "F32".to_string(),
            shape: weight.shape.clone(),
            data_offsets: [start, raw.len()],
        };
        let value = serde_json::to_value(th).map_err(|e| invalid(path, format!("{name}: {e}")))?;
        header.insert(name.clone(), value);
    }

    let json = serde_json::to_vec(&header).map_err(|e| invalid(path, e))?;
    let mut out = Vec::with_capacity(8 + json.len() + raw.len());
    out.extend_from_slice(&(json.len() as u64).to_le_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(&raw);

    fs::write(path, out).map_err(|source| SynthError::Io {
        path: path.to_path_buf(),
        source,
    })
}

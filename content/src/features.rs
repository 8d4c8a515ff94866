use crate::error::ContentError;

/// Frame-level content features, `frames x dim`, stored row-major.
///
/// Row `t` describes the 10 ms hop starting at `t * 10 ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    frames: usize,
    dim: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    /// Wraps row-major data. `data.len()` must equal `frames * dim`.
    pub fn new(frames: usize, dim: usize, data: Vec<f32>) -> Result<Self, ContentError> {
        if frames.checked_mul(dim) != Some(data.len()) {
            return Err(ContentError::Shape {
                frames,
                dim,
                len: data.len(),
            });
        }
        Ok(Self { frames, dim, data })
    }

    /// Builds a matrix from rows, each placed into `dim` columns
    /// (zero padded or truncated).
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R], dim: usize) -> Self {
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            let row = row.as_ref();
            let n = row.len().min(dim);
            data.extend_from_slice(&row[..n]);
            data.resize(data.len() + (dim - n), 0.0);
        }
        Self {
            frames: rows.len(),
            dim,
            data,
        }
    }

    /// Number of frames (T).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Channels per frame (C).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Row-major data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns frame `t`.
    pub fn row(&self, t: usize) -> Option<&[f32]> {
        if t >= self.frames {
            return None;
        }
        Some(&self.data[t * self.dim..(t + 1) * self.dim])
    }

    /// Repeats every frame `factor` times (nearest-neighbour upsampling).
    pub fn repeat_frames(&self, factor: usize) -> Self {
        let factor = factor.max(1);
        let mut data = Vec::with_capacity(self.data.len() * factor);
        for row in self.data.chunks_exact(self.dim.max(1)) {
            for _ in 0..factor {
                data.extend_from_slice(row);
            }
        }
        Self {
            frames: self.frames * factor,
            dim: self.dim,
            data,
        }
    }

    /// Zero pads or truncates every frame to `dim` channels.
    pub fn with_dim(&self, dim: usize) -> Self {
        if dim == self.dim {
            return self.clone();
        }
        let rows: Vec<&[f32]> = (0..self.frames).filter_map(|t| self.row(t)).collect();
        Self::from_rows(&rows, dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_shape() {
        assert!(FeatureMatrix::new(2, 3, vec![0.0; 6]).is_ok());
        assert!(matches!(
            FeatureMatrix::new(2, 3, vec![0.0; 5]),
            Err(ContentError::Shape { len: 5, .. })
        ));
    }

    #[test]
    fn from_rows_pads_and_truncates() {
        let m = FeatureMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0, 5.0, 6.0]], 3);
        assert_eq!(m.frames(), 2);
        assert_eq!(m.row(0), Some(&[1.0, 2.0, 0.0][..]));
        assert_eq!(m.row(1), Some(&[3.0, 4.0, 5.0][..]));
        assert_eq!(m.row(2), None);
    }

    #[test]
    fn repeat_frames_doubles() {
        let m = FeatureMatrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let r = m.repeat_frames(2);
        assert_eq!(r.frames(), 4);
        assert_eq!(r.as_slice(), &[1.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 4.0]);
    }

    #[test]
    fn with_dim_pads() {
        let m = FeatureMatrix::new(1, 2, vec![1.0, 2.0]).unwrap();
        let p = m.with_dim(4);
        assert_eq!(p.dim(), 4);
        assert_eq!(p.as_slice(), &[1.0, 2.0, 0.0, 0.0]);
        assert_eq!(p.with_dim(1).as_slice(), &[1.0]);
    }
}

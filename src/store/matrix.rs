//! Dense, row-aligned embedding matrix.

use ndarray::{Array2, ArrayView1};

use crate::error::RecommendError;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// One fixed-length vector per catalog item, row `i` belonging to item `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Array2<f32>,
}

impl EmbeddingMatrix {
    /// Build from provider output. Every row must have the same, non-zero length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, RecommendError> {
        let dim = rows.first().map_or(0, Vec::len);
        if dim == 0 {
            return Err(RecommendError::EmbeddingUnavailable(
                "provider returned zero-length vectors".into(),
            ));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
            return Err(RecommendError::EmbeddingUnavailable(format!(
                "vector {i} has {} dimensions, expected {dim}",
                row.len()
            )));
        }

        let n = rows.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((n, dim), flat)
            .map_err(|e| RecommendError::EmbeddingUnavailable(e.to_string()))?;
        Ok(Self { data })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.data.row(index)
    }

    pub fn view(&self) -> ndarray::ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Row-major little-endian `f32` bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * F32_BYTES);
        for value in self.data.iter() {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Inverse of [`Self::to_le_bytes`]. `None` when the blob length does not
    /// match `rows * dim`.
    pub fn from_le_bytes(rows: usize, dim: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != rows.checked_mul(dim)?.checked_mul(F32_BYTES)? {
            return None;
        }
        let flat: Vec<f32> = bytes
            .chunks_exact(F32_BYTES)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Array2::from_shape_vec((rows, dim), flat)
            .ok()
            .map(|data| Self { data })
    }

    /// Element-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.data.dim() == other.data.dim()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

use crate::error::GraphError;
use serde::{Deserialize, Serialize};

/// Dense row-major matrix. Trials are stored channels × samples, graphs L × L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, GraphError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(GraphError::ShapeMismatch {
                    expected: (n_rows, n_cols),
                    actual: (n_rows, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, GraphError> {
        if data.len() != rows * cols {
            return Err(GraphError::ShapeMismatch {
                expected: (rows, cols),
                actual: (data.len(), 1),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.set(j, i, self.get(i, j));
            }
        }
        out
    }

    /// Matrix product. Panics when inner dimensions disagree.
    pub fn matmul(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows, "matmul inner dimension");
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == 0.0 {
                    continue;
                }
                let src = other.row(k);
                let dst = &mut out.data[i * other.cols..(i + 1) * other.cols];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += a * s;
                }
            }
        }
        out
    }

    /// `self * selfᵀ`, the Gram matrix of the rows.
    pub fn gram(&self) -> Matrix {
        let mut out = Matrix::zeros(self.rows, self.rows);
        for i in 0..self.rows {
            for j in 0..=i {
                let v: f64 = self.row(i).iter().zip(self.row(j)).map(|(a, b)| a * b).sum();
                out.set(i, j, v);
                out.set(j, i, v);
            }
        }
        out
    }

    pub fn sub(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.shape(), other.shape(), "sub shape");
        self.zip_map(other, |a, b| a - b)
    }

    pub fn add(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.shape(), other.shape(), "add shape");
        self.zip_map(other, |a, b| a + b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|v| v * factor)
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    fn zip_map(&self, other: &Matrix, f: impl Fn(f64, f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    /// Columns `start..end` as a new matrix.
    pub fn columns(&self, start: usize, end: usize) -> Matrix {
        assert!(start <= end && end <= self.cols, "column range");
        let width = end - start;
        let mut out = Matrix::zeros(self.rows, width);
        for i in 0..self.rows {
            out.data[i * width..(i + 1) * width].copy_from_slice(&self.row(i)[start..end]);
        }
        out
    }

    /// Stack matrices with equal column counts on top of each other.
    pub fn vstack(parts: &[&Matrix]) -> Matrix {
        let cols = parts.first().map(|m| m.cols).unwrap_or(0);
        let rows = parts.iter().map(|m| m.rows).sum();
        let mut data = Vec::with_capacity(rows * cols);
        for part in parts {
            assert_eq!(part.cols, cols, "vstack column count");
            data.extend_from_slice(&part.data);
        }
        Matrix { rows, cols, data }
    }
}

/// One labelled multi-channel recording window (channels × samples).
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub signals: Matrix,
    pub label: i64,
}

/// Trial tensor plus aligned labels, as produced by the dataset loaders.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub trials: Vec<Trial>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn labels(&self) -> Vec<i64> {
        self.trials.iter().map(|t| t.label).collect()
    }

    /// (channels, samples) of the first trial; loaders guarantee uniformity.
    pub fn trial_shape(&self) -> Option<(usize, usize)> {
        self.trials.first().map(|t| t.signals.shape())
    }

    /// Keep the first `channels` rows of every trial.
    pub fn select_channels(&self, channels: usize) -> Result<Dataset, GraphError> {
        let mut trials = Vec::with_capacity(self.trials.len());
        for trial in &self.trials {
            let (available, samples) = trial.signals.shape();
            if channels == 0 || channels > available {
                return Err(GraphError::ShapeMismatch {
                    expected: (channels, samples),
                    actual: (available, samples),
                });
            }
            let data = trial.signals.as_slice()[..channels * samples].to_vec();
            trials.push(Trial {
                signals: Matrix::from_vec(channels, samples, data)?,
                label: trial.label,
            });
        }
        Ok(Dataset { trials })
    }
}

/// Min-max rescale every channel to [0, 1]; flat channels become zeros.
pub fn rescale_mcw(x: &Matrix) -> Matrix {
    let mut out = x.clone();
    let cols = x.cols();
    for i in 0..x.rows() {
        let row = x.row(i);
        let min = row.iter().copied().fold(f64::INFINITY, f64::min);
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        for j in 0..cols {
            let v = if span > 0.0 { (row[j] - min) / span } else { 0.0 };
            out.set(i, j, v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(rows: Vec<Vec<f64>>, label: i64) -> Trial {
        Trial {
            signals: Matrix::from_rows(&rows).unwrap(),
            label,
        }
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, GraphError::ShapeMismatch { .. }));
    }

    #[test]
    fn matmul_and_gram_agree() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![0.0, -1.0, 4.0]]).unwrap();
        let explicit = a.matmul(&a.transpose());
        assert_eq!(explicit, a.gram());
        assert_eq!(a.gram().get(0, 1), 10.0);
    }

    #[test]
    fn rescale_maps_channels_to_unit_range() {
        let x = Matrix::from_rows(&[vec![2.0, 4.0, 6.0], vec![5.0, 5.0, 5.0]]).unwrap();
        let r = rescale_mcw(&x);
        assert_eq!(r.row(0), &[0.0, 0.5, 1.0]);
        assert_eq!(r.row(1), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn rescale_is_deterministic() {
        let x = Matrix::from_rows(&[vec![0.3, -1.2, 7.5, 2.0], vec![1e-3, 4.0, -2.0, 0.0]])
            .unwrap();
        assert_eq!(rescale_mcw(&x), rescale_mcw(&x));
        assert_eq!(x.get(0, 2), 7.5, "input untouched");
    }

    #[test]
    fn select_channels_keeps_leading_rows() {
        let ds = Dataset {
            trials: vec![trial(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]], 2)],
        };
        let sel = ds.select_channels(2).unwrap();
        assert_eq!(sel.trials[0].signals.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(sel.labels(), vec![2]);
        assert!(ds.select_channels(4).is_err());
        assert!(ds.select_channels(0).is_err());
    }

    #[test]
    fn select_channels_on_empty_dataset_is_empty() {
        let ds = Dataset::default();
        assert!(ds.select_channels(8).unwrap().is_empty());
    }
}

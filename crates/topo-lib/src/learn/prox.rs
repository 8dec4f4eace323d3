use super::converged;
use crate::error::GraphError;
use crate::linalg::{soft_threshold, spectral_radius_psd};
use crate::signal::Matrix;
use log::debug;

pub(crate) struct SparseRegression<'a> {
    pub method: &'static str,
    pub target: &'a Matrix,
    pub features: &'a Matrix,
    pub l1: f64,
    pub ridge: f64,
    pub symmetry: f64,
    pub zero_diagonal: bool,
    pub imax: usize,
    pub epsilon: f64,
}

impl SparseRegression<'_> {
    pub fn solve(&self) -> Result<Matrix, GraphError> {
        let method = self.method;
        let n = self.target.cols().max(1) as f64;
        let targets = self.target.rows();
        let width = self.features.rows();
        let square = targets == width;

        let cov = self.features.gram().scale(1.0 / n);
        let cross = self.target.matmul(&self.features.transpose()).scale(1.0 / n);
        let symmetry = if square { self.symmetry } else { 0.0 };
        let lipschitz = spectral_radius_psd(&cov) + self.ridge + 4.0 * symmetry;
        let step = if lipschitz > 0.0 { 1.0 / lipschitz } else { 1.0 };

        let mut b = Matrix::zeros(targets, width);
        let mut last_change = f64::INFINITY;
        for iteration in 1..=self.imax {
            let mut grad = b.matmul(&cov).sub(&cross).add(&b.scale(self.ridge));
            if symmetry > 0.0 {
                let skew = b.sub(&b.transpose());
                grad = grad.add(&skew.scale(2.0 * symmetry));
            }
            let mut next = b.sub(&grad.scale(step));
            for v in next.as_mut_slice() {
                *v = soft_threshold(*v, step * self.l1);
            }
            if self.zero_diagonal {
                for i in 0..targets.min(width) {
                    next.set(i, i, 0.0);
                }
            }
            if !next.is_finite() {
                return Err(GraphError::NonFinite { method });
            }
            last_change = next.sub(&b).frobenius_norm();
            b = next;
            if converged(last_change, b.frobenius_norm(), self.epsilon) {
                debug!("{}: converged after {} iterations", method, iteration);
                return Ok(b);
            }
        }
        Err(GraphError::NotConverged {
            method,
            iterations: self.imax,
            last_change,
        })
    }
}

use super::{require_finite_input, require_non_negative, require_samples, GraphLearner};
use crate::error::GraphError;
use crate::linalg::invert;
use crate::signal::Matrix;
use serde::{Deserialize, Serialize};

/// Heat-diffusion graph learning.
///
/// Fits `x_{t+k} - x_t ≈ k M x_t` for lags `k = 1..=p` in closed form with ridge
/// `beta_2`, keeps the positive part of the symmetrised off-diagonal of `M` as
/// edge weights, drops edges weaker than `max_w / beta_1` and returns the
/// combinatorial Laplacian `diag(W 1) - W`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffusionLearner {
    pub p: usize,
    pub beta_1: f64,
    pub beta_2: f64,
}

impl DiffusionLearner {
    fn validate(&self) -> Result<(), GraphError> {
        let method = self.id();
        if self.p == 0 {
            return Err(GraphError::InvalidParameter {
                method,
                name: "p",
                value: 0.0,
            });
        }
        if !(self.beta_1 >= 1.0 && self.beta_1.is_finite()) {
            return Err(GraphError::InvalidParameter {
                method,
                name: "beta_1",
                value: self.beta_1,
            });
        }
        require_non_negative(method, "beta_2", self.beta_2)
    }

    fn operator(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let l = x.rows();
        let t = x.cols();
        let mut lhs = Matrix::zeros(l, l);
        let mut rhs = Matrix::zeros(l, l);
        for k in 1..=self.p {
            let base = x.columns(0, t - k);
            let delta = x.columns(k, t).sub(&base);
            let kf = k as f64;
            rhs = rhs.add(&delta.matmul(&base.transpose()).scale(kf));
            lhs = lhs.add(&base.gram().scale(kf * kf));
        }
        for i in 0..l {
            lhs.set(i, i, lhs.get(i, i) + self.beta_2);
        }
        let inv = invert(&lhs).ok_or(GraphError::Singular { method: self.id() })?;
        Ok(rhs.matmul(&inv))
    }
}

impl GraphLearner for DiffusionLearner {
    fn id(&self) -> &'static str {
        "diffusion"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        self.validate()?;
        require_finite_input(method, x)?;
        require_samples(method, x, self.p + 1)?;
        let m = self.operator(x)?;
        if !m.is_finite() {
            return Err(GraphError::NonFinite { method });
        }

        let l = x.rows();
        let mut w = Matrix::zeros(l, l);
        for i in 0..l {
            for j in (i + 1)..l {
                let v = (0.5 * (m.get(i, j) + m.get(j, i))).max(0.0);
                w.set(i, j, v);
                w.set(j, i, v);
            }
        }
        let floor = w.max_abs() / self.beta_1;
        let w = w.map(|v| if v < floor { 0.0 } else { v });

        let mut laplacian = w.scale(-1.0);
        for i in 0..l {
            let degree: f64 = w.row(i).iter().sum();
            laplacian.set(i, i, degree);
        }
        Ok(laplacian)
    }
}

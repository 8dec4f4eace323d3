use super::prox::SparseRegression;
use super::{
    require_finite_input, require_iterations, require_non_negative, require_positive,
    require_samples, GraphLearner,
};
use crate::error::GraphError;
use crate::signal::Matrix;
use serde::{Deserialize, Serialize};

/// Structural equation model `X ≈ W X` with `diag(W) = 0`, L1 weight `beta`
/// and ridge `gamma`. The learnt graph is directed (asymmetric).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemLearner {
    pub beta: f64,
    pub gamma: f64,
    pub imax: usize,
    pub epsilon: f64,
}

/// Structural vector autoregressive model
/// `x_t ≈ W x_t + Σ_{k=1..p} A_k x_{t-k}`; returns the instantaneous graph `W`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvarmLearner {
    pub beta: f64,
    pub p: usize,
    pub gamma: f64,
    pub imax: usize,
    pub epsilon: f64,
}

fn validate_common(
    method: &'static str,
    beta: f64,
    gamma: f64,
    imax: usize,
    epsilon: f64,
) -> Result<(), GraphError> {
    require_non_negative(method, "beta", beta)?;
    require_non_negative(method, "gamma", gamma)?;
    require_positive(method, "epsilon", epsilon)?;
    require_iterations(method, imax)
}

impl GraphLearner for SemLearner {
    fn id(&self) -> &'static str {
        "sem"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        validate_common(method, self.beta, self.gamma, self.imax, self.epsilon)?;
        require_finite_input(method, x)?;
        require_samples(method, x, 2)?;
        SparseRegression {
            method,
            target: x,
            features: x,
            l1: self.beta,
            ridge: self.gamma,
            symmetry: 0.0,
            zero_diagonal: true,
            imax: self.imax,
            epsilon: self.epsilon,
        }
        .solve()
    }
}

impl GraphLearner for SvarmLearner {
    fn id(&self) -> &'static str {
        "svarm"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        validate_common(method, self.beta, self.gamma, self.imax, self.epsilon)?;
        if self.p == 0 {
            return Err(GraphError::InvalidParameter {
                method,
                name: "p",
                value: 0.0,
            });
        }
        require_finite_input(method, x)?;
        require_samples(method, x, self.p + 2)?;
        let l = x.rows();
        let t = x.cols();
        let current = x.columns(self.p, t);
        let lagged: Vec<Matrix> = (1..=self.p)
            .map(|k| x.columns(self.p - k, t - k))
            .collect();
        let mut parts: Vec<&Matrix> = vec![&current];
        parts.extend(lagged.iter());
        let features = Matrix::vstack(&parts);
        let coefficients = SparseRegression {
            method,
            target: &current,
            features: &features,
            l1: self.beta,
            ridge: self.gamma,
            symmetry: 0.0,
            zero_diagonal: true,
            imax: self.imax,
            epsilon: self.epsilon,
        }
        .solve()?;
        Ok(coefficients.columns(0, l))
    }
}

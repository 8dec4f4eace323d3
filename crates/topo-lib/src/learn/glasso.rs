use super::{
    converged, require_finite_input, require_iterations, require_non_negative, require_positive,
    require_samples, GraphLearner,
};
use crate::error::GraphError;
use crate::linalg::{correlation, invert, log_det_spd, soft_threshold};
use crate::signal::Matrix;
use log::debug;
use serde::{Deserialize, Serialize};

const MIN_STEP: f64 = 1e-14;

/// Sparse precision estimate by proximal gradient on the graphical-lasso objective
/// `-log det Θ + tr(SΘ) + alpha Σ_{i≠j} |Θ_ij|`, where S is the sample correlation.
///
/// The step size starts at 1 and shrinks by `beta` until the quadratic upper bound
/// holds and the iterate stays positive definite. `gamma` is a ridge added to the
/// diagonal of S. The graph is the partial-correlation form of Θ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphicalLassoLearner {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub imax: usize,
    pub epsilon: f64,
}

impl GraphicalLassoLearner {
    fn validate(&self) -> Result<(), GraphError> {
        let method = self.id();
        require_non_negative(method, "alpha", self.alpha)?;
        if !(self.beta > 0.0 && self.beta < 1.0) {
            return Err(GraphError::InvalidParameter {
                method,
                name: "beta",
                value: self.beta,
            });
        }
        require_non_negative(method, "gamma", self.gamma)?;
        require_positive(method, "epsilon", self.epsilon)?;
        require_iterations(method, self.imax)
    }
}

fn dot(a: &Matrix, b: &Matrix) -> f64 {
    a.as_slice().iter().zip(b.as_slice()).map(|(x, y)| x * y).sum()
}

fn smooth_objective(s: &Matrix, theta: &Matrix) -> Option<f64> {
    log_det_spd(theta).map(|ld| -ld + dot(s, theta))
}

fn prox_step(theta: &Matrix, grad: &Matrix, step: f64, alpha: f64) -> Matrix {
    let l = theta.rows();
    let mut out = Matrix::zeros(l, l);
    for i in 0..l {
        for j in i..l {
            let v = theta.get(i, j) - step * grad.get(i, j);
            let v = if i == j {
                v
            } else {
                soft_threshold(v, step * alpha)
            };
            out.set(i, j, v);
            out.set(j, i, v);
        }
    }
    out
}

/// `-Θ_ij / sqrt(Θ_ii Θ_jj)` off the diagonal.
fn partial_correlations(theta: &Matrix) -> Matrix {
    let l = theta.rows();
    let mut w = Matrix::zeros(l, l);
    for i in 0..l {
        for j in 0..l {
            if i != j && theta.get(i, j) != 0.0 {
                let denom = (theta.get(i, i) * theta.get(j, j)).sqrt();
                w.set(i, j, -theta.get(i, j) / denom);
            }
        }
    }
    w
}

impl GraphLearner for GraphicalLassoLearner {
    fn id(&self) -> &'static str {
        "graphical_lasso"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        self.validate()?;
        require_finite_input(method, x)?;
        require_samples(method, x, 2)?;
        let l = x.rows();
        let mut s = correlation(x);
        for i in 0..l {
            s.set(i, i, s.get(i, i) + self.gamma);
        }

        let mut theta = Matrix::zeros(l, l);
        for i in 0..l {
            theta.set(i, i, 1.0 / s.get(i, i));
        }
        let mut step = 1.0;
        let mut last_change = f64::INFINITY;
        for iteration in 1..=self.imax {
            let inv = invert(&theta).ok_or(GraphError::Singular { method })?;
            let grad = s.sub(&inv);
            let f0 = smooth_objective(&s, &theta).ok_or(GraphError::Singular { method })?;
            let candidate = loop {
                let cand = prox_step(&theta, &grad, step, self.alpha);
                if let Some(f1) = smooth_objective(&s, &cand) {
                    let diff = cand.sub(&theta);
                    let bound = f0 + dot(&grad, &diff) + dot(&diff, &diff) / (2.0 * step);
                    if f1 <= bound + 1e-12 {
                        break cand;
                    }
                }
                step *= self.beta;
                if step < MIN_STEP {
                    return Err(GraphError::NotConverged {
                        method,
                        iterations: iteration,
                        last_change,
                    });
                }
            };
            last_change = candidate.sub(&theta).frobenius_norm();
            theta = candidate;
            if !theta.is_finite() {
                return Err(GraphError::NonFinite { method });
            }
            if converged(last_change, theta.frobenius_norm(), self.epsilon) {
                debug!("{}: converged after {} iterations", method, iteration);
                return Ok(partial_correlations(&theta));
            }
        }
        Err(GraphError::NotConverged {
            method,
            iterations: self.imax,
            last_change,
        })
    }
}

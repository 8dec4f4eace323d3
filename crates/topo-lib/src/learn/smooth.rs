use super::{
    converged, require_finite_input, require_iterations, require_non_negative, require_positive,
    require_samples, GraphLearner,
};
use crate::error::GraphError;
use crate::linalg::spectral_radius_psd;
use crate::signal::Matrix;
use log::debug;
use serde::{Deserialize, Serialize};

/// `min_{w ≥ 0} 2 zᵀw - alpha 1ᵀ log(S w) + beta ||w||²`, primal-dual with step `gamma`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothSignalLearner {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub imax: usize,
    pub epsilon: f64,
}

/// Symmetric non-negative `x_{t+1} ≈ W x_t` with smoothness weight `beta`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothAutoregressLearner {
    pub beta: f64,
    pub gamma: f64,
    pub imax: usize,
    pub epsilon: f64,
}

struct Edges {
    nodes: usize,
    pairs: Vec<(usize, usize)>,
}

impl Edges {
    fn complete(nodes: usize) -> Self {
        let mut pairs = Vec::with_capacity(nodes * nodes.saturating_sub(1) / 2);
        for i in 0..nodes {
            for j in (i + 1)..nodes {
                pairs.push((i, j));
            }
        }
        Self { nodes, pairs }
    }

    fn degrees(&self, w: &[f64]) -> Vec<f64> {
        let mut d = vec![0.0; self.nodes];
        for (&(i, j), &v) in self.pairs.iter().zip(w) {
            d[i] += v;
            d[j] += v;
        }
        d
    }

    fn adjoint(&self, d: &[f64]) -> Vec<f64> {
        self.pairs.iter().map(|&(i, j)| d[i] + d[j]).collect()
    }

    /// Mean squared difference between every pair of rows.
    fn distances(&self, x: &Matrix) -> Vec<f64> {
        let n = x.cols().max(1) as f64;
        self.pairs
            .iter()
            .map(|&(i, j)| {
                x.row(i)
                    .iter()
                    .zip(x.row(j))
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    / n
            })
            .collect()
    }

    fn to_matrix(&self, w: &[f64]) -> Matrix {
        let mut out = Matrix::zeros(self.nodes, self.nodes);
        for (&(i, j), &v) in self.pairs.iter().zip(w) {
            out.set(i, j, v);
            out.set(j, i, v);
        }
        out
    }
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

impl GraphLearner for SmoothSignalLearner {
    fn id(&self) -> &'static str {
        "smoothSignal"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        require_positive(method, "alpha", self.alpha)?;
        require_non_negative(method, "beta", self.beta)?;
        require_positive(method, "gamma", self.gamma)?;
        require_positive(method, "epsilon", self.epsilon)?;
        require_iterations(method, self.imax)?;
        require_finite_input(method, x)?;
        require_samples(method, x, 1)?;

        let edges = Edges::complete(x.rows());
        let operator_norm = (2.0 * (x.rows().saturating_sub(1)) as f64).sqrt();
        if self.gamma * (2.0 * self.beta + operator_norm) >= 1.0 {
            return Err(GraphError::InvalidParameter {
                method,
                name: "gamma",
                value: self.gamma,
            });
        }
        if edges.pairs.is_empty() {
            return Ok(Matrix::zeros(edges.nodes, edges.nodes));
        }
        let z = edges.distances(x);
        let g = self.gamma;
        let mut w = vec![0.0; edges.pairs.len()];
        let mut d = vec![0.0; edges.nodes];
        let mut last_change = f64::INFINITY;
        for iteration in 1..=self.imax {
            let sw = edges.degrees(&w);
            let std = edges.adjoint(&d);
            let y: Vec<f64> = (0..w.len())
                .map(|e| w[e] - g * (2.0 * self.beta * w[e] + std[e]))
                .collect();
            let y_bar: Vec<f64> = (0..d.len()).map(|k| d[k] + g * sw[k]).collect();
            let p: Vec<f64> = (0..w.len())
                .map(|e| (y[e] - 2.0 * g * z[e]).max(0.0))
                .collect();
            let p_bar: Vec<f64> = y_bar
                .iter()
                .map(|&v| (v - (v * v + 4.0 * self.alpha * g).sqrt()) / 2.0)
                .collect();
            let sp = edges.degrees(&p);
            let stp = edges.adjoint(&p_bar);
            let q: Vec<f64> = (0..w.len())
                .map(|e| p[e] - g * (2.0 * self.beta * p[e] + stp[e]))
                .collect();
            let q_bar: Vec<f64> = (0..d.len()).map(|k| p_bar[k] + g * sp[k]).collect();

            let w_next: Vec<f64> = (0..w.len()).map(|e| w[e] - y[e] + q[e]).collect();
            let d_next: Vec<f64> = (0..d.len()).map(|k| d[k] - y_bar[k] + q_bar[k]).collect();
            if w_next.iter().chain(&d_next).any(|v| !v.is_finite()) {
                return Err(GraphError::NonFinite { method });
            }
            let change_w = distance(&w_next, &w);
            let change_d = distance(&d_next, &d);
            last_change = change_w.max(change_d);
            w = w_next;
            d = d_next;
            if converged(change_w, norm(&w), self.epsilon)
                && converged(change_d, norm(&d), self.epsilon)
            {
                debug!("{}: converged after {} iterations", method, iteration);
                let w: Vec<f64> = w.into_iter().map(|v| v.max(0.0)).collect();
                return Ok(edges.to_matrix(&w));
            }
        }
        Err(GraphError::NotConverged {
            method,
            iterations: self.imax,
            last_change,
        })
    }
}

impl GraphLearner for SmoothAutoregressLearner {
    fn id(&self) -> &'static str {
        "smoothAutoregression"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        require_non_negative(method, "beta", self.beta)?;
        require_non_negative(method, "gamma", self.gamma)?;
        require_positive(method, "epsilon", self.epsilon)?;
        require_iterations(method, self.imax)?;
        require_finite_input(method, x)?;
        require_samples(method, x, 3)?;

        let edges = Edges::complete(x.rows());
        let t = x.cols();
        let prev = x.columns(0, t - 1);
        let next = x.columns(1, t);
        let n = (t - 1) as f64;
        let cov = prev.gram().scale(1.0 / n);
        let cross = next.matmul(&prev.transpose()).scale(1.0 / n);
        let z = edges.distances(x);
        let lipschitz = 2.0 * spectral_radius_psd(&cov) + self.gamma;
        let step = if lipschitz > 0.0 { 1.0 / lipschitz } else { 1.0 };

        let mut w = vec![0.0; edges.pairs.len()];
        let mut last_change = f64::INFINITY;
        for iteration in 1..=self.imax {
            let full = edges.to_matrix(&w);
            let grad = full.matmul(&cov).sub(&cross);
            let w_next: Vec<f64> = edges
                .pairs
                .iter()
                .enumerate()
                .map(|(e, &(i, j))| {
                    let g = grad.get(i, j) + grad.get(j, i) + self.beta * z[e] + self.gamma * w[e];
                    (w[e] - step * g).max(0.0)
                })
                .collect();
            if w_next.iter().any(|v| !v.is_finite()) {
                return Err(GraphError::NonFinite { method });
            }
            last_change = distance(&w_next, &w);
            w = w_next;
            if converged(last_change, norm(&w), self.epsilon) {
                debug!("{}: converged after {} iterations", method, iteration);
                return Ok(edges.to_matrix(&w));
            }
        }
        Err(GraphError::NotConverged {
            method,
            iterations: self.imax,
            last_change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learn::testing::coupled_signals;
    use crate::signal::rescale_mcw;

    fn clustered() -> Matrix {
        // channels 0/1 are near copies, channel 2 is far from both
        let base: Vec<f64> = (0..50).map(|t| (t as f64 * 0.2).sin()).collect();
        let twin: Vec<f64> = base.iter().enumerate().map(|(t, v)| v + 0.01 * (t % 3) as f64).collect();
        let far: Vec<f64> = (0..50).map(|t| 3.0 + (t as f64 * 0.7).cos()).collect();
        Matrix::from_rows(&[base, twin, far]).unwrap()
    }

    #[test]
    fn smooth_signal_prefers_close_channels() {
        let w = SmoothSignalLearner {
            alpha: 1.0,
            beta: 0.5,
            gamma: 0.05,
            imax: 50000,
            epsilon: 1e-4,
        }
        .find_graph(&clustered())
        .unwrap();
        assert!(w.get(0, 1) > w.get(0, 2));
        assert!(w.get(0, 1) > w.get(1, 2));
        for i in 0..3 {
            assert_eq!(w.get(i, i), 0.0);
            for j in 0..3 {
                assert!(w.get(i, j) >= 0.0);
                assert_eq!(w.get(i, j), w.get(j, i));
            }
        }
    }

    #[test]
    fn smooth_signal_single_channel_has_no_edges() {
        let x = Matrix::from_rows(&[(0..40).map(|t| (t as f64 * 0.3).sin()).collect()]).unwrap();
        let w = SmoothSignalLearner {
            alpha: 3.0,
            beta: 5.0,
            gamma: 0.01,
            imax: 2000,
            epsilon: 1e-4,
        }
        .find_graph(&x)
        .unwrap();
        assert_eq!(w, Matrix::zeros(1, 1));
    }

    #[test]
    fn smooth_signal_rejects_unstable_step() {
        let err = SmoothSignalLearner {
            alpha: 3.0,
            beta: 5.0,
            gamma: 0.5,
            imax: 10,
            epsilon: 1e-4,
        }
        .find_graph(&clustered())
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter { name: "gamma", .. }));
    }

    #[test]
    fn smooth_autoregress_is_symmetric_non_negative() {
        let x = rescale_mcw(&coupled_signals(5, 120, 8));
        let w = SmoothAutoregressLearner {
            beta: 0.1,
            gamma: 0.05,
            imax: 50000,
            epsilon: 1e-4,
        }
        .find_graph(&x)
        .unwrap();
        assert_eq!(w.shape(), (5, 5));
        for i in 0..5 {
            assert_eq!(w.get(i, i), 0.0);
            for j in 0..5 {
                assert!(w.get(i, j) >= 0.0);
                assert_eq!(w.get(i, j), w.get(j, i));
            }
        }
    }

    #[test]
    fn heavy_smoothness_penalty_empties_graph() {
        let x = rescale_mcw(&coupled_signals(4, 60, 8));
        let w = SmoothAutoregressLearner {
            beta: 1e6,
            gamma: 0.0,
            imax: 100,
            epsilon: 1e-6,
        }
        .find_graph(&x)
        .unwrap();
        assert_eq!(w.max_abs(), 0.0);
    }
}

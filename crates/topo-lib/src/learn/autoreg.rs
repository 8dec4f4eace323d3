use super::prox::SparseRegression;
use super::{
    require_finite_input, require_iterations, require_non_negative, require_positive,
    require_samples, GraphLearner,
};
use crate::error::GraphError;
use crate::signal::Matrix;
use serde::{Deserialize, Serialize};

/// Sparse first-order autoregression `x_{t+1} ≈ A x_t`.
///
/// `beta` weighs the L1 penalty, `gamma` the ridge and `delta` a penalty on the
/// antisymmetric part of `A` that pulls the graph towards an undirected one.
/// Self-dynamics are fitted but dropped from the returned graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoregressLearner {
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub imax: usize,
    pub epsilon: f64,
}

impl GraphLearner for AutoregressLearner {
    fn id(&self) -> &'static str {
        "autoreg"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        require_non_negative(method, "beta", self.beta)?;
        require_non_negative(method, "gamma", self.gamma)?;
        require_non_negative(method, "delta", self.delta)?;
        require_positive(method, "epsilon", self.epsilon)?;
        require_iterations(method, self.imax)?;
        require_finite_input(method, x)?;
        require_samples(method, x, 3)?;
        let t = x.cols();
        let next = x.columns(1, t);
        let prev = x.columns(0, t - 1);
        let mut a = SparseRegression {
            method,
            target: &next,
            features: &prev,
            l1: self.beta,
            ridge: self.gamma,
            symmetry: self.delta,
            zero_diagonal: false,
            imax: self.imax,
            epsilon: self.epsilon,
        }
        .solve()?;
        for i in 0..a.rows() {
            a.set(i, i, 0.0);
        }
        Ok(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learn::testing::coupled_signals;
    use crate::signal::rescale_mcw;

    fn learner(delta: f64) -> AutoregressLearner {
        AutoregressLearner {
            beta: 0.005,
            gamma: 0.05,
            delta,
            imax: 20000,
            epsilon: 1e-4,
        }
    }

    fn asymmetry(w: &Matrix) -> f64 {
        w.sub(&w.transpose()).frobenius_norm()
    }

    #[test]
    fn graph_has_no_self_loops() {
        let x = rescale_mcw(&coupled_signals(5, 100, 21));
        let w = learner(0.0).find_graph(&x).unwrap();
        assert_eq!(w.shape(), (5, 5));
        for i in 0..5 {
            assert_eq!(w.get(i, i), 0.0);
        }
    }

    #[test]
    fn symmetry_penalty_reduces_asymmetry() {
        let x = rescale_mcw(&coupled_signals(5, 100, 21));
        let free = learner(0.0).find_graph(&x).unwrap();
        let tied = learner(5.0).find_graph(&x).unwrap();
        assert!(asymmetry(&tied) <= asymmetry(&free));
    }
}

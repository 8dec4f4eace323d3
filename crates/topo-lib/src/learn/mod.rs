pub mod autoreg;
pub mod correlation;
pub mod diffusion;
pub mod glasso;
mod prox;
pub mod sem;
pub mod smooth;

pub use autoreg::AutoregressLearner;
pub use correlation::{CorrelationLearner, PartialCorrelationLearner};
pub use diffusion::DiffusionLearner;
pub use glasso::GraphicalLassoLearner;
pub use sem::{SemLearner, SvarmLearner};
pub use smooth::{SmoothAutoregressLearner, SmoothSignalLearner};

use crate::error::GraphError;
use crate::signal::Matrix;

/// Edges with magnitude at or below this are dropped by [`prune_small_edges`].
pub const PRUNE_THRESHOLD: f64 = 1e-5;

pub trait GraphLearner {
    fn id(&self) -> &'static str;

    /// Learn one weighted graph from a channels × samples matrix.
    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError>;
}

/// Zero every entry with `0 < |w| <= PRUNE_THRESHOLD`.
pub fn prune_small_edges(w: &mut Matrix) {
    for v in w.as_mut_slice() {
        if v.abs() <= PRUNE_THRESHOLD {
            *v = 0.0;
        }
    }
}

pub(crate) fn require_finite_input(method: &'static str, x: &Matrix) -> Result<(), GraphError> {
    if x.is_finite() {
        Ok(())
    } else {
        Err(GraphError::NonFinite { method })
    }
}

pub(crate) fn require_samples(
    method: &'static str,
    x: &Matrix,
    required: usize,
) -> Result<(), GraphError> {
    if x.cols() < required {
        return Err(GraphError::InsufficientSamples {
            method,
            required,
            available: x.cols(),
        });
    }
    Ok(())
}

pub(crate) fn require_positive(
    method: &'static str,
    name: &'static str,
    value: f64,
) -> Result<(), GraphError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GraphError::InvalidParameter {
            method,
            name,
            value,
        })
    }
}

pub(crate) fn require_non_negative(
    method: &'static str,
    name: &'static str,
    value: f64,
) -> Result<(), GraphError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GraphError::InvalidParameter {
            method,
            name,
            value,
        })
    }
}

pub(crate) fn require_iterations(method: &'static str, imax: usize) -> Result<(), GraphError> {
    if imax == 0 {
        return Err(GraphError::InvalidParameter {
            method,
            name: "imax",
            value: 0.0,
        });
    }
    Ok(())
}

pub(crate) fn converged(change: f64, reference: f64, epsilon: f64) -> bool {
    change <= epsilon * reference.max(1.0)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_zeroes_only_tiny_entries() {
        let mut w = Matrix::from_vec(
            2,
            3,
            vec![0.0, 1e-5, -1e-5, 2e-5, -3.0, 9e-6],
        )
        .unwrap();
        prune_small_edges(&mut w);
        assert_eq!(w.as_slice(), &[0.0, 0.0, 0.0, 2e-5, -3.0, 0.0]);
        for v in w.as_slice() {
            assert!(*v == 0.0 || v.abs() > PRUNE_THRESHOLD);
        }
    }

    #[test]
    fn converged_uses_relative_reference() {
        assert!(converged(0.009, 0.5, 0.01));
        assert!(!converged(0.02, 0.5, 0.01));
        assert!(converged(0.9, 100.0, 0.01));
    }
}

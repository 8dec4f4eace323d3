use super::{require_finite_input, require_samples, GraphLearner};
use crate::error::GraphError;
use crate::linalg::{correlation, invert};
use crate::signal::Matrix;
use crate::stats::correlation_pvalue;
use serde::{Deserialize, Serialize};

/// Pearson correlation graph; an edge survives when its two-sided p-value is below `alpha`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationLearner {
    pub alpha: f64,
}

/// Partial correlation graph from the inverse correlation matrix, tested like
/// [`CorrelationLearner`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialCorrelationLearner {
    pub alpha: f64,
}

fn validate_alpha(method: &'static str, alpha: f64) -> Result<(), GraphError> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidParameter {
            method,
            name: "alpha",
            value: alpha,
        })
    }
}

/// Keep `r[i][j]` when significant at `alpha` with `df` degrees of freedom; zero diagonal.
fn significant_edges(r: &Matrix, df: f64, alpha: f64) -> Matrix {
    let l = r.rows();
    let mut w = Matrix::zeros(l, l);
    for i in 0..l {
        for j in (i + 1)..l {
            let v = r.get(i, j);
            if v != 0.0 && correlation_pvalue(v, df) < alpha {
                w.set(i, j, v);
                w.set(j, i, v);
            }
        }
    }
    w
}

impl GraphLearner for CorrelationLearner {
    fn id(&self) -> &'static str {
        "correlation"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        validate_alpha(method, self.alpha)?;
        require_finite_input(method, x)?;
        require_samples(method, x, 3)?;
        let r = correlation(x);
        let df = (x.cols() - 2) as f64;
        Ok(significant_edges(&r, df, self.alpha))
    }
}

impl GraphLearner for PartialCorrelationLearner {
    fn id(&self) -> &'static str {
        "partial_correlation"
    }

    fn find_graph(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let method = self.id();
        validate_alpha(method, self.alpha)?;
        require_finite_input(method, x)?;
        let l = x.rows();
        require_samples(method, x, l + 1)?;
        let r = correlation(x);
        let precision = invert(&r).ok_or(GraphError::Singular { method })?;
        let mut partial = Matrix::zeros(l, l);
        for i in 0..l {
            for j in 0..l {
                if i == j {
                    continue;
                }
                let denom = (precision.get(i, i) * precision.get(j, j)).sqrt();
                if !(denom > 0.0) {
                    return Err(GraphError::Singular { method });
                }
                partial.set(i, j, (-precision.get(i, j) / denom).clamp(-1.0, 1.0));
            }
        }
        // conditioning on the other L-2 channels costs that many degrees of freedom
        let df = (x.cols() - l) as f64;
        Ok(significant_edges(&partial, df, self.alpha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learn::testing::{assert_close, coupled_signals};

    #[test]
    fn correlation_graph_is_symmetric_with_zero_diagonal() {
        let x = coupled_signals(8, 60, 7);
        let w = CorrelationLearner { alpha: 0.05 }.find_graph(&x).unwrap();
        assert_eq!(w.shape(), (8, 8));
        for i in 0..8 {
            assert_eq!(w.get(i, i), 0.0);
            for j in 0..8 {
                assert_eq!(w.get(i, j), w.get(j, i));
            }
        }
    }

    #[test]
    fn strongly_coupled_pair_survives() {
        let x = Matrix::from_rows(&[
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            vec![0.1, 1.1, 1.9, 3.2, 3.9, 5.1, 6.0, 6.9],
            vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
        ])
        .unwrap();
        let w = CorrelationLearner { alpha: 0.05 }.find_graph(&x).unwrap();
        assert!(w.get(0, 1) > 0.99);
        assert_eq!(w.get(0, 2), 0.0, "alternating channel is not significant");
    }

    #[test]
    fn alpha_one_keeps_every_nonzero_correlation() {
        let x = coupled_signals(4, 30, 3);
        let w = CorrelationLearner { alpha: 1.0 }.find_graph(&x).unwrap();
        let r = correlation(&x);
        assert_close(w.get(0, 3), r.get(0, 3), 1e-12);
    }

    #[test]
    fn rejects_bad_alpha_and_short_trials() {
        let x = coupled_signals(3, 20, 1);
        assert!(matches!(
            CorrelationLearner { alpha: 0.0 }.find_graph(&x),
            Err(GraphError::InvalidParameter { name: "alpha", .. })
        ));
        let short = x.columns(0, 2);
        assert!(matches!(
            CorrelationLearner { alpha: 0.05 }.find_graph(&short),
            Err(GraphError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn partial_correlation_separates_indirect_link() {
        // chain a -> b -> c: a and c correlate only through b
        let n = 400;
        let mut rows = vec![vec![0.0; n]; 3];
        let mut state = 12345u64;
        let mut noise = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
        };
        for t in 0..n {
            let a = noise();
            let b = a + 0.5 * noise();
            let c = b + 0.5 * noise();
            rows[0][t] = a;
            rows[1][t] = b;
            rows[2][t] = c;
        }
        let x = Matrix::from_rows(&rows).unwrap();
        let w = PartialCorrelationLearner { alpha: 0.01 }.find_graph(&x).unwrap();
        assert!(w.get(0, 1) > 0.5);
        assert!(w.get(1, 2) > 0.5);
        assert!(w.get(0, 2).abs() < 0.2);
    }

    #[test]
    fn partial_correlation_rejects_duplicate_channels() {
        let row = vec![0.3, 1.2, -0.7, 2.2, 0.1, -1.4];
        let x = Matrix::from_rows(&[row.clone(), row, vec![1.0, 0.0, 2.0, 1.0, 3.0, 0.5]])
            .unwrap();
        assert!(matches!(
            PartialCorrelationLearner { alpha: 0.05 }.find_graph(&x),
            Err(GraphError::Singular { .. })
        ));
    }
}

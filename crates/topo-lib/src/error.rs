use thiserror::Error;

/// Failures raised by the numeric core (learners, accumulator, embedding).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("{method}: need at least {required} samples per channel, got {available}")]
    InsufficientSamples {
        method: &'static str,
        required: usize,
        available: usize,
    },
    #[error("{method}: matrix is singular or not positive definite")]
    Singular { method: &'static str },
    #[error("{method}: no convergence after {iterations} iterations (last change {last_change:.3e})")]
    NotConverged {
        method: &'static str,
        iterations: usize,
        last_change: f64,
    },
    #[error("{method}: non-finite value encountered")]
    NonFinite { method: &'static str },
    #[error("{method}: invalid hyperparameter {name} = {value}")]
    InvalidParameter {
        method: &'static str,
        name: &'static str,
        value: f64,
    },
    #[error("embedding needs more than {perplexity} samples (perplexity), got {samples}")]
    TooFewSamples { samples: usize, perplexity: f64 },
}

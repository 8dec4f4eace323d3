use crate::error::GraphError;
use crate::signal::Matrix;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const EXAGGERATION: f64 = 4.0;
const EXAGGERATION_ITERS: usize = 100;
const MOMENTUM_SWITCH: usize = 250;
const MIN_PROB: f64 = 1e-12;

/// t-distributed stochastic neighbour embedding into two dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tsne {
    perplexity: f64,
    learning_rate: f64,
    n_iter: usize,
    seed: u64,
}

impl Default for Tsne {
    fn default() -> Self {
        Self::new()
    }
}

impl Tsne {
    pub fn new() -> Self {
        Self {
            perplexity: 30.0,
            learning_rate: 200.0,
            n_iter: 1000,
            seed: 0,
        }
    }

    #[must_use]
    pub fn with_perplexity(mut self, perplexity: f64) -> Self {
        self.perplexity = perplexity;
        self
    }

    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn perplexity(&self) -> f64 {
        self.perplexity
    }

    pub fn fit_transform(&self, x: &Matrix) -> Result<Matrix, GraphError> {
        let n = x.rows();
        if !(self.perplexity > 0.0) {
            return Err(GraphError::InvalidParameter {
                method: "tsne",
                name: "perplexity",
                value: self.perplexity,
            });
        }
        if (n as f64) <= self.perplexity {
            return Err(GraphError::TooFewSamples {
                samples: n,
                perplexity: self.perplexity,
            });
        }
        if !x.is_finite() {
            return Err(GraphError::NonFinite { method: "tsne" });
        }

        let distances = pairwise_sq_distances(x);
        let conditional = conditional_affinities(&distances, n, self.perplexity);
        let p = joint_affinities(&conditional, n);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut y: Vec<f64> = (0..n * 2).map(|_| rng.gen_range(-1e-4..1e-4)).collect();
        let mut velocity = vec![0.0; n * 2];
        for iter in 0..self.n_iter {
            let exaggeration = if iter < EXAGGERATION_ITERS {
                EXAGGERATION
            } else {
                1.0
            };
            let momentum = if iter < MOMENTUM_SWITCH { 0.5 } else { 0.8 };
            let grad = gradient(&y, &p, n, exaggeration);
            for (k, g) in grad.iter().enumerate() {
                velocity[k] = momentum * velocity[k] - self.learning_rate * g;
                y[k] += velocity[k];
            }
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(GraphError::NonFinite { method: "tsne" });
        }
        debug!("tsne: embedded {} samples after {} iterations", n, self.n_iter);
        Matrix::from_vec(n, 2, y)
    }
}

fn pairwise_sq_distances(x: &Matrix) -> Vec<f64> {
    let n = x.rows();
    let mut d = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let v: f64 = x
                .row(i)
                .iter()
                .zip(x.row(j))
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            d[i * n + j] = v;
            d[j * n + i] = v;
        }
    }
    d
}

/// `P(j|i)` with a per-point precision found by bisection on the entropy.
fn conditional_affinities(distances: &[f64], n: usize, perplexity: f64) -> Vec<f64> {
    let target = perplexity.ln();
    let mut p = vec![0.0; n * n];
    for i in 0..n {
        let row = &distances[i * n..(i + 1) * n];
        // shift by the nearest neighbour so exp() cannot underflow to all zeros
        let nearest = row
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &d)| d)
            .fold(f64::INFINITY, f64::min);
        let mut beta = 1.0;
        let mut lo = f64::NEG_INFINITY;
        let mut hi = f64::INFINITY;
        for _ in 0..64 {
            let mut sum = 0.0;
            for j in 0..n {
                let v = if j == i {
                    0.0
                } else {
                    (-beta * (row[j] - nearest)).exp()
                };
                p[i * n + j] = v;
                sum += v;
            }
            if sum <= 0.0 {
                break;
            }
            let mut entropy = 0.0;
            for j in 0..n {
                p[i * n + j] /= sum;
                let v = p[i * n + j];
                if v > MIN_PROB {
                    entropy -= v * v.ln();
                }
            }
            let diff = entropy - target;
            if diff.abs() < 1e-5 {
                break;
            }
            if diff > 0.0 {
                lo = beta;
                beta = if hi.is_infinite() { beta * 2.0 } else { (beta + hi) / 2.0 };
            } else {
                hi = beta;
                beta = if lo.is_infinite() { beta / 2.0 } else { (beta + lo) / 2.0 };
            }
        }
    }
    p
}

fn joint_affinities(conditional: &[f64], n: usize) -> Vec<f64> {
    let norm = 2.0 * n as f64;
    let mut p = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                p[i * n + j] = ((conditional[i * n + j] + conditional[j * n + i]) / norm).max(MIN_PROB);
            }
        }
    }
    p
}

fn gradient(y: &[f64], p: &[f64], n: usize, exaggeration: f64) -> Vec<f64> {
    let mut kernel = vec![0.0; n * n];
    let mut total = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = y[2 * i] - y[2 * j];
            let dy = y[2 * i + 1] - y[2 * j + 1];
            let k = 1.0 / (1.0 + dx * dx + dy * dy);
            kernel[i * n + j] = k;
            kernel[j * n + i] = k;
            total += 2.0 * k;
        }
    }
    let total = total.max(MIN_PROB);
    let mut grad = vec![0.0; n * 2];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let k = kernel[i * n + j];
            let q = (k / total).max(MIN_PROB);
            let factor = 4.0 * (exaggeration * p[i * n + j] - q) * k;
            grad[2 * i] += factor * (y[2 * i] - y[2 * j]);
            grad[2 * i + 1] += factor * (y[2 * i + 1] - y[2 * j + 1]);
        }
    }
    grad
}

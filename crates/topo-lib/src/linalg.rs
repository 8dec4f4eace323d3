use crate::signal::Matrix;

const PIVOT_EPS: f64 = 1e-12;

pub fn center_rows(x: &Matrix) -> Matrix {
    let mut out = x.clone();
    let n = x.cols().max(1) as f64;
    for i in 0..x.rows() {
        let mean = x.row(i).iter().sum::<f64>() / n;
        for j in 0..x.cols() {
            out.set(i, j, x.get(i, j) - mean);
        }
    }
    out
}

pub fn covariance(x: &Matrix) -> Matrix {
    let centered = center_rows(x);
    let n = x.cols().max(1) as f64;
    centered.gram().scale(1.0 / n)
}

/// Pearson correlation between channels. Zero-variance channels correlate with nothing.
pub fn correlation(x: &Matrix) -> Matrix {
    let cov = covariance(x);
    let l = cov.rows();
    let sd: Vec<f64> = (0..l).map(|i| cov.get(i, i).max(0.0).sqrt()).collect();
    let mut out = Matrix::zeros(l, l);
    for i in 0..l {
        for j in 0..l {
            let v = if i == j {
                1.0
            } else if sd[i] > 0.0 && sd[j] > 0.0 {
                (cov.get(i, j) / (sd[i] * sd[j])).clamp(-1.0, 1.0)
            } else {
                0.0
            };
            out.set(i, j, v);
        }
    }
    out
}

/// Gauss-Jordan inverse with partial pivoting. `None` when singular.
pub fn invert(a: &Matrix) -> Option<Matrix> {
    if !a.is_square() {
        return None;
    }
    let n = a.rows();
    let mut work = a.clone();
    let mut inv = Matrix::identity(n);
    for col in 0..n {
        let pivot = (col..n).max_by(|&p, &q| {
            work.get(p, col)
                .abs()
                .partial_cmp(&work.get(q, col).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if work.get(pivot, col).abs() < PIVOT_EPS {
            return None;
        }
        if pivot != col {
            swap_rows(&mut work, pivot, col);
            swap_rows(&mut inv, pivot, col);
        }
        let p = work.get(col, col);
        for j in 0..n {
            work.set(col, j, work.get(col, j) / p);
            inv.set(col, j, inv.get(col, j) / p);
        }
        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = work.get(r, col);
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                work.set(r, j, work.get(r, j) - factor * work.get(col, j));
                inv.set(r, j, inv.get(r, j) - factor * inv.get(col, j));
            }
        }
    }
    if inv.is_finite() {
        Some(inv)
    } else {
        None
    }
}

fn swap_rows(m: &mut Matrix, a: usize, b: usize) {
    let cols = m.cols();
    let data = m.as_mut_slice();
    for j in 0..cols {
        data.swap(a * cols + j, b * cols + j);
    }
}

/// Lower Cholesky factor of a symmetric positive definite matrix.
pub fn cholesky(a: &Matrix) -> Option<Matrix> {
    if !a.is_square() {
        return None;
    }
    let n = a.rows();
    let mut l = Matrix::zeros(n, n);
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l.get(i, k) * l.get(j, k);
            }
            if i == j {
                let diag = a.get(i, i) - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l.set(i, i, diag.sqrt());
            } else {
                l.set(i, j, (a.get(i, j) - sum) / l.get(j, j));
            }
        }
    }
    Some(l)
}

pub fn log_det_spd(a: &Matrix) -> Option<f64> {
    let l = cholesky(a)?;
    Some((0..l.rows()).map(|i| 2.0 * l.get(i, i).ln()).sum())
}

/// Largest eigenvalue of a symmetric positive semi-definite matrix (power iteration).
pub fn spectral_radius_psd(a: &Matrix) -> f64 {
    let n = a.rows();
    if n == 0 {
        return 0.0;
    }
    let mut v = vec![1.0 / (n as f64).sqrt(); n];
    let mut lambda = 0.0;
    for _ in 0..200 {
        let mut next = vec![0.0; n];
        for (i, out) in next.iter_mut().enumerate() {
            *out = a.row(i).iter().zip(&v).map(|(x, y)| x * y).sum();
        }
        let norm = next.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        let prev = lambda;
        lambda = norm;
        v = next.into_iter().map(|x| x / norm).collect();
        if (lambda - prev).abs() <= 1e-10 * lambda.max(1.0) {
            break;
        }
    }
    lambda
}

pub fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} vs {} (tol {})", a, b, tol);
    }

    #[test]
    fn correlation_of_scaled_copy_is_one() {
        let x = Matrix::from_rows(&[vec![1.0, 2.0, 3.0, 4.0], vec![2.0, 4.0, 6.0, 8.0]]).unwrap();
        let r = correlation(&x);
        assert_close(r.get(0, 1), 1.0, 1e-12);
        assert_close(r.get(1, 0), 1.0, 1e-12);
    }

    #[test]
    fn correlation_ignores_flat_channels() {
        let x = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![7.0, 7.0, 7.0]]).unwrap();
        let r = correlation(&x);
        assert_eq!(r.get(0, 1), 0.0);
        assert_eq!(r.get(1, 1), 1.0);
    }

    #[test]
    fn invert_round_trips_to_identity() {
        let a = Matrix::from_rows(&[
            vec![4.0, 1.0, 0.5],
            vec![1.0, 3.0, 0.2],
            vec![0.5, 0.2, 2.0],
        ])
        .unwrap();
        let inv = invert(&a).unwrap();
        let id = a.matmul(&inv);
        for i in 0..3 {
            for j in 0..3 {
                assert_close(id.get(i, j), if i == j { 1.0 } else { 0.0 }, 1e-10);
            }
        }
    }

    #[test]
    fn invert_detects_singular() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert!(invert(&a).is_none());
    }

    #[test]
    fn log_det_matches_diagonal_product() {
        let a = Matrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 8.0]]).unwrap();
        assert_close(log_det_spd(&a).unwrap(), 16f64.ln(), 1e-12);
        let indefinite = Matrix::from_rows(&[vec![1.0, 3.0], vec![3.0, 1.0]]).unwrap();
        assert!(log_det_spd(&indefinite).is_none());
    }

    #[test]
    fn spectral_radius_of_diagonal() {
        let a = Matrix::from_rows(&[vec![3.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_close(spectral_radius_psd(&a), 3.0, 1e-6);
    }

    #[test]
    fn soft_threshold_shrinks_towards_zero() {
        assert_eq!(soft_threshold(0.5, 0.2), 0.3);
        assert_eq!(soft_threshold(-0.5, 0.2), -0.3);
        assert_eq!(soft_threshold(0.1, 0.2), 0.0);
    }
}

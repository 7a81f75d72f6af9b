//! Two-sample Kolmogorov-Smirnov test.
//!
//! The two-sided p-value is exact (lattice path counting) while both
//! samples have at most [`EXACT_MAX_SAMPLE_SIZE`] values, and otherwise comes
//! from the asymptotic Kolmogorov distribution with Stephens' correction.

use std::cmp::Ordering;

/// Largest sample size for which the exact p-value is computed.
pub const EXACT_MAX_SAMPLE_SIZE: usize = 10_000;

/// Outcome of a two-sample test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    /// `sup |F1(x) - F2(x)|`.
    pub statistic: f64,
    /// Probability of a statistic at least this large under the null.
    /// `NaN` when either sample is empty.
    pub p_value: f64,
}

/// Runs the two-sample test on any totally-comparable values.
///
/// Values that are not comparable to themselves (such as `NaN`) must be
/// filtered out by the caller.
///
/// # Examples
///
/// ```
/// use sensorflow::drift::ks_2samp;
///
/// let a = [1.0, 2.0, 3.0, 4.0];
/// let result = ks_2samp(&a, &a);
/// assert_eq!(result.statistic, 0.0);
/// assert_eq!(result.p_value, 1.0);
/// ```
pub fn ks_2samp<T: PartialOrd>(first: &[T], second: &[T]) -> KsResult {
    if first.is_empty() || second.is_empty() {
        return KsResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
    }

    let mut a: Vec<&T> = first.iter().collect();
    let mut b: Vec<&T> = second.iter().collect();
    a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));
    b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));

    let statistic = ks_statistic(&a, &b);
    KsResult {
        statistic,
        p_value: two_sided_p_value(statistic, a.len(), b.len()),
    }
}

/// Two-sided p-value for statistic `d` between samples of size `n` and `m`.
///
/// Exact up to [`EXACT_MAX_SAMPLE_SIZE`], asymptotic beyond.
#[must_use]
pub fn two_sided_p_value(d: f64, n: usize, m: usize) -> f64 {
    if n.max(m) <= EXACT_MAX_SAMPLE_SIZE {
        ks_p_value_exact(d, n, m)
    } else {
        let (n, m) = (n as f64, m as f64);
        ks_p_value(d, n * m / (n + m))
    }
}

/// Exact two-sided p-value `P(D >= d)` under the null.
///
/// Counts the monotone lattice paths from `(0, 0)` to `(n, m)` that keep
/// `|i/n - j/m| < d` at every step. Counts are kept normalised by
/// `C(i + j, i)` so large samples do not overflow.
///
/// # Examples
///
/// ```
/// use sensorflow::drift::ks_p_value_exact;
///
/// assert!((ks_p_value_exact(1.0, 3, 3) - 0.1).abs() < 1e-12);
/// ```
#[must_use]
pub fn ks_p_value_exact(d: f64, n: usize, m: usize) -> f64 {
    if d.is_nan() || n == 0 || m == 0 {
        return f64::NAN;
    }
    if d <= 0.0 {
        return 1.0;
    }

    // `d` is attained as |i·m - j·n| / (n·m), so compare on that integer lattice.
    let (n_u, m_u) = (n as u64, m as u64);
    let threshold = (d * (n_u * m_u) as f64).round() as u64;
    let outside = |i: usize, j: usize| (i as u64 * m_u).abs_diff(j as u64 * n_u) >= threshold;

    let mut row = vec![0.0_f64; m + 1];
    for i in 0..=n {
        for j in 0..=m {
            row[j] = if outside(i, j) {
                0.0
            } else if i == 0 && j == 0 {
                1.0
            } else {
                let total = (i + j) as f64;
                let from_above = if i > 0 { row[j] * i as f64 / total } else { 0.0 };
                let from_left = if j > 0 { row[j - 1] * j as f64 / total } else { 0.0 };
                from_above + from_left
            };
        }
    }
    (1.0 - row[m]).clamp(0.0, 1.0)
}

/// `D` over two sorted samples. Ties advance both cursors together.
fn ks_statistic<T: PartialOrd>(a: &[&T], b: &[&T]) -> f64 {
    let (n, m) = (a.len(), b.len());
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;

    while i < n && j < m {
        let x = if a[i] <= b[j] { a[i] } else { b[j] };
        while i < n && a[i] <= x {
            i += 1;
        }
        while j < m && b[j] <= x {
            j += 1;
        }
        let gap = (i as f64 / n as f64 - j as f64 / m as f64).abs();
        d = d.max(gap);
    }
    d
}

/// Asymptotic p-value for statistic `d` at effective sample size `ne`.
#[must_use]
pub fn ks_p_value(d: f64, ne: f64) -> f64 {
    if d.is_nan() || ne <= 0.0 {
        return f64::NAN;
    }
    let sqrt_ne = ne.sqrt();
    let lambda = (sqrt_ne + 0.12 + 0.11 / sqrt_ne) * d;
    kolmogorov_q(lambda)
}

/// Complementary Kolmogorov distribution `Q(z) = 1 - K(z)`.
///
/// # Examples
///
/// ```
/// use sensorflow::drift::kolmogorov_q;
///
/// assert_eq!(kolmogorov_q(0.0), 1.0);
/// assert!((kolmogorov_q(1.0) - 0.27).abs() < 1e-3);
/// ```
#[must_use]
pub fn kolmogorov_q(z: f64) -> f64 {
    if z <= 0.0 {
        return 1.0;
    }
    let q = if z < 1.18 {
        let c = 1.233_700_550_136_17 / (z * z);
        let y = (-c).exp();
        let cdf = 2.256_758_334_191_025 * c.sqrt() * (y + y.powi(9) + y.powi(25) + y.powi(49));
        1.0 - cdf
    } else {
        let x = (-2.0 * z * z).exp();
        2.0 * (x - x.powi(4) + x.powi(9))
    };
    q.clamp(0.0, 1.0)
}

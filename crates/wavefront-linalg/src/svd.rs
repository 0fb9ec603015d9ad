//! Singular Value Decomposition (SVD) of general dense matrices.
//!
//! This module implements the Golub–Kahan–Reinsch algorithm for real m×n
//! matrices with m ≥ n, as used by least-squares fits and orthonormal basis
//! construction in wavefront estimation.
//!
//! # Mathematical Background
//!
//! For a matrix A ∈ ℝᵐˣⁿ the SVD factorizes it into three matrices:
//!
//! ```text
//! A = U diag(w) Vᵀ
//! ```
//!
//! where:
//! * U ∈ ℝᵐˣⁿ has orthonormal columns (left singular vectors)
//! * w ∈ ℝⁿ holds the singular values (w₁ ≥ w₂ ≥ … ≥ wₙ ≥ 0)
//! * V ∈ ℝⁿˣⁿ is an orthogonal matrix (right singular vectors)
//!
//! # Implementation Details
//!
//! The decomposition runs in four ordered phases:
//! * Householder reduction of A to upper bidiagonal form, accumulating the
//!   left and right transformations
//! * implicit-shift QR iteration with Givens rotations until the bidiagonal
//!   form is diagonal, capped at [`MAX_SWEEPS`] sweeps per singular value
//! * an in-place Shell sort into descending order with lockstep column
//!   permutation of U and V, followed by a majority-sign normalization that
//!   removes the ±1 ambiguity of each singular vector pair
//! * a fail-fast scan rejecting any non-finite entry in the factors
//!
//! Reciprocals of computed magnitudes are routed through a finiteness guard
//! so that denormalized intermediates degrade to zero contributions instead
//! of poisoning the factors with `inf`/`NaN`.
//!
//! # Example
//!
//! ```
//! use wavefront_linalg::matrix::Matrix;
//! use wavefront_linalg::svd::svd;
//!
//! let a = Matrix::from_rows(&[[2.0, 0.0], [0.0, 3.0]]);
//!
//! let decomposition = svd(&a).unwrap();
//! assert!((decomposition.w()[0] - 3.0).abs() < 1e-12);
//! assert!((decomposition.w()[1] - 2.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! * Golub and Reinsch (1970). "Singular value decomposition and least
//!   squares solutions." Numerische Mathematik 14, 403–420.
//! * Golub and Van Loan, "Matrix Computations", 4th ed., §8.6.

use crate::error::SvdError;
use crate::matrix::Matrix;

/// Maximum number of implicit-shift QR sweeps spent on a single singular
/// value before the decomposition is abandoned.
pub const MAX_SWEEPS: usize = 30;

/// Multiplier of the Shell sort gap sequence (`gap -> 3 * gap + 1`) used by
/// the reordering pass.
pub const SHELL_SORT_GAP_FACTOR: usize = 3;

/// Result of a singular value decomposition `A = U · diag(w) · Vᵀ`.
#[derive(Debug, Clone)]
pub struct SvdDecomposition {
    u: Matrix,
    w: Vec<f64>,
    v: Matrix,
    threshold: f64,
}

impl SvdDecomposition {
    /// The m×n matrix of left singular vectors (orthonormal columns).
    #[inline]
    pub fn u(&self) -> &Matrix {
        &self.u
    }

    /// The singular values, sorted descending, all non-negative.
    #[inline]
    pub fn w(&self) -> &[f64] {
        &self.w
    }

    /// The n×n orthogonal matrix of right singular vectors.
    #[inline]
    pub fn v(&self) -> &Matrix {
        &self.v
    }

    /// Numerical threshold below which a singular value should be treated
    /// as zero when estimating rank.
    ///
    /// Computed as `0.5 * sqrt(m + n + 1) * |w[0]| * f64::EPSILON`, where
    /// `w[0]` is read after diagonalization but before the descending sort,
    /// matching the reference convention. Diagonalization tends to leave the
    /// largest value at index 0, but this is not guaranteed; callers that
    /// need a strict bound can recompute the formula from `w()[0]`.
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of singular values strictly above [`Self::threshold`].
    pub fn rank(&self) -> usize {
        self.w.iter().filter(|&&x| x > self.threshold).count()
    }

    /// Number of singular values at or below [`Self::threshold`].
    pub fn nullity(&self) -> usize {
        self.w.len() - self.rank()
    }
}

/// Decompose `a` into `U · diag(w) · Vᵀ`.
///
/// # Arguments
///
/// * `a` - Input m×n matrix with m ≥ n (tall or square). The input is not
///   modified; the engine works on its own copy.
///
/// # Returns
///
/// An [`SvdDecomposition`] holding U, w, V and the numerical rank
/// threshold.
///
/// # Errors
///
/// * [`SvdError::DimensionMismatch`] for m < n or empty inputs.
/// * [`SvdError::ConvergenceFailure`] when a singular value does not
///   isolate within [`MAX_SWEEPS`] QR sweeps.
/// * [`SvdError::NonFiniteResult`] when the finished factors contain NaN
///   or infinite entries.
pub fn svd(a: &Matrix) -> Result<SvdDecomposition, SvdError> {
    svd_with_sweep_cap(a, MAX_SWEEPS)
}

/// Same as [`svd`] but with an injectable sweep cap, so the convergence
/// failure path can be exercised without a pathological input.
pub(crate) fn svd_with_sweep_cap(
    a: &Matrix,
    max_sweeps: usize,
) -> Result<SvdDecomposition, SvdError> {
    let m = a.rows();
    let n = a.cols();
    if m < n || n == 0 {
        return Err(SvdError::DimensionMismatch { rows: m, cols: n });
    }

    let mut u = a.clone();
    let mut w = vec![0.0; n];
    let mut v = Matrix::zeros(n, n);
    let mut rv1 = vec![0.0; n];

    let anorm = bidiagonalize(&mut u, &mut w, &mut rv1);
    accumulate_right(&u, &mut v, &rv1);
    accumulate_left(&mut u, &w);
    diagonalize(&mut u, &mut w, &mut v, &mut rv1, anorm, max_sweeps)?;

    // Reference convention: the rank threshold reads w[0] before the sort.
    let threshold = 0.5 * ((m + n + 1) as f64).sqrt() * w[0].abs() * f64::EPSILON;

    reorder(&mut u, &mut w, &mut v);
    validate_finite(&u, &w, &v)?;

    Ok(SvdDecomposition {
        u,
        w,
        v,
        threshold,
    })
}

/// `magnitude` carrying the sign of `direction`.
#[inline]
fn sign(magnitude: f64, direction: f64) -> f64 {
    if direction >= 0.0 {
        magnitude.abs()
    } else {
        -magnitude.abs()
    }
}

/// `sqrt(a² + b²)` without intermediate overflow, factoring out the larger
/// magnitude.
fn pythag(a: f64, b: f64) -> f64 {
    let abs_a = a.abs();
    let abs_b = b.abs();
    if abs_a > abs_b {
        let ratio = abs_b / abs_a;
        abs_a * (1.0 + ratio * ratio).sqrt()
    } else if abs_b == 0.0 {
        0.0
    } else {
        let ratio = abs_a / abs_b;
        abs_b * (1.0 + ratio * ratio).sqrt()
    }
}

/// Reciprocal of `x`, or `None` when the reciprocal is not finite.
///
/// Denormalized magnitudes can survive the column scaling; inverting one
/// yields `inf` and would poison every entry it touches. All division sites
/// in the reduction and iteration passes route through this guard and treat
/// `None` as a zero contribution.
#[inline]
fn safe_recip(x: f64) -> Option<f64> {
    let recip = 1.0 / x;
    recip.is_finite().then_some(recip)
}

/// Apply the Givens rotation `(c, s)` to columns `p` and `q` of `mat`.
fn rotate_columns(mat: &mut Matrix, p: usize, q: usize, c: f64, s: f64) {
    for row in 0..mat.rows() {
        let y = mat[(row, p)];
        let z = mat[(row, q)];
        mat[(row, p)] = y * c + z * s;
        mat[(row, q)] = z * c - y * s;
    }
}

/// Householder reduction of `u` (initially a copy of A) to upper bidiagonal
/// form.
///
/// On return `w` holds the diagonal, `rv1` the superdiagonal, and `u` the
/// implicit Householder vectors consumed by the accumulation passes. The
/// returned value is the norm estimate `max_i(|w[i]| + |rv1[i]|)` used as
/// the convergence tolerance scale.
fn bidiagonalize(u: &mut Matrix, w: &mut [f64], rv1: &mut [f64]) -> f64 {
    let m = u.rows();
    let n = u.cols();
    let mut g = 0.0;
    let mut scale = 0.0;
    let mut anorm: f64 = 0.0;

    for i in 0..n {
        let l = i + 1;
        rv1[i] = scale * g;
        g = 0.0;
        scale = 0.0;

        // Left reflection: zero the subdiagonal part of column i.
        for k in i..m {
            scale += u[(k, i)].abs();
        }
        if scale != 0.0 {
            let mut s = 0.0;
            for k in i..m {
                u[(k, i)] /= scale;
                s += u[(k, i)] * u[(k, i)];
            }
            let f = u[(i, i)];
            g = -sign(s.sqrt(), f);
            let h = f * g - s;
            u[(i, i)] = f - g;
            let h_inv = safe_recip(h).unwrap_or(0.0);
            for j in l..n {
                let mut dot = 0.0;
                for k in i..m {
                    dot += u[(k, i)] * u[(k, j)];
                }
                let f = dot * h_inv;
                for k in i..m {
                    u[(k, j)] += f * u[(k, i)];
                }
            }
            for k in i..m {
                u[(k, i)] *= scale;
            }
        }
        w[i] = scale * g;

        g = 0.0;
        scale = 0.0;

        // Right reflection: zero row i beyond the superdiagonal.
        if i != n - 1 {
            for k in l..n {
                scale += u[(i, k)].abs();
            }
            if scale != 0.0 {
                let mut s = 0.0;
                for k in l..n {
                    u[(i, k)] /= scale;
                    s += u[(i, k)] * u[(i, k)];
                }
                let f = u[(i, l)];
                g = -sign(s.sqrt(), f);
                let h = f * g - s;
                u[(i, l)] = f - g;
                let h_inv = safe_recip(h).unwrap_or(0.0);
                for k in l..n {
                    rv1[k] = u[(i, k)] * h_inv;
                }
                for j in l..m {
                    let mut dot = 0.0;
                    for k in l..n {
                        dot += u[(j, k)] * u[(i, k)];
                    }
                    for k in l..n {
                        u[(j, k)] += dot * rv1[k];
                    }
                }
                for k in l..n {
                    u[(i, k)] *= scale;
                }
            }
        }
        anorm = anorm.max(w[i].abs() + rv1[i].abs());
    }
    anorm
}

/// Backward pass constructing V from the row-reflection data stored in `u`.
fn accumulate_right(u: &Matrix, v: &mut Matrix, rv1: &[f64]) {
    let n = v.rows();
    for i in (0..n).rev() {
        let l = i + 1;
        if i < n - 1 {
            // Double division keeps a possible underflow in u[(i, l)] from
            // amplifying through the whole column.
            if let (Some(g_inv), Some(head_inv)) = (safe_recip(rv1[l]), safe_recip(u[(i, l)])) {
                for j in l..n {
                    v[(j, i)] = u[(i, j)] * head_inv * g_inv;
                }
                for j in l..n {
                    let mut dot = 0.0;
                    for k in l..n {
                        dot += u[(i, k)] * v[(k, j)];
                    }
                    for k in l..n {
                        v[(k, j)] += dot * v[(k, i)];
                    }
                }
            }
            for j in l..n {
                v[(i, j)] = 0.0;
                v[(j, i)] = 0.0;
            }
        }
        v[(i, i)] = 1.0;
    }
}

/// Forward pass finishing U from the column-reflection data left in place
/// by the bidiagonalization.
fn accumulate_left(u: &mut Matrix, w: &[f64]) {
    let m = u.rows();
    let n = u.cols();
    for i in (0..n).rev() {
        let l = i + 1;
        for j in l..n {
            u[(i, j)] = 0.0;
        }
        match safe_recip(w[i]) {
            Some(g_inv) => {
                for j in l..n {
                    let mut dot = 0.0;
                    for k in l..m {
                        dot += u[(k, i)] * u[(k, j)];
                    }
                    let f = dot * safe_recip(u[(i, i)]).unwrap_or(0.0) * g_inv;
                    for k in i..m {
                        u[(k, j)] += f * u[(k, i)];
                    }
                }
                for j in i..m {
                    u[(j, i)] *= g_inv;
                }
            }
            None => {
                // Degenerate reflection: fall back to a canonical basis
                // column.
                for j in i..m {
                    u[(j, i)] = 0.0;
                }
            }
        }
        u[(i, i)] += 1.0;
    }
}

/// Outcome of scanning upward from index `k` for a place where the
/// bidiagonal problem splits into independent blocks.
enum SplitScan {
    /// `rv1[l]` is negligible (or `l == 0`); the block `l..=k` stands alone.
    Superdiagonal(usize),
    /// `w[l - 1]` is negligible; a cancellation sweep must run first.
    Diagonal(usize),
}

fn scan_for_split(w: &[f64], rv1: &[f64], k: usize, tol: f64) -> SplitScan {
    let mut l = k;
    while l > 0 {
        if rv1[l].abs() <= tol {
            return SplitScan::Superdiagonal(l);
        }
        if w[l - 1].abs() <= tol {
            return SplitScan::Diagonal(l);
        }
        l -= 1;
    }
    SplitScan::Superdiagonal(0)
}

/// Chase the negligible diagonal element at `l - 1` out of the active block
/// with Givens rotations, keeping the columns of `u` consistent.
fn cancel_superdiagonal(
    u: &mut Matrix,
    w: &mut [f64],
    rv1: &mut [f64],
    l: usize,
    k: usize,
    tol: f64,
) {
    let mut c = 0.0;
    let mut s = 1.0;
    for i in l..=k {
        let f = s * rv1[i];
        rv1[i] *= c;
        if f.abs() <= tol {
            break;
        }
        let g = w[i];
        let h = pythag(f, g);
        w[i] = h;
        if let Some(h_inv) = safe_recip(h) {
            c = g * h_inv;
            s = -f * h_inv;
            rotate_columns(u, l - 1, i, c, s);
        }
    }
}

/// One implicit-shift QR sweep over the active block `l..=k`.
///
/// The shift comes from the trailing 2×2 submatrix; the bulge is then
/// chased down the superdiagonal with Givens rotations whose left and right
/// factors stream into the columns of `u` and `v`.
fn qr_step(u: &mut Matrix, w: &mut [f64], v: &mut Matrix, rv1: &mut [f64], l: usize, k: usize) {
    let z = w[k];
    let mut x = w[l];
    let y = w[k - 1];
    let mut g = rv1[k - 1];
    let mut h = rv1[k];

    let mut f = ((y - z) * (y + z) + (g - h) * (g + h)) * safe_recip(2.0 * h * y).unwrap_or(0.0);
    g = pythag(f, 1.0);
    f = ((x - z) * (x + z) + h * (y * safe_recip(f + sign(g, f)).unwrap_or(0.0) - h))
        * safe_recip(x).unwrap_or(0.0);

    let mut c = 1.0;
    let mut s = 1.0;
    for j in l..k {
        let i = j + 1;
        g = rv1[i];
        let mut y = w[i];
        h = s * g;
        g *= c;

        let mut rot = pythag(f, h);
        rv1[j] = rot;
        if let Some(rot_inv) = safe_recip(rot) {
            c = f * rot_inv;
            s = h * rot_inv;
        }
        f = x * c + g * s;
        g = g * c - x * s;
        h = y * s;
        y *= c;
        rotate_columns(v, j, i, c, s);

        rot = pythag(f, h);
        w[j] = rot;
        if let Some(rot_inv) = safe_recip(rot) {
            c = f * rot_inv;
            s = h * rot_inv;
        }
        f = c * g + s * y;
        x = c * y - s * g;
        rotate_columns(u, j, i, c, s);
    }
    rv1[l] = 0.0;
    rv1[k] = f;
    w[k] = x;
}

/// Drive the bidiagonal form (`w` diagonal, `rv1` superdiagonal) to a
/// diagonal one, updating `u` and `v` along the way.
fn diagonalize(
    u: &mut Matrix,
    w: &mut [f64],
    v: &mut Matrix,
    rv1: &mut [f64],
    anorm: f64,
    max_sweeps: usize,
) -> Result<(), SvdError> {
    let n = w.len();
    let tol = f64::EPSILON * anorm;

    for k in (0..n).rev() {
        let mut isolated = false;
        for sweep in 0..max_sweeps {
            let l = match scan_for_split(w, rv1, k, tol) {
                SplitScan::Superdiagonal(l) => l,
                SplitScan::Diagonal(l) => {
                    cancel_superdiagonal(u, w, rv1, l, k, tol);
                    l
                }
            };

            if l == k {
                // Isolated singular value; fix its sign at the source.
                if w[k] < 0.0 {
                    w[k] = -w[k];
                    for j in 0..v.rows() {
                        v[(j, k)] = -v[(j, k)];
                    }
                }
                isolated = true;
                break;
            }
            if sweep + 1 == max_sweeps {
                return Err(SvdError::ConvergenceFailure { index: k });
            }

            qr_step(u, w, v, rv1, l, k);
        }
        if !isolated {
            return Err(SvdError::ConvergenceFailure { index: k });
        }
    }
    Ok(())
}

/// Sort the singular values into descending order, permuting the columns of
/// `u` and `v` in lockstep, then apply the majority-sign convention to each
/// singular vector pair.
fn reorder(u: &mut Matrix, w: &mut [f64], v: &mut Matrix) {
    let m = u.rows();
    let n = w.len();

    let mut inc = 1;
    loop {
        inc = SHELL_SORT_GAP_FACTOR * inc + 1;
        if inc > n {
            break;
        }
    }

    let mut su = vec![0.0; m];
    let mut sv = vec![0.0; n];
    loop {
        inc /= SHELL_SORT_GAP_FACTOR;
        for i in inc..n {
            let sw = w[i];
            for (k, slot) in su.iter_mut().enumerate() {
                *slot = u[(k, i)];
            }
            for (k, slot) in sv.iter_mut().enumerate() {
                *slot = v[(k, i)];
            }
            let mut j = i;
            while w[j - inc] < sw {
                w[j] = w[j - inc];
                for k in 0..m {
                    u[(k, j)] = u[(k, j - inc)];
                }
                for k in 0..n {
                    v[(k, j)] = v[(k, j - inc)];
                }
                j -= inc;
                if j < inc {
                    break;
                }
            }
            w[j] = sw;
            for k in 0..m {
                u[(k, j)] = su[k];
            }
            for k in 0..n {
                v[(k, j)] = sv[k];
            }
        }
        if inc <= 1 {
            break;
        }
    }

    // Flip a singular vector pair when more than half of its entries are
    // negative, making the ±1 ambiguity reproducible across runs.
    for col in 0..n {
        let mut negatives = 0;
        for i in 0..m {
            if u[(i, col)] < 0.0 {
                negatives += 1;
            }
        }
        for j in 0..n {
            if v[(j, col)] < 0.0 {
                negatives += 1;
            }
        }
        if negatives > (m + n) / 2 {
            for i in 0..m {
                u[(i, col)] = -u[(i, col)];
            }
            for j in 0..n {
                v[(j, col)] = -v[(j, col)];
            }
        }
    }
}

/// Fail-fast scan asserting every output entry is a finite IEEE-754 value.
fn validate_finite(u: &Matrix, w: &[f64], v: &Matrix) -> Result<(), SvdError> {
    let all_finite = u
        .as_slice()
        .iter()
        .chain(v.as_slice())
        .chain(w)
        .all(|x| x.is_finite());
    if all_finite {
        Ok(())
    } else {
        Err(SvdError::NonFiniteResult)
    }
}

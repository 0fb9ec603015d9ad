/// An error type for the decomposition routines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SvdError {
    /// The implicit-shift QR iteration failed to isolate a singular value
    /// within the sweep limit. Callers must decide whether to skip, perturb
    /// or reject the input matrix.
    #[error("singular value {index} did not converge within the QR sweep limit")]
    ConvergenceFailure {
        /// Index of the singular value whose iteration hit the limit.
        index: usize,
    },

    /// The finished factors contain NaN or infinite entries, typically
    /// caused by extreme or denormalized input magnitudes. Kept distinct
    /// from [`SvdError::ConvergenceFailure`] so callers can tell "took too
    /// long" apart from "produced garbage".
    #[error("decomposition produced non-finite values")]
    NonFiniteResult,

    /// The input matrix has more columns than rows, or no columns at all.
    #[error("unsupported input shape {rows}x{cols}: at least as many rows as columns required")]
    DimensionMismatch {
        /// Number of rows in the rejected input.
        rows: usize,
        /// Number of columns in the rejected input.
        cols: usize,
    },
}

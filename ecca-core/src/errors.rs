use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum EccaError {
    #[error("{0}")]
    Error(String),
    #[error("{quantity} = {value} is outside the physically valid range ({lo}, {hi})")]
    DomainError {
        quantity: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },
    #[error("root finding did not converge: |residual| = {residual:.3e} after {iterations} iterations")]
    ConvergenceFailure { residual: f64, iterations: usize },
    #[error("{available} samples available but at least {required} are required")]
    InsufficientData { available: usize, required: usize },
}

/// Convenience type for `Result<T, EccaError>`.
pub type EccaResult<T> = Result<T, EccaError>;

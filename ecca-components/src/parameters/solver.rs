//! Solver settings
//!
//! Convergence tolerance, Newton-stage iteration budget and the fallback
//! bracket are an explicit configuration struct rather than buried default
//! arguments, so a session can pin them once and reuse them everywhere.

use ecca_core::errors::{EccaError, EccaResult};
use ecca_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

use crate::carbonate::{PH_MAX, PH_MIN};

/// Settings for the equilibrium root-finding procedure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Residual threshold (mol/L in alkalinity units) below which a root
    /// counts as converged.
    /// default: 1e-9
    pub tolerance: FloatValue,

    /// Iteration budget of the Newton stage before falling back to
    /// bisection.
    /// default: 50
    pub max_iterations: usize,

    /// Physically safe `(lo, hi)` bracket for the bisection fallback.
    /// default: (0, 14), the valid pH domain
    pub bracket: (FloatValue, FloatValue),
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 50,
            bracket: (PH_MIN, PH_MAX),
        }
    }
}

impl SolverConfig {
    /// Check that the tolerance is positive and the bracket is ordered.
    pub fn validate(&self) -> EccaResult<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(EccaError::DomainError {
                quantity: "solver tolerance",
                value: self.tolerance,
                lo: 0.0,
                hi: f64::INFINITY,
            });
        }
        let (lo, hi) = self.bracket;
        if !lo.is_finite() || !hi.is_finite() || hi <= lo {
            return Err(EccaError::DomainError {
                quantity: "bracket width",
                value: hi - lo,
                lo: 0.0,
                hi: f64::INFINITY,
            });
        }
        Ok(())
    }
}

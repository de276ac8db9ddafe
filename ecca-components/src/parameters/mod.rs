//! Component parameters
//!
//! Physicochemical constants shared by every solver call, and the solver's
//! own convergence settings. Both carry defaults matching the apparatus
//! configuration and validate themselves before any numerics run.

mod equilibrium;
mod solver;

pub use equilibrium::EquilibriumConstants;
pub use solver::SolverConfig;

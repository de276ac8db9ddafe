//! Gas-flow analysis
//!
//! This module contains the components that turn a flow or composition
//! series into a captured/released amount:
//!
//! - `locator`: finds the timestamps of sustained gas-switch events,
//!   which delimit the windows the other two components work on
//! - `baseline`: fits the reference trend the signal would have followed
//!   absent the event
//! - `integrator`: integrates the baseline-referenced residual over a
//!   capture or outgas window into a signed molar amount

pub mod baseline;
pub mod integrator;
pub mod locator;

pub use baseline::{BaselineDetector, BaselineFit, FitOrder};
pub use integrator::{cycle_average, AmountIntegrator, AmountResult};
pub use locator::{ChangeDirection, GasChangeEvent, GasChangeEvents, GasChangeLocator};

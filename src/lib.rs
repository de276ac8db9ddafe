//! Analysis toolkit for electrochemically mediated CO2 capture experiments.
//!
//! The functionality lives in two member crates, re-exported here:
//! `ecca-core` supplies the time-series, window and error types shared by
//! every component, and `ecca-components` supplies the carbonate
//! equilibrium solver and the gas-flow analysis components.
//!
//! `ndarray` is re-exported so callers can build input arrays without
//! taking on an extra dependency.

pub use ecca_components as components;
pub use ecca_core::{errors, timeseries, window};
pub use ndarray;

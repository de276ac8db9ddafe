//! Analysis components for electrochemically mediated CO2 capture
//!
//! This crate turns cleaned, time-indexed instrument series into physically
//! consistent quantities for a CO2 capture/release apparatus.
//!
//! # Module Organisation
//!
//! Components are organised by domain:
//! - `carbonate`: carbonate speciation algebra and the equilibrium solver
//!   inverting pH ⇄ total alkalinity ⇄ DIC
//! - `gas`: gas-switch location, baseline fitting and baseline-referenced
//!   amount integration over flow series
//!
//! # Parameters
//!
//! Physicochemical constants and solver settings live in the `parameters`
//! module, with defaults matching the apparatus configuration and optional
//! TOML loading.

pub mod carbonate;
pub mod gas;
pub mod parameters;

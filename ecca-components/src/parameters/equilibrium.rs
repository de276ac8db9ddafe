//! Equilibrium constants
//!
//! The immutable physicochemical configuration shared read-only by every
//! solver call: carbonic-acid dissociation constants, the water ion
//! product, Henry's law constant, and the apparatus geometry (electrolyte
//! volume, regulated inlet flow).
//!
//! Constants are fixed at session start. They can be populated from the
//! experiment configuration file via [`EquilibriumConstants::from_toml_str`];
//! missing fields fall back to the documented defaults, and the result is
//! validated before use.

use ecca_core::errors::{EccaError, EccaResult};
use ecca_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// First dissociation constant of carbonic acid (mol/L).
pub const K1_CARBONIC: FloatValue = 1.1e-6;

/// Second dissociation constant of carbonic acid (mol/L).
pub const K2_CARBONIC: FloatValue = 4.1e-10;

/// Ion product of water (mol^2/L^2).
pub const KW_WATER: FloatValue = 1.0e-14;

/// Henry's law constant for CO2 in the electrolyte (mol/(L bar)).
pub const HENRY_CO2: FloatValue = 0.035;

/// Electrolyte volume of the capture cell (L).
pub const ELECTROLYTE_VOLUME: FloatValue = 0.01;

/// Regulated total inlet gas flow (sccm).
pub const GAS_FLOW_REFERENCE: FloatValue = 10.0;

/// Cell temperature (K) at which the dissociation constants were taken.
pub const CELL_TEMPERATURE: FloatValue = 298.15;

/// Physicochemical constants of the capture cell.
///
/// Created once at session start and shared read-only afterwards; every
/// solver call only reads these values, so a single instance can be shared
/// across worker threads without synchronisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquilibriumConstants {
    /// First dissociation constant of carbonic acid (mol/L).
    /// default: 1.1e-6
    pub k1: FloatValue,

    /// Second dissociation constant of carbonic acid (mol/L).
    /// default: 4.1e-10
    pub k2: FloatValue,

    /// Ion product of water (mol^2/L^2).
    /// default: 1e-14
    pub kw: FloatValue,

    /// Henry's law constant for CO2 (mol/(L bar)).
    /// default: 0.035
    pub henry_constant: FloatValue,

    /// Cell temperature (K).
    /// default: 298.15
    pub temperature: FloatValue,

    /// Electrolyte volume (L).
    /// default: 0.01
    pub volume: FloatValue,

    /// Regulated total inlet gas flow (sccm), the reference against which
    /// flow-meter readings are converted to molar amounts downstream.
    /// default: 10.0
    pub gas_flow_reference: FloatValue,
}

impl Default for EquilibriumConstants {
    fn default() -> Self {
        Self {
            k1: K1_CARBONIC,
            k2: K2_CARBONIC,
            kw: KW_WATER,
            henry_constant: HENRY_CO2,
            temperature: CELL_TEMPERATURE,
            volume: ELECTROLYTE_VOLUME,
            gas_flow_reference: GAS_FLOW_REFERENCE,
        }
    }
}

impl EquilibriumConstants {
    /// Check that every constant is finite and strictly positive.
    ///
    /// Rejected values surface as [`EccaError::DomainError`] before any
    /// iteration begins.
    pub fn validate(&self) -> EccaResult<()> {
        let fields = [
            ("k1", self.k1),
            ("k2", self.k2),
            ("kw", self.kw),
            ("henry constant", self.henry_constant),
            ("temperature", self.temperature),
            ("electrolyte volume", self.volume),
            ("gas flow reference", self.gas_flow_reference),
        ];
        for (quantity, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(EccaError::DomainError {
                    quantity,
                    value,
                    lo: 0.0,
                    hi: f64::INFINITY,
                });
            }
        }
        Ok(())
    }

    /// Load constants from experiment configuration in TOML form.
    ///
    /// Fields absent from the document keep their defaults; the loaded set
    /// is validated before it is returned.
    pub fn from_toml_str(document: &str) -> EccaResult<Self> {
        let constants: Self =
            toml::from_str(document).map_err(|e| EccaError::Error(e.to_string()))?;
        constants.validate()?;
        Ok(constants)
    }

    /// Dissolved CO2 concentration (mol/L) in equilibrium with a gas phase
    /// at partial pressure `pco2` (bar), by Henry's law.
    pub fn co2aq_from_pco2(&self, pco2: FloatValue) -> FloatValue {
        pco2 * self.henry_constant
    }
}

//! Carbonate speciation algebra
//!
//! Closed-form relations among pH, dissolved CO2, bicarbonate, carbonate,
//! total alkalinity (TA) and dissolved inorganic carbon (DIC) for a closed
//! carbonate system:
//!
//! $$ DIC = [CO_2(aq)] + [HCO_3^-] + [CO_3^{2-}] $$
//! $$ TA = [HCO_3^-] + 2[CO_3^{2-}] + [OH^-] - [H^+] $$
//!
//! Every function here is total over the physically valid domain
//! pH ∈ ([`PH_MIN`], [`PH_MAX`]), deterministic and allocation-free — the
//! equilibrium solver evaluates them thousands of times per root-finding
//! call. Callers must not pass pH outside that range; domain checking
//! happens once in the solver, not here.

use crate::parameters::EquilibriumConstants;
use ecca_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Lower edge of the physically valid pH domain.
pub const PH_MIN: FloatValue = 0.0;

/// Upper edge of the physically valid pH domain.
pub const PH_MAX: FloatValue = 14.0;

/// Ionization fractions of the carbonate system at a given pH.
///
/// The three fractions sum to 1; multiplying each by DIC recovers the
/// species concentrations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonateFractions {
    /// Fraction present as dissolved CO2 (including carbonic acid).
    pub co2aq: FloatValue,
    /// Fraction present as bicarbonate, HCO3-.
    pub bicarbonate: FloatValue,
    /// Fraction present as carbonate, CO3^2-.
    pub carbonate: FloatValue,
}

/// Hydrogen-ion concentration (mol/L) at a given pH.
pub fn hydrogen_ion(ph: FloatValue) -> FloatValue {
    10.0_f64.powf(-ph)
}

/// Speciation factor `1 + k1/h + k1 k2 / h^2` relating DIC to `[CO2(aq)]`.
fn speciation_factor(ph: FloatValue, constants: &EquilibriumConstants) -> FloatValue {
    let h = hydrogen_ion(ph);
    1.0 + constants.k1 / h + constants.k1 * constants.k2 / (h * h)
}

/// Ionization fractions {CO2(aq), HCO3-, CO3^2-} at `ph`.
pub fn carbonate_fractions(
    ph: FloatValue,
    constants: &EquilibriumConstants,
) -> CarbonateFractions {
    let h = hydrogen_ion(ph);
    let factor = speciation_factor(ph, constants);
    CarbonateFractions {
        co2aq: 1.0 / factor,
        bicarbonate: (constants.k1 / h) / factor,
        carbonate: (constants.k1 * constants.k2 / (h * h)) / factor,
    }
}

/// DIC (mol/L) given the dissolved CO2 concentration and pH.
pub fn dic_from_co2aq(
    co2aq: FloatValue,
    ph: FloatValue,
    constants: &EquilibriumConstants,
) -> FloatValue {
    co2aq * speciation_factor(ph, constants)
}

/// Total alkalinity (mol/L) from the charge balance at `ph` and `dic`:
/// `TA = [HCO3-] + 2[CO3^2-] + [OH-] - [H+]`.
pub fn total_alkalinity(
    ph: FloatValue,
    dic: FloatValue,
    constants: &EquilibriumConstants,
) -> FloatValue {
    let h = hydrogen_ion(ph);
    let fractions = carbonate_fractions(ph, constants);
    dic * (fractions.bicarbonate + 2.0 * fractions.carbonate) + constants.kw / h - h
}

/// DIC (mol/L) given pH and total alkalinity — the closed-form inverse of
/// [`total_alkalinity`] when both pH and TA are known.
pub fn dic_from_alkalinity(
    ph: FloatValue,
    ta: FloatValue,
    constants: &EquilibriumConstants,
) -> FloatValue {
    let h = hydrogen_ion(ph);
    let fractions = carbonate_fractions(ph, constants);
    (ta - constants.kw / h + h) / (fractions.bicarbonate + 2.0 * fractions.carbonate)
}

/// Equilibrium CO2 partial pressure (bar) over a solution at `ph` holding
/// `dic`, via Henry's law and the CO2(aq) fraction.
pub fn pco2_from_ph(
    ph: FloatValue,
    dic: FloatValue,
    constants: &EquilibriumConstants,
) -> FloatValue {
    dic * carbonate_fractions(ph, constants).co2aq / constants.henry_constant
}

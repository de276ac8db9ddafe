//! Equilibrium inversion
//!
//! Inverts the speciation relations in [`crate::carbonate::model`] when one
//! variable is sought from the others, e.g. pH from (TA, pCO2). The pH
//! direction is the only genuinely nonlinear one; the solver runs a Newton
//! iteration with a finite-difference derivative and, when that stalls,
//! falls back to bisection over a physically safe bracket. A result is
//! only reported as converged when the residual is below the configured
//! tolerance — an exhausted budget surfaces as
//! [`EccaError::ConvergenceFailure`] with the last residual attached,
//! never as a silently unconverged value.
//!
//! Batch theoretical curves re-seed each solve from the previous point's
//! solution to cut iteration counts; this is an optimisation only, and
//! every point remains independently solvable from the neutral seed
//! (see [`CurveSeeding`]).

use crate::carbonate::model::{self, PH_MAX, PH_MIN};
use crate::parameters::{EquilibriumConstants, SolverConfig};
use ecca_core::errors::{EccaError, EccaResult};
use ecca_core::timeseries::FloatValue;
use log::debug;
use serde::{Deserialize, Serialize};

/// Initial guess used when no measurement is available to seed a solve.
pub const NEUTRAL_PH_GUESS: FloatValue = 7.0;

/// Relative step for the finite-difference derivative in the Newton stage.
const DERIVATIVE_STEP: FloatValue = 1e-7;

/// Iteration cap of the bisection fallback. 200 halvings of the width-14
/// default bracket are far below any achievable floating-point tolerance.
const BISECTION_ITERATION_LIMIT: usize = 200;

/// Which stage produced a converged root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveMethod {
    Newton,
    Bisection,
}

/// A converged root plus the diagnostics that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// The solved scalar (pH for [`EquilibriumSolver::solve_ph`]).
    pub value: FloatValue,
    /// Residual of the charge balance at the solution (mol/L).
    pub residual: FloatValue,
    /// Total residual evaluations across both stages.
    pub iterations: usize,
    /// Stage that converged.
    pub method: SolveMethod,
}

/// A fully determined equilibrium: pH, TA and DIC consistent with the
/// pCO2 boundary condition they were derived under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumState {
    pub ph: FloatValue,
    pub ta: FloatValue,
    pub dic: FloatValue,
    pub pco2: FloatValue,
}

/// Seeding policy for batch curve generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveSeeding {
    /// Seed each solve from the previous point's solution.
    Chained,
    /// Seed every solve from [`NEUTRAL_PH_GUESS`].
    Neutral,
}

/// DIC state of a single measurement under different closure assumptions.
///
/// `dic_ta` assumes no crossover of non-conservative ions (derived from TA
/// and the measured pH), `dic_eq` assumes gas–solution equilibrium
/// (derived from the measured pH and Henry's law), and
/// `ph_theory`/`dic_theory` assume both and are solved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DicEstimate {
    pub ph_measured: FloatValue,
    pub ph_theory: FloatValue,
    pub ta: FloatValue,
    pub dic_ta: FloatValue,
    pub dic_eq: FloatValue,
    pub dic_theory: FloatValue,
}

/// Root-finding wrapper around the speciation model.
///
/// Holds validated constants and solver settings; all methods are pure
/// with respect to shared state, so one instance can serve concurrent
/// batch solves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumSolver {
    constants: EquilibriumConstants,
    config: SolverConfig,
}

impl EquilibriumSolver {
    /// Create a solver with default settings.
    pub fn new(constants: EquilibriumConstants) -> EccaResult<Self> {
        Self::with_config(constants, SolverConfig::default())
    }

    /// Create a solver with explicit settings.
    pub fn with_config(constants: EquilibriumConstants, config: SolverConfig) -> EccaResult<Self> {
        constants.validate()?;
        config.validate()?;
        Ok(Self { constants, config })
    }

    pub fn constants(&self) -> &EquilibriumConstants {
        &self.constants
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve for the pH at which the charge balance closes, given total
    /// alkalinity and the pCO2 boundary condition (gas–solution
    /// equilibrium fixes the dissolved CO2 concentration).
    pub fn solve_ph(
        &self,
        ta: FloatValue,
        pco2: FloatValue,
        initial_guess: FloatValue,
    ) -> EccaResult<Solution> {
        check_alkalinity(ta)?;
        check_pco2(pco2)?;
        check_ph("initial pH guess", initial_guess)?;

        let co2aq = self.constants.co2aq_from_pco2(pco2);
        let residual = |ph: FloatValue| {
            let dic = model::dic_from_co2aq(co2aq, ph, &self.constants);
            model::total_alkalinity(ph, dic, &self.constants) - ta
        };
        self.find_root(&residual, initial_guess)
    }

    /// Solve the full equilibrium state for a `(TA, pCO2)` pair.
    pub fn solve_state(
        &self,
        ta: FloatValue,
        pco2: FloatValue,
        ph_guess: FloatValue,
    ) -> EccaResult<EquilibriumState> {
        let solution = self.solve_ph(ta, pco2, ph_guess)?;
        let co2aq = self.constants.co2aq_from_pco2(pco2);
        let dic = model::dic_from_co2aq(co2aq, solution.value, &self.constants);
        Ok(EquilibriumState {
            ph: solution.value,
            ta,
            dic,
            pco2,
        })
    }

    /// Total alkalinity of a solution observed at `ph` in equilibrium with
    /// gas at `pco2` — the closed-form "pH known, TA unknown" direction,
    /// used to bootstrap a cycle from its initial measured state.
    pub fn alkalinity_from_ph(&self, ph: FloatValue, pco2: FloatValue) -> EccaResult<FloatValue> {
        check_ph("pH", ph)?;
        check_pco2(pco2)?;
        let co2aq = self.constants.co2aq_from_pco2(pco2);
        let dic = model::dic_from_co2aq(co2aq, ph, &self.constants);
        Ok(model::total_alkalinity(ph, dic, &self.constants))
    }

    /// DIC state of one measurement under the different closure
    /// assumptions (see [`DicEstimate`]). The measured pH seeds the
    /// theoretical solve.
    pub fn dic_estimate(
        &self,
        ph_measured: FloatValue,
        pco2: FloatValue,
        ta: FloatValue,
    ) -> EccaResult<DicEstimate> {
        check_ph("measured pH", ph_measured)?;
        check_pco2(pco2)?;
        check_alkalinity(ta)?;

        let co2aq = self.constants.co2aq_from_pco2(pco2);
        let dic_eq = model::dic_from_co2aq(co2aq, ph_measured, &self.constants);
        let dic_ta = model::dic_from_alkalinity(ph_measured, ta, &self.constants);
        let ph_theory = self.solve_ph(ta, pco2, ph_measured)?.value;
        let dic_theory = model::dic_from_co2aq(co2aq, ph_theory, &self.constants);

        Ok(DicEstimate {
            ph_measured,
            ph_theory,
            ta,
            dic_ta,
            dic_eq,
            dic_theory,
        })
    }

    /// Theoretical equilibrium curve for a fixed TA over a pCO2 sweep.
    ///
    /// Each point is solved independently; the seeding policy only picks
    /// the initial guess. Any point failing to converge aborts the curve
    /// with that point's error.
    pub fn theoretical_curve(
        &self,
        ta: FloatValue,
        pco2_values: &[FloatValue],
        seeding: CurveSeeding,
    ) -> EccaResult<Vec<EquilibriumState>> {
        let mut states = Vec::with_capacity(pco2_values.len());
        let mut guess = NEUTRAL_PH_GUESS;
        for &pco2 in pco2_values {
            let state = self.solve_state(ta, pco2, guess)?;
            if seeding == CurveSeeding::Chained {
                guess = state.ph;
            }
            states.push(state);
        }
        Ok(states)
    }

    /// Two-stage scalar root finder: Newton with a finite-difference
    /// derivative, then bisection over the configured bracket.
    fn find_root<F>(&self, residual: &F, initial_guess: FloatValue) -> EccaResult<Solution>
    where
        F: Fn(FloatValue) -> FloatValue,
    {
        let mut iterations = 0;
        let mut x = initial_guess;
        let mut last_residual = f64::NAN;

        for _ in 0..self.config.max_iterations {
            let fx = residual(x);
            iterations += 1;
            if !fx.is_finite() {
                break;
            }
            last_residual = fx;
            if fx.abs() <= self.config.tolerance {
                return Ok(Solution {
                    value: x,
                    residual: fx,
                    iterations,
                    method: SolveMethod::Newton,
                });
            }
            let step = DERIVATIVE_STEP * x.abs().max(1.0);
            let slope = (residual(x + step) - fx) / step;
            if !slope.is_finite() || slope == 0.0 {
                break;
            }
            let next = x - fx / slope;
            if !next.is_finite() {
                break;
            }
            x = next;
        }

        debug!(
            "Newton stage stopped after {} evaluations (last residual {:e}); falling back to bisection",
            iterations, last_residual
        );

        let (mut lo, mut hi) = self.config.bracket;
        let mut f_lo = residual(lo);
        let f_hi = residual(hi);
        iterations += 2;
        if f_lo.abs() <= self.config.tolerance {
            return Ok(Solution {
                value: lo,
                residual: f_lo,
                iterations,
                method: SolveMethod::Bisection,
            });
        }
        if f_hi.abs() <= self.config.tolerance {
            return Ok(Solution {
                value: hi,
                residual: f_hi,
                iterations,
                method: SolveMethod::Bisection,
            });
        }
        if !f_lo.is_finite() || !f_hi.is_finite() || f_lo.signum() == f_hi.signum() {
            return Err(EccaError::ConvergenceFailure {
                residual: last_residual,
                iterations,
            });
        }

        let mut f_mid = f_lo;
        for _ in 0..BISECTION_ITERATION_LIMIT {
            let mid = 0.5 * (lo + hi);
            f_mid = residual(mid);
            iterations += 1;
            if f_mid.abs() <= self.config.tolerance {
                return Ok(Solution {
                    value: mid,
                    residual: f_mid,
                    iterations,
                    method: SolveMethod::Bisection,
                });
            }
            if f_mid.signum() == f_lo.signum() {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
            }
        }

        Err(EccaError::ConvergenceFailure {
            residual: f_mid,
            iterations,
        })
    }
}

fn check_ph(quantity: &'static str, ph: FloatValue) -> EccaResult<()> {
    if !ph.is_finite() || ph <= PH_MIN || ph >= PH_MAX {
        return Err(EccaError::DomainError {
            quantity,
            value: ph,
            lo: PH_MIN,
            hi: PH_MAX,
        });
    }
    Ok(())
}

fn check_pco2(pco2: FloatValue) -> EccaResult<()> {
    if !pco2.is_finite() || pco2 < 0.0 {
        return Err(EccaError::DomainError {
            quantity: "pCO2",
            value: pco2,
            lo: 0.0,
            hi: f64::INFINITY,
        });
    }
    Ok(())
}

fn check_alkalinity(ta: FloatValue) -> EccaResult<()> {
    if !ta.is_finite() {
        return Err(EccaError::DomainError {
            quantity: "total alkalinity",
            value: ta,
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solver() -> EquilibriumSolver {
        EquilibriumSolver::new(EquilibriumConstants::default()).expect("defaults must validate")
    }

    #[test]
    fn reproduces_the_worked_example() {
        // TA = 0.2 M against 0.1 bar CO2, seeded from the measured pH 8
        let solution = solver().solve_ph(0.2, 0.1, 8.0).expect("should converge");
        assert!(
            (solution.value - 7.698).abs() < 1e-3,
            "expected pH close to 7.698, got {:.4}",
            solution.value
        );
        assert!(solution.residual.abs() <= 1e-9);
        assert_eq!(solution.method, SolveMethod::Newton);
    }

    #[test]
    fn solved_state_closes_the_balance() {
        let solver = solver();
        let state = solver.solve_state(0.2, 0.1, 8.0).expect("should converge");

        // Forward-computing pCO2 from the solved state recovers the input
        let pco2 = model::pco2_from_ph(state.ph, state.dic, solver.constants());
        assert_relative_eq!(pco2, 0.1, max_relative = 1e-9);

        // And the charge balance holds at the solved pH
        let ta = model::total_alkalinity(state.ph, state.dic, solver.constants());
        assert_relative_eq!(ta, state.ta, epsilon = 1e-8);
    }

    #[test]
    fn solver_is_deterministic() {
        let solver = solver();
        let a = solver.solve_ph(0.15, 0.4, 8.5).expect("should converge");
        let b = solver.solve_ph(0.15, 0.4, 8.5).expect("should converge");
        assert_eq!(a.value.to_bits(), b.value.to_bits());
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.method, b.method);
    }

    #[test]
    fn rejects_out_of_domain_inputs() {
        let solver = solver();
        assert!(matches!(
            solver.solve_ph(0.2, 0.1, 15.0),
            Err(EccaError::DomainError { quantity: "initial pH guess", .. })
        ));
        assert!(matches!(
            solver.solve_ph(0.2, -0.1, 8.0),
            Err(EccaError::DomainError { quantity: "pCO2", .. })
        ));
        assert!(matches!(
            solver.solve_ph(f64::NAN, 0.1, 8.0),
            Err(EccaError::DomainError { quantity: "total alkalinity", .. })
        ));
        assert!(solver.alkalinity_from_ph(0.0, 0.1).is_err());
    }

    #[test]
    fn bisection_fallback_converges_when_newton_is_disabled() {
        let config = SolverConfig {
            max_iterations: 0,
            ..Default::default()
        };
        let solver = EquilibriumSolver::with_config(EquilibriumConstants::default(), config)
            .expect("config must validate");

        let solution = solver.solve_ph(0.2, 0.1, 8.0).expect("bisection should converge");
        assert_eq!(solution.method, SolveMethod::Bisection);
        assert!(solution.residual.abs() <= solver.config().tolerance);
        assert!(
            (solution.value - 7.698).abs() < 1e-3,
            "fallback should find the same root, got {:.4}",
            solution.value
        );
    }

    #[test]
    fn sign_preserving_bracket_reports_failure() {
        // The root sits near pH 7.7; a bracket capped at pH 3 never
        // straddles it, and with the Newton stage disabled the call must
        // surface a typed failure instead of an unconverged value.
        let config = SolverConfig {
            max_iterations: 0,
            bracket: (0.5, 3.0),
            ..Default::default()
        };
        let solver = EquilibriumSolver::with_config(EquilibriumConstants::default(), config)
            .expect("config must validate");

        match solver.solve_ph(0.2, 0.1, 8.0) {
            Err(EccaError::ConvergenceFailure { iterations, .. }) => {
                assert!(iterations >= 2, "diagnostics should count evaluations");
            }
            other => panic!("expected ConvergenceFailure, got {:?}", other),
        }
    }

    #[test]
    fn alkalinity_from_ph_matches_forward_model() {
        let solver = solver();
        let ta = solver.alkalinity_from_ph(8.0, 0.1).expect("in domain");
        let co2aq = solver.constants().co2aq_from_pco2(0.1);
        let dic = model::dic_from_co2aq(co2aq, 8.0, solver.constants());
        assert_relative_eq!(
            ta,
            model::total_alkalinity(8.0, dic, solver.constants()),
            max_relative = 1e-12
        );
    }

    #[test]
    fn dic_estimate_is_internally_consistent() {
        let solver = solver();
        let estimate = solver
            .dic_estimate(8.0, 0.1, 0.2)
            .expect("should converge");

        // DIC from TA closes the charge balance at the measured pH
        let ta = model::total_alkalinity(estimate.ph_measured, estimate.dic_ta, solver.constants());
        assert_relative_eq!(ta, 0.2, max_relative = 1e-9);

        // The theoretical pair closes it at the solved pH
        let ta = model::total_alkalinity(estimate.ph_theory, estimate.dic_theory, solver.constants());
        assert_relative_eq!(ta, 0.2, epsilon = 1e-8);

        // At pH 8 the measured solution holds less DIC than TA implies
        // under gas equilibrium, so the theoretical pH sits below it
        assert!(
            estimate.ph_theory < estimate.ph_measured,
            "expected acidification towards equilibrium, got {:.4}",
            estimate.ph_theory
        );
        assert!(estimate.dic_ta < estimate.dic_eq);
    }

    #[test]
    fn solution_serde_round_trip() {
        let solution = solver().solve_ph(0.2, 0.1, 8.0).expect("should converge");
        let json = serde_json::to_string(&solution).expect("serialization failed");
        let parsed: Solution = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(solution, parsed);
    }
}

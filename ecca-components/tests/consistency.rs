//! Consistency tests across analysis components.
//!
//! These tests verify the properties the components must satisfy jointly:
//! - the gas pipeline (locator → baseline → integrator) recovers a known
//!   synthetic capture cycle
//! - the equilibrium solver and the speciation model agree with each other
//!   in both directions

use approx::assert_relative_eq;
use ecca_components::carbonate::{model, CurveSeeding, EquilibriumSolver, SolveMethod};
use ecca_components::gas::{
    AmountIntegrator, BaselineDetector, ChangeDirection, FitOrder, GasChangeLocator,
};
use ecca_components::parameters::EquilibriumConstants;
use ecca_core::timeseries::{FloatValue, Time, Timeseries};
use ecca_core::window::Window;
use ndarray::Array1;

mod gas_pipeline {
    use super::*;

    /// 1 Hz flow series: 10 sccm for [0, 100), 50 sccm for [100, 300),
    /// back to 10 sccm afterwards.
    fn synthetic_cycle() -> Timeseries {
        let time: Vec<Time> = (0..400).map(|i| i as Time).collect();
        let values: Vec<FloatValue> = time
            .iter()
            .map(|&t| if (100.0..300.0).contains(&t) { 50.0 } else { 10.0 })
            .collect();
        Timeseries::from_values(Array1::from_vec(values), Array1::from_vec(time))
    }

    /// The full chain on the synthetic cycle: one rising switch at t = 100,
    /// a flat baseline of 10 from the pre-switch window, and an integrated
    /// amount of (50 - 10) * 200 s * conversion.
    #[test]
    fn test_recovers_synthetic_capture_cycle() {
        let series = synthetic_cycle();

        let locator = GasChangeLocator::new(20.0, 30.0).expect("valid parameters");
        let events = locator.locate(&series);
        assert_eq!(events.len(), 2, "one switch up, one switch back");
        assert_eq!(events[0].time, 100.0);
        assert_eq!(events[0].direction, ChangeDirection::Rising);
        assert_eq!(events[1].time, 300.0);
        assert_eq!(events[1].direction, ChangeDirection::Falling);

        // Baseline from the quiet window preceding the first switch
        let quiet = Window::preceding(events[0].time, 100.0).expect("valid window");
        let baseline = BaselineDetector::new(FitOrder::Constant)
            .fit(&series, &[quiet])
            .expect("the quiet window has 100 samples");
        assert_relative_eq!(baseline.value_at(200.0), 10.0, epsilon = 1e-12);

        // Integrate between the two switches
        let conversion = 1.0 / 60.0;
        let window = Window::new(events[0].time, events[1].time).expect("valid window");
        let result = AmountIntegrator::new(conversion)
            .expect("valid conversion")
            .integrate(&series, &baseline, &window)
            .expect("enough samples");

        assert_relative_eq!(
            result.amount,
            (50.0 - 10.0) * 200.0 * conversion,
            max_relative = 1e-12
        );
        assert_eq!(result.window, window);
    }

    /// A reverse (post-event) baseline window gives the same reference as
    /// a forward one when the quiet level is the same on both sides.
    #[test]
    fn test_forward_and_reverse_baselines_agree() {
        let series = synthetic_cycle();
        let detector = BaselineDetector::new(FitOrder::Constant);

        let forward = detector
            .fit(&series, &[Window::preceding(100.0, 50.0).unwrap()])
            .expect("enough samples");
        let reverse = detector
            .fit(&series, &[Window::following(300.0, 50.0).unwrap()])
            .expect("enough samples");

        assert_relative_eq!(
            forward.value_at(200.0),
            reverse.value_at(200.0),
            epsilon = 1e-12
        );
    }

    /// Capture (below baseline) and outgas (above baseline) come out with
    /// opposite signs from the same pipeline.
    #[test]
    fn test_capture_and_outgas_signs() {
        // Flow dips below baseline while gas is being absorbed
        let time: Vec<Time> = (0..300).map(|i| i as Time).collect();
        let values: Vec<FloatValue> = time
            .iter()
            .map(|&t| if (100.0..200.0).contains(&t) { 6.0 } else { 10.0 })
            .collect();
        let series = Timeseries::from_values(Array1::from_vec(values), Array1::from_vec(time));

        let baseline = BaselineDetector::new(FitOrder::Constant)
            .fit(&series, &[Window::new(0.0, 100.0).unwrap()])
            .expect("enough samples");
        let result = AmountIntegrator::new(1.0)
            .unwrap()
            .integrate(&series, &baseline, &Window::new(100.0, 200.0).unwrap())
            .expect("enough samples");

        assert!(
            result.amount < 0.0,
            "capture must integrate negative, got {:.3}",
            result.amount
        );
        assert_relative_eq!(result.amount, -4.0 * 100.0, max_relative = 1e-12);
    }
}

mod equilibrium {
    use super::*;

    fn solver() -> EquilibriumSolver {
        EquilibriumSolver::new(EquilibriumConstants::default()).expect("defaults must validate")
    }

    /// Solving for pH and forward-computing pCO2 from the solution
    /// reproduces the input across the physically relevant domain.
    #[test]
    fn test_ph_solve_round_trips_pco2() {
        let solver = solver();
        let constants = EquilibriumConstants::default();

        for ta in [0.05, 0.1, 0.2] {
            for pco2 in [0.01, 0.1, 0.4, 1.0] {
                let state = solver
                    .solve_state(ta, pco2, 7.0)
                    .unwrap_or_else(|e| panic!("TA={}, pCO2={}: {}", ta, pco2, e));
                let back = model::pco2_from_ph(state.ph, state.dic, &constants);
                assert_relative_eq!(back, pco2, max_relative = 1e-9);
            }
        }
    }

    /// More CO2 over the same alkalinity acidifies the solution and loads
    /// more inorganic carbon into it.
    #[test]
    fn test_curve_is_monotonic() {
        let sweep: Vec<FloatValue> = (1..=20).map(|i| 0.05 * i as FloatValue).collect();
        let curve = solver()
            .theoretical_curve(0.2, &sweep, CurveSeeding::Chained)
            .expect("all points should converge");

        for pair in curve.windows(2) {
            assert!(
                pair[1].ph < pair[0].ph,
                "pH must fall as pCO2 rises: {:.4} then {:.4}",
                pair[0].ph,
                pair[1].ph
            );
            assert!(
                pair[1].dic > pair[0].dic,
                "DIC must rise with pCO2: {:.6} then {:.6}",
                pair[0].dic,
                pair[1].dic
            );
        }
    }

    /// Chained seeding is an optimisation, not a different answer: every
    /// point matches an independent solve from the neutral seed.
    #[test]
    fn test_chained_and_neutral_seeding_agree() {
        let solver = solver();
        let sweep: Vec<FloatValue> = (1..=50).map(|i| 0.02 * i as FloatValue).collect();

        let chained = solver
            .theoretical_curve(0.2, &sweep, CurveSeeding::Chained)
            .expect("chained curve should converge");
        let neutral = solver
            .theoretical_curve(0.2, &sweep, CurveSeeding::Neutral)
            .expect("neutral curve should converge");

        for (c, n) in chained.iter().zip(neutral.iter()) {
            assert_relative_eq!(c.ph, n.ph, epsilon = 1e-8);
            assert_relative_eq!(c.dic, n.dic, max_relative = 1e-8);
        }
    }

    /// The Newton stage and the bisection fallback find the same root.
    #[test]
    fn test_both_stages_agree_on_the_root() {
        let newton = solver().solve_ph(0.2, 0.1, 8.0).expect("should converge");
        assert_eq!(newton.method, SolveMethod::Newton);

        let config = ecca_components::parameters::SolverConfig {
            max_iterations: 0,
            ..Default::default()
        };
        let fallback = EquilibriumSolver::with_config(EquilibriumConstants::default(), config)
            .expect("config must validate")
            .solve_ph(0.2, 0.1, 8.0)
            .expect("should converge");
        assert_eq!(fallback.method, SolveMethod::Bisection);

        assert_relative_eq!(newton.value, fallback.value, epsilon = 1e-6);
    }

    /// Constants loaded from experiment configuration drive the same
    /// solver path as programmatic ones.
    #[test]
    fn test_toml_constants_feed_the_solver() {
        let constants = EquilibriumConstants::from_toml_str(
            "k1 = 1.1e-6\nk2 = 4.1e-10\nhenry_constant = 0.035\nvolume = 0.01\n",
        )
        .expect("document should load");
        let solution = EquilibriumSolver::new(constants)
            .expect("constants must validate")
            .solve_ph(0.2, 0.1, 8.0)
            .expect("should converge");
        assert!(
            (solution.value - 7.698).abs() < 1e-3,
            "expected the worked-example root, got {:.4}",
            solution.value
        );
    }
}

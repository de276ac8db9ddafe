//! Baseline fitting
//!
//! Estimates the signal that would have been observed absent the captured
//! or released gas by fitting a trend to "quiet" windows adjacent to a
//! gas-switch event. Whether the quiet data sits before the event
//! (forward) or after it (reverse) is purely the caller's window choice —
//! the fitting code path is the same, and a fit may combine several
//! windows, e.g. the flanks on both sides of a capture process.

use ecca_core::errors::{EccaError, EccaResult};
use ecca_core::timeseries::{FloatValue, Time, Timeseries};
use ecca_core::window::Window;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Order of the baseline trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitOrder {
    /// Flat reference: the mean of the window samples.
    Constant,
    /// Linear drift: least-squares line through the window samples.
    Linear,
}

impl FitOrder {
    /// Minimum number of samples the fit needs.
    pub fn min_points(self) -> usize {
        match self {
            FitOrder::Constant => 1,
            FitOrder::Linear => 2,
        }
    }
}

/// A fitted baseline trend.
///
/// Valid within its source windows and extrapolated everywhere else; the
/// windows are retained so downstream results stay traceable to the data
/// that produced the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineFit {
    order: FitOrder,
    slope: FloatValue,
    intercept: FloatValue,
    windows: Vec<Window>,
}

impl BaselineFit {
    pub fn order(&self) -> FitOrder {
        self.order
    }

    pub fn slope(&self) -> FloatValue {
        self.slope
    }

    pub fn intercept(&self) -> FloatValue {
        self.intercept
    }

    /// Windows the fit was derived from.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Baseline value at `t`, extrapolating outside the source windows.
    pub fn value_at(&self, t: Time) -> FloatValue {
        self.intercept + self.slope * t
    }

    /// Residual series `signal - baseline` over the full extent of
    /// `series`, on the same time axis and in the same units.
    pub fn residuals(&self, series: &Timeseries) -> Timeseries {
        let values: Vec<FloatValue> = series.iter().map(|(t, v)| v - self.value_at(t)).collect();
        Timeseries::new(
            Array1::from_vec(values),
            series.time_axis().clone(),
            series.units().to_string(),
        )
    }
}

/// Least-squares baseline fitting over one or more windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineDetector {
    order: FitOrder,
}

impl BaselineDetector {
    pub fn new(order: FitOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> FitOrder {
        self.order
    }

    /// Fit a baseline to the samples of `series` falling inside `windows`.
    ///
    /// Fails with [`EccaError::InsufficientData`] when the windows hold
    /// fewer samples than the order requires (1 for constant, 2 at
    /// distinct timestamps for linear); the caller should then widen the
    /// windows or drop to a constant fit.
    pub fn fit(&self, series: &Timeseries, windows: &[Window]) -> EccaResult<BaselineFit> {
        let axis = series.time_axis();
        let mut times: Vec<Time> = Vec::new();
        let mut values: Vec<FloatValue> = Vec::new();
        for window in windows {
            for i in axis.window_range(window) {
                let (t, v) = series.get(i);
                times.push(t);
                values.push(v);
            }
        }

        let required = self.order.min_points();
        if times.len() < required {
            return Err(EccaError::InsufficientData {
                available: times.len(),
                required,
            });
        }

        let n = times.len() as FloatValue;
        let t_mean = times.iter().sum::<FloatValue>() / n;
        let v_mean = values.iter().sum::<FloatValue>() / n;

        let (slope, intercept) = match self.order {
            FitOrder::Constant => (0.0, v_mean),
            FitOrder::Linear => {
                let mut s_tt = 0.0;
                let mut s_tv = 0.0;
                for (&t, &v) in times.iter().zip(values.iter()) {
                    s_tt += (t - t_mean) * (t - t_mean);
                    s_tv += (t - t_mean) * (v - v_mean);
                }
                if s_tt == 0.0 {
                    // Every sample shares one timestamp (duplicated windows)
                    return Err(EccaError::InsufficientData {
                        available: 1,
                        required,
                    });
                }
                let slope = s_tv / s_tt;
                (slope, v_mean - slope * t_mean)
            }
        };

        Ok(BaselineFit {
            order: self.order,
            slope,
            intercept,
            windows: windows.to_vec(),
        })
    }
}

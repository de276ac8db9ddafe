//! Half-open time intervals.
//!
//! A [`Window`] delimits a baseline-fit region or an integration region:
//! `[start, end)`. Direction-dependent baseline fitting ("forward" vs
//! "reverse") is expressed purely through window construction —
//! [`Window::preceding`] selects data before an event timestamp,
//! [`Window::following`] selects data after it; the downstream fitting
//! and integration code paths are identical.

use crate::errors::{EccaError, EccaResult};
use crate::timeseries::Time;
use serde::{Deserialize, Serialize};

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    start: Time,
    end: Time,
}

impl Window {
    /// Create a window.
    ///
    /// Fails with [`EccaError::DomainError`] unless both bounds are
    /// finite and `end > start`.
    pub fn new(start: Time, end: Time) -> EccaResult<Self> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(EccaError::DomainError {
                quantity: "window duration",
                value: end - start,
                lo: 0.0,
                hi: f64::INFINITY,
            });
        }
        Ok(Self { start, end })
    }

    /// The window of length `span` ending at `event`: `[event - span, event)`.
    ///
    /// Used to fit a baseline to quiet signal before a gas switch.
    pub fn preceding(event: Time, span: f64) -> EccaResult<Self> {
        Self::new(event - span, event)
    }

    /// The window of length `span` starting at `event`: `[event, event + span)`.
    ///
    /// Used when pre-event data is unusable and the baseline must be
    /// fitted to data after the event instead.
    pub fn following(event: Time, span: f64) -> EccaResult<Self> {
        Self::new(event, event + span)
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn end(&self) -> Time {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: Time) -> bool {
        self.start <= t && t < self.end
    }
}

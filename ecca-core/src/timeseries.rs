//! Time-indexed instrument series.
//!
//! A [`Timeseries`] couples an ndarray of sample values with a shared
//! [`TimeAxis`]. Timestamps are strictly increasing but need not be
//! uniformly spaced; the analysis components never mutate input series.

use crate::window::Window;
use ndarray::Array1;
use num::Float;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

/// Timestamp in the caller's (single, consistent) time unit.
pub type Time = f64;
pub type FloatValue = f64;

/// Strictly increasing sequence of timestamps.
///
/// Shared between series sampled on the same clock via `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    values: Array1<Time>,
}

impl TimeAxis {
    /// Create a time axis from raw timestamps.
    ///
    /// # Panics
    ///
    /// Panics if any timestamp is non-finite or the sequence is not
    /// strictly increasing.
    pub fn from_values(values: Array1<Time>) -> Self {
        for (i, &t) in values.iter().enumerate() {
            assert!(t.is_finite(), "timestamp at index {} is not finite", i);
        }
        for (i, pair) in values.windows(2).into_iter().enumerate() {
            assert!(
                pair[1] > pair[0],
                "timestamps must be strictly increasing (index {}: {} then {})",
                i,
                pair[0],
                pair[1]
            );
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Array1<Time> {
        &self.values
    }

    pub fn at(&self, index: usize) -> Time {
        self.values[index]
    }

    pub fn first(&self) -> Option<Time> {
        self.values.first().copied()
    }

    pub fn last(&self) -> Option<Time> {
        self.values.last().copied()
    }

    /// Index of the first timestamp not less than `t`.
    fn lower_bound(&self, t: Time) -> usize {
        let mut lo = 0;
        let mut hi = self.values.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.values[mid] < t {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Contiguous index range of the samples falling inside `window`
    /// (half-open: `start <= t < end`). May be empty.
    pub fn window_range(&self, window: &Window) -> Range<usize> {
        self.lower_bound(window.start())..self.lower_bound(window.end())
    }

    /// Whether `window` lies within the extent of this axis.
    pub fn covers(&self, window: &Window) -> bool {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => window.start() >= first && window.end() <= last,
            _ => false,
        }
    }
}

/// A series of samples on a [`TimeAxis`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeseries<T = FloatValue> {
    values: Array1<T>,
    time_axis: Arc<TimeAxis>,
    units: String,
}

impl<T> Timeseries<T>
where
    T: Float,
{
    /// Create a new timeseries.
    ///
    /// # Panics
    ///
    /// Panics if `values` and `time_axis` have different lengths.
    pub fn new(values: Array1<T>, time_axis: Arc<TimeAxis>, units: String) -> Self {
        assert_eq!(
            values.len(),
            time_axis.len(),
            "values and time axis must have the same length"
        );
        Self {
            values,
            time_axis,
            units,
        }
    }

    /// Convenience constructor building the axis in place, with no units.
    pub fn from_values(values: Array1<T>, time: Array1<Time>) -> Self {
        Self::new(
            values,
            Arc::new(TimeAxis::from_values(time)),
            "".to_string(),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Array1<T> {
        &self.values
    }

    pub fn time_axis(&self) -> &Arc<TimeAxis> {
        &self.time_axis
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    /// The `(timestamp, value)` pair at `index`.
    pub fn get(&self, index: usize) -> (Time, T) {
        (self.time_axis.at(index), self.values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, T)> + '_ {
        self.time_axis
            .values()
            .iter()
            .zip(self.values.iter())
            .map(|(&t, &v)| (t, v))
    }
}

//! Gas-switch location
//!
//! Scans a sentinel channel (secondary gas concentration or flow) for
//! sustained step changes, distinguishing a true gas switch from sensor
//! noise: a candidate crossing only becomes an event if the signal stays
//! deviated on the same side of the current reference level for the whole
//! persistence duration. Finding no event is a normal experimental
//! condition and yields an empty sequence, not an error.

use ecca_core::errors::{EccaError, EccaResult};
use ecca_core::timeseries::{FloatValue, Time, Timeseries};
use log::debug;
use serde::{Deserialize, Serialize};

/// Which way the sentinel signal stepped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeDirection {
    /// Low-to-high switch (e.g. CO2-lean to CO2-rich feed).
    Rising,
    /// High-to-low switch.
    Falling,
}

/// A detected gas-switch event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasChangeEvent {
    /// Timestamp of the first stable crossing.
    pub time: Time,
    /// Sample index of that crossing in the scanned series.
    pub index: usize,
    pub direction: ChangeDirection,
    /// Signed deviation from the previous reference level at the crossing.
    pub magnitude: FloatValue,
}

/// Detector for sustained step changes in a sentinel channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasChangeLocator {
    threshold: FloatValue,
    min_duration: f64,
}

impl GasChangeLocator {
    /// Create a locator.
    ///
    /// `threshold` is the minimum deviation (in signal units) from the
    /// current reference level that counts as a candidate switch;
    /// `min_duration` is how long (in time units) the deviation must
    /// persist without reverting. Both must be positive and finite.
    pub fn new(threshold: FloatValue, min_duration: f64) -> EccaResult<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(EccaError::DomainError {
                quantity: "change threshold",
                value: threshold,
                lo: 0.0,
                hi: f64::INFINITY,
            });
        }
        if !min_duration.is_finite() || min_duration <= 0.0 {
            return Err(EccaError::DomainError {
                quantity: "persistence duration",
                value: min_duration,
                lo: 0.0,
                hi: f64::INFINITY,
            });
        }
        Ok(Self {
            threshold,
            min_duration,
        })
    }

    /// Lazily scan `series` for qualifying switches.
    ///
    /// The returned iterator makes a single pass; calling `scan` again
    /// restarts from the beginning of the series.
    pub fn scan<'a>(&self, series: &'a Timeseries) -> GasChangeEvents<'a> {
        GasChangeEvents {
            series,
            threshold: self.threshold,
            min_duration: self.min_duration,
            pos: 0,
            reference: None,
        }
    }

    /// Eagerly collect every qualifying switch in `series`.
    pub fn locate(&self, series: &Timeseries) -> Vec<GasChangeEvent> {
        self.scan(series).collect()
    }
}

/// Lazy, finite, restartable sequence of gas-switch events.
///
/// The reference level starts at the first sample and moves to the new
/// plateau after each emitted event; deviations are always measured
/// against the level established by the previous switch.
#[derive(Debug)]
pub struct GasChangeEvents<'a> {
    series: &'a Timeseries,
    threshold: FloatValue,
    min_duration: f64,
    pos: usize,
    reference: Option<FloatValue>,
}

impl GasChangeEvents<'_> {
    /// Whether the deviation that starts at `start` stays on the same side
    /// of `reference` for the full persistence duration. A series that
    /// ends before the duration is observed does not qualify.
    fn persists(&self, start: usize, reference: FloatValue, sign: FloatValue) -> bool {
        let (t0, _) = self.series.get(start);
        for j in start..self.series.len() {
            let (tj, vj) = self.series.get(j);
            if tj - t0 > self.min_duration {
                return true;
            }
            if (vj - reference) * sign < self.threshold {
                return false;
            }
        }
        let (t_last, _) = self.series.get(self.series.len() - 1);
        t_last - t0 >= self.min_duration
    }
}

impl Iterator for GasChangeEvents<'_> {
    type Item = GasChangeEvent;

    fn next(&mut self) -> Option<GasChangeEvent> {
        while self.pos < self.series.len() {
            let (time, value) = self.series.get(self.pos);
            let reference = *self.reference.get_or_insert(value);
            let deviation = value - reference;

            if deviation.abs() >= self.threshold {
                if self.persists(self.pos, reference, deviation.signum()) {
                    let event = GasChangeEvent {
                        time,
                        index: self.pos,
                        direction: if deviation > 0.0 {
                            ChangeDirection::Rising
                        } else {
                            ChangeDirection::Falling
                        },
                        magnitude: deviation,
                    };
                    self.reference = Some(value);
                    self.pos += 1;
                    return Some(event);
                }
                debug!(
                    "transient at t = {} (deviation {:.3}) reverted within {}; discarded",
                    time, deviation, self.min_duration
                );
            }
            self.pos += 1;
        }
        None
    }
}

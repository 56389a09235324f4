//! Conversions between performance time, local scene coordinates and
//! display coordinates. Everything here is a pure function.

use serde::Serialize;

use crate::metrics::SceneMetrics;

/// A closed interval given by its two ends (`end` may precede `start`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Position of `v` within the span as a fraction; 0 for a zero-length span.
    pub fn fraction(&self, v: f64) -> f64 {
        let len = self.len();
        if len == 0.0 || !len.is_finite() {
            0.0
        } else {
            (v - self.start) / len
        }
    }

    pub fn at(&self, fraction: f64) -> f64 {
        fraction * self.len() + self.start
    }
}

/// Map `v` from one span onto another.
pub fn rescale(v: f64, from: Span, to: Span) -> f64 {
    to.at(from.fraction(v))
}

/// `time→screen`: onset time in seconds to display x, between the first
/// and last matched notes' display positions.
pub fn time_to_screen(t: f64, times: Span, screen: Span) -> f64 {
    rescale(t, times, screen)
}

/// `time→local`: onset time in seconds to local x, between the first and
/// last matched notes' local positions.
pub fn time_to_local(t: f64, times: Span, local: Span) -> f64 {
    rescale(t, times, local)
}

/// `local→screen`: local x (inside the layout group) to display x.
pub fn local_to_screen(x: f64, metrics: &SceneMetrics) -> f64 {
    (x + metrics.margin_offset_x) * metrics.width / metrics.view_window.width
}

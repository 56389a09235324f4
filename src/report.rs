//! Warp report: a serializable snapshot of what a [`ScoreWarper`] knows
//! after loading an alignment and warping. This is what crosses the FFI
//! boundary; the scene itself stays on the Rust side.

use serde::Serialize;

use crate::coords::Span;
use crate::engine::ApplyStats;
use crate::metrics::SceneMetrics;
use crate::warper::ScoreWarper;

/// Everything a caller needs to place a playback cursor on the warped score.
#[derive(Debug, Clone, Serialize)]
pub struct WarpReport {
    /// Scene metrics read at construction
    pub metrics: SceneMetrics,
    /// Index of the first alignment record with a real onset
    pub first_valid_index: Option<usize>,
    /// Index of the last record not flagged as a synthetic trailer
    pub last_valid_index: Option<usize>,
    /// Onset times (seconds) of the first and last matched notes
    pub time_bounds: Option<Span>,
    /// Display x of the first and last matched notes
    pub screen_bounds: Option<Span>,
    /// Local x of the first and last matched notes
    pub local_bounds: Option<Span>,
    /// Local x of each matched note before warping
    pub note_positions: Vec<f64>,
    /// Display x of each matched note before warping
    pub note_screen_positions: Vec<f64>,
    /// Local x each matched note was warped to
    pub onset_positions: Vec<f64>,
    /// Per-pixel displacement of the most recent warp (empty before one)
    pub warp_function: Vec<f64>,
    /// Counters from the most recent warp pass, if the caller kept them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ApplyStats>,
}

/// Snapshot the warper's current state.
pub fn generate_report(warper: &ScoreWarper) -> WarpReport {
    let index = warper.index();
    WarpReport {
        metrics: *warper.metrics(),
        first_valid_index: index.map(|i| i.first_valid_index()),
        last_valid_index: index.map(|i| i.last_valid_index()),
        time_bounds: warper.time_bounds(),
        screen_bounds: warper.screen_bounds(),
        local_bounds: index.map(|i| i.local_bounds()),
        note_positions: warper.note_positions().to_vec(),
        note_screen_positions: warper.note_screen_positions().to_vec(),
        onset_positions: warper.onset_positions().to_vec(),
        warp_function: warper
            .warp_function()
            .map(|w| w.values().to_vec())
            .unwrap_or_default(),
        stats: None,
    }
}

/// Serialize a WarpReport to JSON.
pub fn report_to_json(report: &WarpReport) -> String {
    serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
}

//! Alignment index: resolves alignment records against a scene into
//! parallel arrays of note positions and target onset positions.
//!
//! Only records between the first one with a real onset and the last one
//! not flagged as a synthetic trailer take part. Each of those is anchored
//! by its first identifier's glyph; records whose glyph cannot be found
//! are skipped without failing the whole index.

use crate::coords::{self, Span};
use crate::error::{WarpError, WarpResult};
use crate::metrics::SceneMetrics;
use crate::model::AlignmentRecord;
use crate::scene::{anchor_x, Scene};

/// Index of the first record carrying a real onset.
pub fn first_valid_index(records: &[AlignmentRecord]) -> Option<usize> {
    records.iter().position(AlignmentRecord::has_onset)
}

/// Index of the last record not flagged as a synthetic trailer.
pub fn last_valid_index(records: &[AlignmentRecord]) -> Option<usize> {
    records.iter().rposition(|r| !r.is_trailing_synthetic)
}

/// Resolved note and onset positions for one alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentIndex {
    first_valid: usize,
    last_valid: usize,
    /// Record index behind each resolved entry
    record_indices: Vec<usize>,
    /// Local x of each resolved note's anchor glyph
    note_positions: Vec<f64>,
    /// Display x of the same anchors
    note_screen_positions: Vec<f64>,
    /// Local x each note should move to
    onset_positions: Vec<f64>,
    times: Span,
    local_bounds: Span,
    screen_bounds: Span,
}

impl AlignmentIndex {
    /// Resolve `records` against `scene`.
    ///
    /// Fails with [`WarpError::NoValidRecord`] when no record has a real
    /// onset inside the valid range, or when none of them resolves to a
    /// glyph in the scene.
    pub fn build<S: Scene + ?Sized>(
        records: &[AlignmentRecord],
        scene: &S,
        metrics: &SceneMetrics,
    ) -> WarpResult<Self> {
        let (first_valid, last_valid) = match (first_valid_index(records), last_valid_index(records)) {
            (Some(first), Some(last)) if first <= last => (first, last),
            _ => {
                tracing::error!(event = "fatal", records = records.len(), "no valid alignment record");
                return Err(WarpError::NoValidRecord);
            }
        };

        // ── Resolve anchor glyphs ───────────────────────────────────
        let mut record_indices = Vec::new();
        let mut note_positions = Vec::new();
        for (i, record) in records
            .iter()
            .enumerate()
            .take(last_valid + 1)
            .skip(first_valid)
        {
            if !record.has_onset() {
                tracing::warn!(event = "skip", record = i, "record inside the valid range has no onset");
                continue;
            }
            let Some(id) = record.anchor_id() else {
                tracing::warn!(event = "skip", record = i, "record has no identifiers");
                continue;
            };
            let Some(x) = scene.find_by_id(id).and_then(|node| anchor_x(scene, node)) else {
                tracing::warn!(event = "skip", record = i, id, "note glyph not found in scene");
                continue;
            };
            record_indices.push(i);
            note_positions.push(x);
        }

        let (Some(&first_x), Some(&last_x)) = (note_positions.first(), note_positions.last()) else {
            tracing::error!(event = "fatal", "no alignment record resolved to a glyph");
            return Err(WarpError::NoValidRecord);
        };

        if note_positions.windows(2).any(|w| w[1] < w[0]) {
            tracing::warn!(
                event = "skip",
                "note positions are not left-to-right; warping across systems is undefined"
            );
        }

        // ── Onset targets ───────────────────────────────────────────
        let onset_of = |k: usize| records[record_indices[k]].observed_onset_seconds;
        let times = Span::new(onset_of(0), onset_of(record_indices.len() - 1));
        let local_bounds = Span::new(first_x, last_x);
        let screen_bounds = Span::new(
            coords::local_to_screen(first_x, metrics),
            coords::local_to_screen(last_x, metrics),
        );

        let onset_positions = record_indices
            .iter()
            .map(|&i| coords::time_to_local(records[i].observed_onset_seconds, times, local_bounds))
            .collect();
        let note_screen_positions = note_positions
            .iter()
            .map(|&x| coords::local_to_screen(x, metrics))
            .collect();

        tracing::debug!(
            first_valid,
            last_valid,
            resolved = record_indices.len(),
            tmn = times.start,
            tmx = times.end,
            "alignment index built"
        );

        Ok(Self {
            first_valid,
            last_valid,
            record_indices,
            note_positions,
            note_screen_positions,
            onset_positions,
            times,
            local_bounds,
            screen_bounds,
        })
    }

    pub fn first_valid_index(&self) -> usize {
        self.first_valid
    }

    pub fn last_valid_index(&self) -> usize {
        self.last_valid
    }

    pub fn record_indices(&self) -> &[usize] {
        &self.record_indices
    }

    pub fn note_positions(&self) -> &[f64] {
        &self.note_positions
    }

    pub fn note_screen_positions(&self) -> &[f64] {
        &self.note_screen_positions
    }

    pub fn onset_positions(&self) -> &[f64] {
        &self.onset_positions
    }

    /// Onset times of the first and last matched notes (`tmn`, `tmx`).
    pub fn time_bounds(&self) -> Span {
        self.times
    }

    /// Local x of the first and last matched notes.
    pub fn local_bounds(&self) -> Span {
        self.local_bounds
    }

    /// Display x of the first and last matched notes (`fstX`, `lstX`).
    pub fn screen_bounds(&self) -> Span {
        self.screen_bounds
    }

    pub fn time_to_screen(&self, t: f64) -> f64 {
        coords::time_to_screen(t, self.times, self.screen_bounds)
    }

    pub fn time_to_local(&self, t: f64) -> f64 {
        coords::time_to_local(t, self.times, self.local_bounds)
    }
}

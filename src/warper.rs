//! Score warper: ties scene metrics, the alignment index, the warp
//! function and the transform engine together.
//!
//! Typical use:
//! ```no_run
//! use scorewarp::{AlignmentRecord, ScoreWarper, SvgScene};
//!
//! let mut scene = SvgScene::parse(&std::fs::read_to_string("score.svg").unwrap()).unwrap();
//! let mut warper = ScoreWarper::new(&scene).unwrap();
//! warper
//!     .load_alignment(&scene, vec![
//!         AlignmentRecord::new(["note-1"], 0.0),
//!         AlignmentRecord::new(["note-2"], 0.8),
//!     ])
//!     .unwrap();
//! warper.warp(&mut scene).unwrap();
//! ```

use crate::alignment::AlignmentIndex;
use crate::config::WarpOptions;
use crate::coords::{self, Span};
use crate::engine::{self, ApplyStats};
use crate::error::{WarpError, WarpResult};
use crate::metrics::SceneMetrics;
use crate::model::AlignmentRecord;
use crate::scene::Scene;
use crate::warp::WarpFunction;

/// Warps one scene to successive alignments.
///
/// The warper never owns the scene: every call borrows it, and `warp`
/// borrows it mutably, so two warps can never run against one scene at
/// the same time.
#[derive(Debug, Clone)]
pub struct ScoreWarper {
    metrics: SceneMetrics,
    options: WarpOptions,
    records: Vec<AlignmentRecord>,
    index: Option<AlignmentIndex>,
    warp_function: Option<WarpFunction>,
}

impl ScoreWarper {
    /// Read the scene's metrics with default options.
    pub fn new<S: Scene + ?Sized>(scene: &S) -> WarpResult<Self> {
        Self::with_options(scene, WarpOptions::default())
    }

    pub fn with_options<S: Scene + ?Sized>(scene: &S, options: WarpOptions) -> WarpResult<Self> {
        let metrics = SceneMetrics::from_scene(scene).inspect_err(|e| {
            tracing::error!(event = "fatal", error = %e, "cannot read scene metrics");
        })?;
        Ok(Self {
            metrics,
            options,
            records: Vec::new(),
            index: None,
            warp_function: None,
        })
    }

    /// Switch to a different scene instance. Metrics are re-read and the
    /// loaded alignment, if any, is resolved again against the new scene.
    /// On failure the warper still describes the previous scene.
    pub fn replace_scene<S: Scene + ?Sized>(&mut self, scene: &S) -> WarpResult<()> {
        let metrics = SceneMetrics::from_scene(scene)?;
        let index = if self.records.is_empty() {
            None
        } else {
            Some(AlignmentIndex::build(&self.records, scene, &metrics)?)
        };
        self.metrics = metrics;
        self.index = index;
        self.warp_function = None;
        Ok(())
    }

    /// Resolve a new alignment against the scene. On failure the
    /// previously loaded alignment is kept.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub fn load_alignment<S: Scene + ?Sized>(
        &mut self,
        scene: &S,
        records: Vec<AlignmentRecord>,
    ) -> WarpResult<()> {
        let index = AlignmentIndex::build(&records, scene, &self.metrics)?;
        self.records = records;
        self.index = Some(index);
        Ok(())
    }

    /// Warp the scene to the loaded alignment.
    #[tracing::instrument(skip_all)]
    pub fn warp<S: Scene + ?Sized>(&mut self, scene: &mut S) -> WarpResult<ApplyStats> {
        let index = self.index.as_ref().ok_or(WarpError::NotLoaded)?;
        let warp = WarpFunction::build(index, &self.metrics, self.options.domain);
        let stats = engine::apply(scene, &warp, &self.options);
        if self.options.fine_pass {
            engine::align_individual_notes(scene, &self.records, index);
        }
        self.warp_function = Some(warp);
        Ok(stats)
    }

    /// Load `records` and warp in one step.
    pub fn warp_to<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        records: Vec<AlignmentRecord>,
    ) -> WarpResult<ApplyStats> {
        self.load_alignment(scene, records)?;
        self.warp(scene)
    }

    /// Place every note of every valid record exactly on its onset
    /// position. Meant to run after [`ScoreWarper::warp`]. Returns the
    /// number of notes placed.
    pub fn warp_individual_notes<S: Scene + ?Sized>(&self, scene: &mut S) -> WarpResult<usize> {
        let index = self.index.as_ref().ok_or(WarpError::NotLoaded)?;
        Ok(engine::align_individual_notes(scene, &self.records, index))
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn metrics(&self) -> &SceneMetrics {
        &self.metrics
    }

    pub fn options(&self) -> &WarpOptions {
        &self.options
    }

    pub fn records(&self) -> &[AlignmentRecord] {
        &self.records
    }

    pub fn index(&self) -> Option<&AlignmentIndex> {
        self.index.as_ref()
    }

    /// The displacement array of the most recent warp.
    pub fn warp_function(&self) -> Option<&WarpFunction> {
        self.warp_function.as_ref()
    }

    /// Onset times of the first and last matched notes (`tmn`, `tmx`).
    pub fn time_bounds(&self) -> Option<Span> {
        self.index.as_ref().map(AlignmentIndex::time_bounds)
    }

    /// Display x of the first and last matched notes (`fstX`, `lstX`).
    pub fn screen_bounds(&self) -> Option<Span> {
        self.index.as_ref().map(AlignmentIndex::screen_bounds)
    }

    pub fn note_positions(&self) -> &[f64] {
        self.index.as_ref().map(AlignmentIndex::note_positions).unwrap_or_default()
    }

    pub fn note_screen_positions(&self) -> &[f64] {
        self.index.as_ref().map(AlignmentIndex::note_screen_positions).unwrap_or_default()
    }

    pub fn onset_positions(&self) -> &[f64] {
        self.index.as_ref().map(AlignmentIndex::onset_positions).unwrap_or_default()
    }

    pub fn time_to_screen(&self, t: f64) -> Option<f64> {
        self.index.as_ref().map(|i| i.time_to_screen(t))
    }

    pub fn time_to_local(&self, t: f64) -> Option<f64> {
        self.index.as_ref().map(|i| i.time_to_local(t))
    }

    pub fn local_to_screen(&self, x: f64) -> f64 {
        coords::local_to_screen(x, &self.metrics)
    }
}

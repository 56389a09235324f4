//! Element transform engine: applies a warp function to every warpable
//! element of a scene.
//!
//! Elements are handled by category:
//!   - notes, rests and arpeggios move rigidly by the displacement at
//!     their centre, dragging ledger lines and shared chord marks along;
//!   - single-coordinate marks have their coordinate rewritten;
//!   - paths, lines and beams are translated and stretched so both of
//!     their ends land where the warp puts them.
//!
//! Groups run first, then point marks, then extent shapes. Nothing here
//! aborts the pass: an element that cannot be measured is skipped.

mod ops;

use serde::Serialize;

use crate::alignment::AlignmentIndex;
use crate::config::WarpOptions;
use crate::model::{AlignmentRecord, ElementShape, ExtentKind, GroupKind, PointAttr};
use crate::scene::{anchor_x, format_coord, numeric_attribute, Scene};
use crate::warp::WarpFunction;

/// What one warp pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyStats {
    /// Notes, rests and arpeggios moved
    pub groups: usize,
    /// Point marks whose coordinate was rewritten
    pub points: usize,
    /// Paths, lines and beams given a translate/stretch
    pub extents: usize,
    /// Ledger lines and chord marks moved along with a note
    pub cascaded: usize,
    /// Extent shapes left alone because they already carried a transform
    pub untouched: usize,
    /// Elements that could not be measured
    pub skipped: usize,
    /// Elements that lost an optional transform component
    pub degenerate: usize,
}

/// Order in which categories are processed.
fn pass_rank(shape: &ElementShape) -> u8 {
    match shape {
        ElementShape::Group { .. } => 0,
        ElementShape::Point { .. } => 1,
        ElementShape::Extent { .. } => 2,
    }
}

/// Apply `warp` to every warpable element of `scene`.
pub fn apply<S: Scene + ?Sized>(scene: &mut S, warp: &WarpFunction, options: &WarpOptions) -> ApplyStats {
    let mut targets = scene.warp_targets();
    targets.sort_by_key(|(_, shape)| pass_rank(shape));

    let mut stats = ApplyStats::default();
    for (node, shape) in targets {
        match shape {
            ElementShape::Group { kind } => shift_group(scene, node, kind, warp, &mut stats),
            ElementShape::Point { attr } => shift_point(scene, node, attr, warp, &mut stats),
            ElementShape::Extent { kind } => {
                stretch_extent(scene, node, kind, warp, options, &mut stats)
            }
        }
    }

    tracing::debug!(
        groups = stats.groups,
        points = stats.points,
        extents = stats.extents,
        cascaded = stats.cascaded,
        untouched = stats.untouched,
        skipped = stats.skipped,
        degenerate = stats.degenerate,
        "warp applied"
    );
    stats
}

// ═══════════════════════════════════════════════════════════════════════
// Groups
// ═══════════════════════════════════════════════════════════════════════

fn shift_group<S: Scene + ?Sized>(
    scene: &mut S,
    node: S::Node,
    kind: GroupKind,
    warp: &WarpFunction,
    stats: &mut ApplyStats,
) {
    let Some(ext) = scene.extent(node) else {
        tracing::debug!(event = "skip", ?node, ?kind, "group has no extent");
        stats.skipped += 1;
        return;
    };
    let anchor = ext.center().x;
    let shift = warp.shift_at(anchor);
    if !shift.is_finite() {
        tracing::debug!(event = "degenerate_geometry", ?node, anchor, "non-finite group shift");
        stats.degenerate += 1;
        return;
    }
    stats.groups += 1;

    // Arpeggios sit apart from their notes and must not pick up the
    // notes' accumulated translation.
    if kind == GroupKind::Arpeggio {
        ops::prepend_translation(scene, node, shift);
        return;
    }

    ops::compose_translation(scene, node, shift);

    for ledger in scene.ledger_lines(node) {
        let straddles = scene
            .extent(ledger)
            .is_some_and(|e| e.x0 < anchor && e.x1 > anchor);
        if straddles && scene.transforms(ledger).is_empty() {
            ops::prepend_translation(scene, ledger, shift);
            stats.cascaded += 1;
        }
    }

    if let Some(chord) = scene.enclosing_chord(node) {
        if scene.chord_notes(chord).first() == Some(&node) {
            for mark in scene.chord_decorations(chord) {
                ops::compose_translation(scene, mark, shift);
                stats.cascaded += 1;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Point marks
// ═══════════════════════════════════════════════════════════════════════

fn shift_point<S: Scene + ?Sized>(
    scene: &mut S,
    node: S::Node,
    attr: PointAttr,
    warp: &WarpFunction,
    stats: &mut ApplyStats,
) {
    let Some(x) = numeric_attribute(scene, node, attr.name()) else {
        tracing::debug!(event = "skip", ?node, attr = attr.name(), "point mark without coordinate");
        stats.skipped += 1;
        return;
    };
    let moved = x + warp.shift_at(x);
    if !moved.is_finite() {
        stats.degenerate += 1;
        return;
    }
    scene.set_attribute(node, attr.name(), &format_coord(moved));
    stats.points += 1;
}

// ═══════════════════════════════════════════════════════════════════════
// Extent shapes
// ═══════════════════════════════════════════════════════════════════════

fn stretch_extent<S: Scene + ?Sized>(
    scene: &mut S,
    node: S::Node,
    kind: ExtentKind,
    warp: &WarpFunction,
    options: &WarpOptions,
    stats: &mut ApplyStats,
) {
    let ends = match kind {
        ExtentKind::Path => scene.extent(node).map(|e| (e.x0, e.x1)),
        ExtentKind::Line => numeric_attribute(scene, node, "x1").zip(numeric_attribute(scene, node, "x2")),
        ExtentKind::Beam => beam_ends(scene, node, options.beam_stem_tolerance),
    };
    let Some((x1, x2)) = ends else {
        tracing::debug!(event = "skip", ?node, ?kind, "no reference ends");
        stats.skipped += 1;
        return;
    };

    // A transform already on the element means it was placed by someone
    // else; stretching on top would apply the warp twice.
    if !scene.transforms(node).is_empty() {
        stats.untouched += 1;
        return;
    }

    let shift1 = warp.shift_at(x1);
    let shift2 = warp.shift_at(x2);
    let (list, scale) = ops::stretch(x1, x2, shift1, shift2);
    if list.len() < 2 {
        tracing::debug!(
            event = "degenerate_geometry",
            ?node,
            x1,
            x2,
            shift1,
            scale,
            "transform component omitted"
        );
        stats.degenerate += 1;
    }
    if !list.is_empty() {
        scene.set_transforms(node, list);
        stats.extents += 1;
    }
}

/// Left and right reference x of a beam: the stems of its beam group
/// closest to the beam's left and right edges, within `tolerance`.
fn beam_ends<S: Scene + ?Sized>(scene: &S, beam: S::Node, tolerance: f64) -> Option<(f64, f64)> {
    let ext = scene.extent(beam)?;
    let mut left: Option<(f64, f64)> = None;
    let mut right: Option<(f64, f64)> = None;

    for stem in scene.beam_stems(beam) {
        let Some(stem_x) = scene.extent(stem).map(|e| e.x0) else {
            continue;
        };
        let to_left = (stem_x - ext.x0).abs();
        let to_right = (stem_x - ext.x1).abs();
        if to_left < tolerance && to_left <= to_right {
            if left.map_or(true, |(d, _)| to_left < d) {
                left = Some((to_left, stem_x));
            }
        } else if to_right < tolerance && right.map_or(true, |(d, _)| to_right < d) {
            right = Some((to_right, stem_x));
        }
    }

    Some((left?.1, right?.1))
}

// ═══════════════════════════════════════════════════════════════════════
// Individual notes
// ═══════════════════════════════════════════════════════════════════════

/// Move every note of every valid record so its anchor sits exactly on
/// the record's onset position. Corrects chord members that the group
/// pass could only move by their chord's shared displacement. Returns
/// the number of notes placed.
pub fn align_individual_notes<S: Scene + ?Sized>(
    scene: &mut S,
    records: &[AlignmentRecord],
    index: &AlignmentIndex,
) -> usize {
    let mut placed = 0;
    let range = index.first_valid_index()..=index.last_valid_index();

    for (i, record) in records.iter().enumerate() {
        if !range.contains(&i) || !record.has_onset() {
            continue;
        }
        let target = index.time_to_local(record.observed_onset_seconds);
        for id in &record.ids {
            let Some(node) = scene.find_by_id(id) else {
                tracing::warn!(event = "skip", record = i, id = id.as_str(), "note not found in scene");
                continue;
            };
            let Some(x) = anchor_x(scene, node) else {
                tracing::warn!(event = "skip", record = i, id = id.as_str(), "note has no anchor glyph");
                continue;
            };
            ops::set_translation_x(scene, node, target - x);
            placed += 1;
        }
    }

    placed
}

//! The scene abstraction the warper works through.
//!
//! A scene is owned by the caller. The warper only reads geometry, reads
//! and writes coordinate attributes, and reads and replaces transform
//! lists. Any rendering backend that can answer these queries can be
//! warped; [`crate::svg::SvgScene`] is the one shipped with the crate.

use std::fmt::Debug;

use kurbo::Rect;

use crate::model::{ElementShape, Transform};

pub trait Scene {
    /// Handle to one element of the scene.
    type Node: Copy + Eq + Debug;

    // ── Metrics sources ─────────────────────────────────────────────

    /// The outermost element, carrying the declared display `width`/`height`.
    fn root(&self) -> Self::Node;

    /// The first rendered element defining the local coordinate window
    /// (`viewBox`). Definitions such as glyph symbols never qualify.
    fn view_window_node(&self) -> Option<Self::Node>;

    /// The top-level layout group whose translation offsets local coordinates.
    fn layout_group(&self) -> Option<Self::Node>;

    // ── Lookup ──────────────────────────────────────────────────────

    fn find_by_id(&self, id: &str) -> Option<Self::Node>;

    /// The glyph whose extent anchors a note or rest (its notehead).
    fn anchor_glyph(&self, node: Self::Node) -> Option<Self::Node>;

    /// Every element that takes part in a warp, in document order.
    fn warp_targets(&self) -> Vec<(Self::Node, ElementShape)>;

    // ── Structure ───────────────────────────────────────────────────

    /// Ledger-line segments belonging to the staff that encloses `node`.
    fn ledger_lines(&self, node: Self::Node) -> Vec<Self::Node>;

    /// The chord group enclosing `node`, if any.
    fn enclosing_chord(&self, node: Self::Node) -> Option<Self::Node>;

    /// Notes of a chord in document order.
    fn chord_notes(&self, chord: Self::Node) -> Vec<Self::Node>;

    /// Shared chord marks that move with the chord's first note: the stem,
    /// articulations and augmentation dots.
    fn chord_decorations(&self, chord: Self::Node) -> Vec<Self::Node>;

    /// Stems of the beam group enclosing `node`.
    fn beam_stems(&self, node: Self::Node) -> Vec<Self::Node>;

    // ── Geometry & mutation ─────────────────────────────────────────

    /// Visual extent in the element's own user space: its own transform
    /// list is not applied, descendants' transforms are.
    fn extent(&self, node: Self::Node) -> Option<Rect>;

    fn transforms(&self, node: Self::Node) -> Vec<Transform>;

    fn set_transforms(&mut self, node: Self::Node, transforms: Vec<Transform>);

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);
}

/// Horizontal anchor of a note-like element: the mid-point of its
/// anchor glyph's extent.
pub fn anchor_x<S: Scene + ?Sized>(scene: &S, node: S::Node) -> Option<f64> {
    let glyph = scene.anchor_glyph(node)?;
    let ext = scene.extent(glyph)?;
    let x = ext.x0 + ext.width() / 2.0;
    x.is_finite().then_some(x)
}

/// Numeric attribute, read as an SVG length.
pub fn numeric_attribute<S: Scene + ?Sized>(scene: &S, node: S::Node, name: &str) -> Option<f64> {
    scene.attribute(node, name).and_then(|v| parse_number(&v))
}

/// Parse a numeric attribute as an SVG length: `"2100px"` → 2100,
/// `" -4.5e1 "` → -45. The unit is dropped. Returns `None` when the value
/// is not a single length.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<svgtypes::Length>().ok().map(|l| l.number)
}

/// Parse a view window (`viewBox`) value into `[min_x, min_y, width, height]`.
/// Non-positive sizes are rejected.
pub fn parse_view_box(s: &str) -> Option<[f64; 4]> {
    s.parse::<svgtypes::ViewBox>()
        .ok()
        .map(|v| [v.x, v.y, v.w, v.h])
}

/// Format a coordinate for writing back into an attribute.
pub fn format_coord(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

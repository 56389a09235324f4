//! Data model shared by the alignment index, the warp engine and scene
//! backends.
//!
//! These structures describe what the warper consumes (alignment records),
//! what it writes back into a scene (transforms), and how scene elements
//! are categorized for warping.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// Alignment records
// ═══════════════════════════════════════════════════════════════════════

/// One performed onset matched against one or more notation elements.
///
/// Accepts both the field names used here and the names written by the
/// score-to-audio alignment tool (`xml_id`, `obs_mean_onset`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    /// Element identifiers sharing this onset (chord members). The first
    /// one anchors the record.
    #[serde(alias = "xml_id")]
    pub ids: Vec<String>,
    /// Observed onset in seconds. Negative means unmatched.
    #[serde(alias = "obs_mean_onset")]
    pub observed_onset_seconds: f64,
    /// Set by the producer on synthetic entries appended after the last
    /// real onset.
    #[serde(default)]
    pub is_trailing_synthetic: bool,
}

impl AlignmentRecord {
    pub fn new<I, S>(ids: I, observed_onset_seconds: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            observed_onset_seconds,
            is_trailing_synthetic: false,
        }
    }

    /// Mark this record as a synthetic trailing entry.
    pub fn trailing(mut self) -> Self {
        self.is_trailing_synthetic = true;
        self
    }

    /// Whether the onset carries a usable time (not the unmatched sentinel).
    pub fn has_onset(&self) -> bool {
        self.observed_onset_seconds.is_finite() && self.observed_onset_seconds >= 0.0
    }

    /// The identifier that anchors this record, if any.
    pub fn anchor_id(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Transforms
// ═══════════════════════════════════════════════════════════════════════

/// A single entry of an element's transform list, applied in list order
/// (the first entry is outermost, as in SVG).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    Translate { x: f64, y: f64 },
    /// Scale about `origin` rather than about (0, 0).
    Scale { x: f64, y: f64, origin: Point },
    /// Rotation in degrees about `center`.
    Rotate { angle: f64, center: Point },
    Matrix([f64; 6]),
}

impl Transform {
    pub fn translate_x(x: f64) -> Self {
        Transform::Translate { x, y: 0.0 }
    }

    /// Horizontal-only scale about a vertical line at `origin_x`.
    pub fn scale_x_about(x: f64, origin_x: f64) -> Self {
        Transform::Scale {
            x,
            y: 1.0,
            origin: Point::new(origin_x, 0.0),
        }
    }

    pub fn to_affine(&self) -> Affine {
        match *self {
            Transform::Translate { x, y } => Affine::translate((x, y)),
            Transform::Scale { x, y, origin } => {
                let o = origin.to_vec2();
                Affine::translate(o) * Affine::scale_non_uniform(x, y) * Affine::translate(-o)
            }
            Transform::Rotate { angle, center } => {
                let c: Vec2 = center.to_vec2();
                Affine::translate(c) * Affine::rotate(angle.to_radians()) * Affine::translate(-c)
            }
            Transform::Matrix(m) => Affine::new(m),
        }
    }
}

/// Collapse a transform list into one affine map.
pub fn compose(transforms: &[Transform]) -> Affine {
    transforms
        .iter()
        .fold(Affine::IDENTITY, |acc, t| acc * t.to_affine())
}

// ═══════════════════════════════════════════════════════════════════════
// Element categories
// ═══════════════════════════════════════════════════════════════════════

/// How an element takes part in a warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementShape {
    /// A single-coordinate mark rewritten in place.
    Point { attr: PointAttr },
    /// A notation group moved as a whole.
    Group { kind: GroupKind },
    /// A shape spanning two x positions that stretches with the warp.
    Extent { kind: ExtentKind },
}

/// Which coordinate attribute carries a point element's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointAttr {
    /// `x`, used by text and rectangles
    X,
    /// `cx`, used by circles and ellipses
    Cx,
}

impl PointAttr {
    pub fn name(self) -> &'static str {
        match self {
            PointAttr::X => "x",
            PointAttr::Cx => "cx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Note,
    Rest,
    Arpeggio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtentKind {
    /// Free path or polygon (slurs, barlines, staff lines); spans its own extent.
    Path,
    /// Beam polygon; spans the stems it connects.
    Beam,
    /// Line primitive with explicit `x1`/`x2` endpoints.
    Line,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_producer_field_names() {
        let json = r#"{"xml_id": ["n1", "n2"], "obs_mean_onset": 1.25}"#;
        let rec: AlignmentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.ids, vec!["n1", "n2"]);
        assert_eq!(rec.observed_onset_seconds, 1.25);
        assert!(!rec.is_trailing_synthetic);
        assert!(rec.has_onset());
    }

    #[test]
    fn negative_onset_is_unmatched() {
        assert!(!AlignmentRecord::new(["n1"], -1.0).has_onset());
        assert!(!AlignmentRecord::new(["n1"], f64::NAN).has_onset());
        assert!(AlignmentRecord::new(["n1"], 0.0).has_onset());
    }

    #[test]
    fn scale_about_origin_keeps_origin_fixed() {
        let a = Transform::scale_x_about(2.0, 10.0).to_affine();
        assert_eq!(a * Point::new(10.0, 5.0), Point::new(10.0, 5.0));
        assert_eq!(a * Point::new(20.0, 5.0), Point::new(30.0, 5.0));
    }

    #[test]
    fn compose_applies_first_entry_outermost() {
        let list = [Transform::translate_x(5.0), Transform::scale_x_about(2.0, 10.0)];
        let p = compose(&list) * Point::new(20.0, 0.0);
        assert!((p.x - 35.0).abs() < 1e-9);
    }
}

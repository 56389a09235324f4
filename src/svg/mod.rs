//! SVG scene backend: an owned, mutable element tree loaded from
//! engraved score SVG.
//!
//! Element roles follow the engraver's class conventions:
//! `g.note`, `g.rest`, `g.arpeg`, `g.chord`, `g.beam`, `g.stem`,
//! `g.staff`, `g.ledgerLines`, `g.notehead`, `g.artic`, `g.dots` and the
//! top-level `g.page-margin` layout group. Glyphs are `<use>` elements
//! pointing at `<symbol>`s in `<defs>`.

mod geometry;
mod parse;
mod transform;

use std::collections::HashMap;

use kurbo::Rect;

use crate::error::WarpResult;
use crate::model::{ElementShape, ExtentKind, GroupKind, PointAttr, Transform};
use crate::scene::Scene;

// ── Class names ─────────────────────────────────────────────────────
const CLASS_NOTE: &str = "note";
const CLASS_REST: &str = "rest";
const CLASS_ARPEGGIO: &str = "arpeg";
const CLASS_CHORD: &str = "chord";
const CLASS_BEAM: &str = "beam";
const CLASS_STEM: &str = "stem";
const CLASS_STAFF: &str = "staff";
const CLASS_LEDGER_LINES: &str = "ledgerLines";
const CLASS_NOTEHEAD: &str = "notehead";
const CLASS_ARTIC: &str = "artic";
const CLASS_DOTS: &str = "dots";
const CLASS_PAGE_MARGIN: &str = "page-margin";

/// Index of an element in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub(crate) struct SvgNode {
    pub(crate) tag: String,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    /// Attributes by local name, `transform` excluded.
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) transforms: Vec<Transform>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// One past the last descendant; descendants occupy `id+1..subtree_end`.
    pub(crate) subtree_end: usize,
}

impl SvgNode {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// A mutable score scene parsed from SVG text.
#[derive(Debug, Clone)]
pub struct SvgScene {
    nodes: Vec<SvgNode>,
    ids: HashMap<String, NodeId>,
}

impl SvgScene {
    /// Load engraved SVG text.
    pub fn parse(svg: &str) -> WarpResult<Self> {
        parse::parse_svg(svg)
    }

    /// Number of elements in the scene.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id).has_class(class)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub(crate) fn node(&self, id: NodeId) -> &SvgNode {
        &self.nodes[id.0]
    }

    fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        (id.0 + 1..self.node(id).subtree_end).map(NodeId)
    }

    /// `id` and its descendants in document order, minus the contents of
    /// unrendered containers such as `defs` and `symbol`.
    fn rendered_subtree(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let end = self.node(id).subtree_end;
        let mut next = id.0;
        std::iter::from_fn(move || {
            while next < end {
                let n = NodeId(next);
                if geometry::is_unrendered(self.tag(n)) {
                    next = self.node(n).subtree_end;
                    continue;
                }
                next += 1;
                return Some(n);
            }
            None
        })
    }

    /// `id` itself, then its ancestors up to the root.
    fn ancestors_or_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.node(n).parent)
    }

    /// Nearest ancestor-or-self carrying `class`.
    fn closest(&self, id: NodeId, class: &str) -> Option<NodeId> {
        self.ancestors_or_self(id).find(|&n| self.has_class(n, class))
    }

    fn within_any(&self, id: NodeId, classes: &[&str]) -> bool {
        self.ancestors_or_self(id)
            .any(|n| classes.iter().any(|c| self.has_class(n, c)))
    }

    fn descendants_with_class(&self, id: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    /// Element that bounds warping: the layout group when present, the
    /// whole document otherwise.
    fn content_root(&self) -> NodeId {
        self.layout_group().unwrap_or(NodeId(0))
    }

    /// Categorize one element, or `None` when it does not warp on its own.
    fn classify(&self, id: NodeId) -> Option<ElementShape> {
        let node = self.node(id);
        let inside_note = || self.within_any(id, &[CLASS_NOTE, CLASS_CHORD]);

        match node.tag.as_str() {
            "g" => {
                let kind = if node.has_class(CLASS_NOTE) {
                    GroupKind::Note
                } else if node.has_class(CLASS_REST) {
                    GroupKind::Rest
                } else if node.has_class(CLASS_ARPEGGIO) {
                    GroupKind::Arpeggio
                } else {
                    return None;
                };
                Some(ElementShape::Group { kind })
            }
            "path" => {
                if self.within_any(id, &[CLASS_NOTE, CLASS_CHORD, CLASS_LEDGER_LINES]) {
                    return None;
                }
                Some(ElementShape::Extent { kind: ExtentKind::Path })
            }
            "polygon" => {
                if inside_note() {
                    return None;
                }
                let kind = if self.closest(id, CLASS_BEAM).is_some() {
                    ExtentKind::Beam
                } else {
                    ExtentKind::Path
                };
                Some(ElementShape::Extent { kind })
            }
            "line" => {
                if inside_note() {
                    return None;
                }
                Some(ElementShape::Extent { kind: ExtentKind::Line })
            }
            "rect" | "text" if node.attr("x").is_some() && !inside_note() => {
                Some(ElementShape::Point { attr: PointAttr::X })
            }
            "ellipse" | "circle" if !inside_note() => Some(ElementShape::Point { attr: PointAttr::Cx }),
            _ => None,
        }
    }
}

impl Scene for SvgScene {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    // Glyph symbols carry their own viewBox; only a painted <svg> counts.
    fn view_window_node(&self) -> Option<NodeId> {
        self.rendered_subtree(self.root())
            .find(|&n| self.tag(n) == "svg" && self.node(n).attr("viewBox").is_some())
    }

    fn layout_group(&self) -> Option<NodeId> {
        self.rendered_subtree(self.root())
            .find(|&n| self.has_class(n, CLASS_PAGE_MARGIN))
    }

    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    fn anchor_glyph(&self, node: NodeId) -> Option<NodeId> {
        let glyph_in = |scope: NodeId| self.descendants(scope).find(|&n| self.tag(n) == "use");
        let scope = self
            .descendants(node)
            .find(|&n| self.has_class(n, CLASS_NOTEHEAD))
            .unwrap_or(node);
        glyph_in(scope).or(Some(scope))
    }

    fn warp_targets(&self) -> Vec<(NodeId, ElementShape)> {
        self.rendered_subtree(self.content_root())
            .filter_map(|n| self.classify(n).map(|shape| (n, shape)))
            .collect()
    }

    fn ledger_lines(&self, node: NodeId) -> Vec<NodeId> {
        let Some(staff) = self.closest(node, CLASS_STAFF) else {
            return Vec::new();
        };
        self.descendants_with_class(staff, CLASS_LEDGER_LINES)
            .into_iter()
            .flat_map(|group| self.descendants(group))
            .filter(|&n| self.tag(n) == "path")
            .collect()
    }

    fn enclosing_chord(&self, node: NodeId) -> Option<NodeId> {
        self.closest(node, CLASS_CHORD)
    }

    fn chord_notes(&self, chord: NodeId) -> Vec<NodeId> {
        self.descendants_with_class(chord, CLASS_NOTE)
    }

    fn chord_decorations(&self, chord: NodeId) -> Vec<NodeId> {
        let stem = self.descendants(chord).find(|&n| self.has_class(n, CLASS_STEM));
        stem.into_iter()
            .chain(self.descendants_with_class(chord, CLASS_ARTIC))
            .chain(self.descendants_with_class(chord, CLASS_DOTS))
            .collect()
    }

    fn beam_stems(&self, node: NodeId) -> Vec<NodeId> {
        match self.closest(node, CLASS_BEAM) {
            Some(beam) => self.descendants_with_class(beam, CLASS_STEM),
            None => Vec::new(),
        }
    }

    fn extent(&self, node: NodeId) -> Option<Rect> {
        geometry::extent(self, node)
    }

    fn transforms(&self, node: NodeId) -> Vec<Transform> {
        self.node(node).transforms.clone()
    }

    fn set_transforms(&mut self, node: NodeId, transforms: Vec<Transform>) {
        self.nodes[node.0].transforms = transforms;
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node).attr(name).map(String::from)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let attrs = &mut self.nodes[node.0].attrs;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCORE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="100px" height="50px">
  <defs>
    <symbol id="E0A4" viewBox="0 0 1000 1000"><path transform="scale(1,-1)" d="M0 -100 L300 -100 L300 100 L0 100 Z"/></symbol>
  </defs>
  <svg class="definition-scale" viewBox="0 0 1000 500">
    <g class="page-margin" transform="translate(20, 10)">
      <g class="staff">
        <path d="M0 100 L900 100"/>
        <g class="ledgerLines"><path d="M95 150 L125 150"/></g>
        <g class="layer">
          <g class="chord">
            <g id="n1" class="note"><g class="notehead"><use xlink:href="#E0A4" x="100" y="150" width="100" height="100"/></g></g>
            <g id="n2" class="note"><g class="notehead"><use xlink:href="#E0A4" x="100" y="130" width="100" height="100"/></g></g>
            <g class="stem"><path d="M128 150 L128 80"/></g>
            <g class="dots"><ellipse cx="140" cy="150" rx="3" ry="3"/></g>
          </g>
          <g class="beam">
            <g id="n3" class="note"><g class="stem"><path d="M200 150 L200 80"/></g></g>
            <polygon points="200,80 300,80 300,86 200,86"/>
          </g>
        </g>
      </g>
      <text x="50" y="20">Title</text>
    </g>
  </svg>
</svg>"##;

    fn scene() -> SvgScene {
        SvgScene::parse(SCORE).unwrap()
    }

    #[test]
    fn finds_metrics_nodes() {
        let s = scene();
        assert_eq!(s.tag(s.root()), "svg");
        let vw = s.view_window_node().unwrap();
        assert_eq!(s.attribute(vw, "viewBox").as_deref(), Some("0 0 1000 500"));
        let lg = s.layout_group().unwrap();
        assert_eq!(s.transforms(lg), vec![Transform::Translate { x: 20.0, y: 10.0 }]);
    }

    #[test]
    fn glyph_extent_follows_symbol_view_box() {
        let s = scene();
        let n1 = s.find_by_id("n1").unwrap();
        let glyph = s.anchor_glyph(n1).unwrap();
        assert_eq!(s.tag(glyph), "use");
        let ext = s.extent(glyph).unwrap();
        assert!((ext.x0 - 100.0).abs() < 1e-9);
        assert!((ext.x1 - 130.0).abs() < 1e-9);
        assert_eq!(crate::scene::anchor_x(&s, n1), Some(115.0));
    }

    #[test]
    fn classifies_targets_in_document_order() {
        let s = scene();
        let shapes: Vec<ElementShape> = s.warp_targets().into_iter().map(|(_, k)| k).collect();
        assert_eq!(
            shapes,
            vec![
                ElementShape::Extent { kind: ExtentKind::Path },
                ElementShape::Group { kind: GroupKind::Note },
                ElementShape::Group { kind: GroupKind::Note },
                ElementShape::Group { kind: GroupKind::Note },
                ElementShape::Extent { kind: ExtentKind::Beam },
                ElementShape::Point { attr: PointAttr::X },
            ]
        );
    }

    #[test]
    fn structural_queries() {
        let s = scene();
        let n1 = s.find_by_id("n1").unwrap();
        let n2 = s.find_by_id("n2").unwrap();
        let n3 = s.find_by_id("n3").unwrap();

        assert_eq!(s.ledger_lines(n1).len(), 1);
        let chord = s.enclosing_chord(n1).unwrap();
        assert_eq!(s.chord_notes(chord), vec![n1, n2]);
        let decorations = s.chord_decorations(chord);
        assert_eq!(decorations.len(), 2);
        assert!(s.has_class(decorations[0], CLASS_STEM));
        assert!(s.has_class(decorations[1], CLASS_DOTS));

        assert!(s.enclosing_chord(n3).is_none());
        assert_eq!(s.beam_stems(n3).len(), 1);
    }

    #[test]
    fn group_extent_applies_child_transforms() {
        let mut s = scene();
        let n3 = s.find_by_id("n3").unwrap();
        let stem = s.beam_stems(n3)[0];
        s.set_transforms(stem, vec![Transform::translate_x(5.0)]);
        let ext = s.extent(n3).unwrap();
        assert!((ext.x0 - 205.0).abs() < 1e-9);
        // The stem's own transform is not part of its own extent.
        assert!((s.extent(stem).unwrap().x0 - 200.0).abs() < 1e-9);
    }

    #[test]
    fn polygon_extent_needs_a_clean_point_list() {
        let polygon = |s: &SvgScene| (0..s.len()).map(NodeId).find(|&n| s.tag(n) == "polygon").unwrap();

        let s = scene();
        assert_eq!(s.extent(polygon(&s)), Some(Rect::new(200.0, 80.0, 300.0, 86.0)));

        let broken = SvgScene::parse(&SCORE.replace("200,80 300,80", "200,80 abc,80")).unwrap();
        assert_eq!(broken.extent(polygon(&broken)), None);
    }

    #[test]
    fn set_attribute_overwrites_or_appends() {
        let mut s = scene();
        let root = s.root();
        s.set_attribute(root, "width", "200px");
        s.set_attribute(root, "data-warped", "1");
        assert_eq!(s.attribute(root, "width").as_deref(), Some("200px"));
        assert_eq!(s.attribute(root, "data-warped").as_deref(), Some("1"));
    }

    #[test]
    fn rejects_non_svg_root() {
        assert!(SvgScene::parse("<html/>").is_err());
        assert!(SvgScene::parse("<svg").is_err());
    }
}

//! Bounding boxes of SVG elements in their own user space.

use kurbo::{BezPath, Point, Rect, Shape};

use super::{NodeId, SvgScene};
use crate::model::compose;
use crate::scene::{parse_number, parse_view_box};

/// Guards `<use>` → `<symbol>` → `<use>` chains.
const MAX_REFERENCE_DEPTH: usize = 16;

/// Tags whose content is never painted in place.
pub(super) fn is_unrendered(tag: &str) -> bool {
    matches!(tag, "defs" | "symbol" | "style" | "title" | "desc" | "metadata" | "clipPath" | "mask")
}

pub(super) fn extent(scene: &SvgScene, id: NodeId) -> Option<Rect> {
    extent_at_depth(scene, id, 0)
}

fn extent_at_depth(scene: &SvgScene, id: NodeId, depth: usize) -> Option<Rect> {
    if depth > MAX_REFERENCE_DEPTH {
        return None;
    }
    let node = scene.node(id);
    let num = |name: &str| node.attr(name).and_then(parse_number);

    match node.tag.as_str() {
        "rect" => {
            let (x, y) = (num("x").unwrap_or(0.0), num("y").unwrap_or(0.0));
            let (w, h) = (num("width")?, num("height")?);
            Some(Rect::new(x, y, x + w, y + h))
        }
        "circle" => {
            let (cx, cy, r) = (num("cx").unwrap_or(0.0), num("cy").unwrap_or(0.0), num("r")?);
            Some(Rect::new(cx - r, cy - r, cx + r, cy + r))
        }
        "ellipse" => {
            let (cx, cy) = (num("cx").unwrap_or(0.0), num("cy").unwrap_or(0.0));
            let (rx, ry) = (num("rx")?, num("ry")?);
            Some(Rect::new(cx - rx, cy - ry, cx + rx, cy + ry))
        }
        "line" => {
            let p1 = Point::new(num("x1").unwrap_or(0.0), num("y1").unwrap_or(0.0));
            let p2 = Point::new(num("x2").unwrap_or(0.0), num("y2").unwrap_or(0.0));
            Some(Rect::from_points(p1, p2))
        }
        "polygon" | "polyline" => points_extent(node.attr("points")?),
        "path" => {
            let path = BezPath::from_svg(node.attr("d")?).ok()?;
            let bbox = path.bounding_box();
            bbox.is_finite().then_some(bbox)
        }
        // Text metrics are font-dependent; anchor text at its origin.
        "text" => {
            let p = Point::new(num("x").unwrap_or(0.0), num("y").unwrap_or(0.0));
            Some(Rect::from_points(p, p))
        }
        "use" => use_extent(scene, id, depth),
        tag if is_unrendered(tag) => None,
        _ => children_extent(scene, id, depth),
    }
}

/// Union of children's extents, each mapped through the child's own transforms.
fn children_extent(scene: &SvgScene, id: NodeId, depth: usize) -> Option<Rect> {
    scene
        .node(id)
        .children
        .iter()
        .filter_map(|&child| {
            let rect = extent_at_depth(scene, child, depth)?;
            let transforms = &scene.node(child).transforms;
            Some(if transforms.is_empty() {
                rect
            } else {
                compose(transforms).transform_rect_bbox(rect)
            })
        })
        .reduce(|a, b| a.union(b))
}

/// A `<use>` places its referenced content at (`x`, `y`). When the target
/// is a `<symbol>` with a `viewBox`, the content is also scaled into the
/// `width`×`height` box of the use element.
fn use_extent(scene: &SvgScene, id: NodeId, depth: usize) -> Option<Rect> {
    let node = scene.node(id);
    let num = |name: &str| node.attr(name).and_then(parse_number);
    let x = num("x").unwrap_or(0.0);
    let y = num("y").unwrap_or(0.0);
    let origin = Rect::new(x, y, x, y);

    let Some(target) = node
        .attr("href")
        .and_then(|h| h.strip_prefix('#'))
        .and_then(|h| scene.ids.get(h).copied())
    else {
        return Some(origin);
    };

    let target_node = scene.node(target);
    let content = if target_node.tag == "symbol" {
        children_extent(scene, target, depth + 1)
    } else {
        extent_at_depth(scene, target, depth + 1)
            .map(|r| compose(&target_node.transforms).transform_rect_bbox(r))
    };
    let Some(content) = content else {
        return Some(origin);
    };

    let view_box = target_node.attr("viewBox").and_then(parse_view_box);
    let placed = match view_box {
        Some([vx, vy, vw, vh]) if vw > 0.0 && vh > 0.0 => {
            let sx = num("width").map_or(1.0, |w| w / vw);
            let sy = num("height").map_or(1.0, |h| h / vh);
            Rect::new(
                x + (content.x0 - vx) * sx,
                y + (content.y0 - vy) * sy,
                x + (content.x1 - vx) * sx,
                y + (content.y1 - vy) * sy,
            )
        }
        _ => content + kurbo::Vec2::new(x, y),
    };
    Some(placed)
}

fn points_extent(points: &str) -> Option<Rect> {
    // A malformed list has no extent rather than a shifted one.
    let coords: Vec<f64> = svgtypes::NumberListParser::from(points)
        .collect::<Result<_, _>>()
        .ok()?;
    coords
        .chunks_exact(2)
        .map(|p| Point::new(p[0], p[1]))
        .map(|p| Rect::from_points(p, p))
        .reduce(|a, b| a.union(b))
}

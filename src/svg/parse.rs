//! SVG text → node arena.

use std::collections::HashMap;

use roxmltree::{Document, Node};

use super::transform::parse_transform_list;
use super::{NodeId, SvgNode, SvgScene};
use crate::error::{WarpError, WarpResult};

/// Parse SVG text into a mutable scene.
pub(super) fn parse_svg(svg: &str) -> WarpResult<SvgScene> {
    // Engraver output may carry a DOCTYPE
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(svg, options)
        .map_err(|e| WarpError::scene(format!("XML parse error: {e}")))?;
    let root = doc.root_element();

    if root.tag_name().name() != "svg" {
        return Err(WarpError::scene(format!(
            "Unsupported root element: '{}'. Expected 'svg'.",
            root.tag_name().name()
        )));
    }

    let mut nodes = Vec::new();
    collect(&root, None, &mut nodes)?;

    let mut ids = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        if let Some(ref id) = node.id {
            // First occurrence wins, matching a document-order id lookup
            ids.entry(id.clone()).or_insert(NodeId(i));
        }
    }

    Ok(SvgScene { nodes, ids })
}

/// Append `node` and its element descendants in pre-order.
fn collect(node: &Node, parent: Option<NodeId>, nodes: &mut Vec<SvgNode>) -> WarpResult<()> {
    let id = NodeId(nodes.len());

    let mut attrs = Vec::new();
    let mut transforms = Vec::new();
    let mut element_id = None;
    let mut classes = Vec::new();

    for attr in node.attributes() {
        // Local names only: `xml:id` and `id` both land on "id",
        // `xlink:href` and `href` both land on "href".
        match attr.name() {
            "id" => element_id = Some(attr.value().to_string()),
            "class" => classes = attr.value().split_whitespace().map(String::from).collect(),
            "transform" => {
                transforms = parse_transform_list(attr.value()).map_err(WarpError::scene)?;
            }
            _ => {}
        }
        if attr.name() != "transform" {
            attrs.push((attr.name().to_string(), attr.value().to_string()));
        }
    }

    nodes.push(SvgNode {
        tag: node.tag_name().name().to_string(),
        id: element_id,
        classes,
        attrs,
        transforms,
        parent,
        children: Vec::new(),
        subtree_end: id.0 + 1,
    });

    for child in node.children().filter(|n| n.is_element()) {
        let child_id = NodeId(nodes.len());
        nodes[id.0].children.push(child_id);
        collect(&child, Some(id), nodes)?;
    }

    nodes[id.0].subtree_end = nodes.len();
    Ok(())
}

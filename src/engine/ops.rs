//! Transform-list edits shared by the warp passes.

use crate::model::Transform;
use crate::scene::Scene;

/// Add `dx` to the element's first translation, or put a new translation
/// in front of the list when there is none.
pub(super) fn compose_translation<S: Scene + ?Sized>(scene: &mut S, node: S::Node, dx: f64) {
    edit_translation(scene, node, |x| *x += dx, dx);
}

/// Set the x of the element's first translation to `x`, keeping its y, or
/// put a new translation in front of the list when there is none.
pub(super) fn set_translation_x<S: Scene + ?Sized>(scene: &mut S, node: S::Node, x: f64) {
    edit_translation(scene, node, |tx| *tx = x, x);
}

/// Put a fresh translation ahead of everything already on the element.
pub(super) fn prepend_translation<S: Scene + ?Sized>(scene: &mut S, node: S::Node, dx: f64) {
    let mut list = scene.transforms(node);
    list.insert(0, Transform::translate_x(dx));
    scene.set_transforms(node, list);
}

fn edit_translation<S: Scene + ?Sized>(
    scene: &mut S,
    node: S::Node,
    edit: impl FnOnce(&mut f64),
    fresh: f64,
) {
    let mut list = scene.transforms(node);
    match list
        .iter()
        .position(|t| matches!(t, Transform::Translate { .. }))
    {
        Some(i) => {
            if let Transform::Translate { x, .. } = &mut list[i] {
                edit(x);
            }
        }
        None => list.insert(0, Transform::translate_x(fresh)),
    }
    scene.set_transforms(node, list);
}

/// Transform list that moves `x1` by `shift1` and `x2` by `shift2`,
/// stretching linearly in between. The scale is left out unless it is
/// finite and positive; the translation is left out unless `shift1` is
/// finite.
pub(super) fn stretch(x1: f64, x2: f64, shift1: f64, shift2: f64) -> (Vec<Transform>, f64) {
    let scale = ((x2 + shift2) - (x1 + shift1)) / (x2 - x1);
    let mut list = Vec::with_capacity(2);
    if shift1.is_finite() {
        list.push(Transform::translate_x(shift1));
    }
    if scale.is_finite() && scale > 0.0 {
        list.push(Transform::scale_x_about(scale, x1));
    }
    (list, scale)
}

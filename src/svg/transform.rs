//! `transform` attribute → [`Transform`] list.

use kurbo::Point;
use svgtypes::{TransformListParser, TransformListToken};

use crate::model::Transform;

/// Parse a transform list such as `translate(500, 500) scale(0.72)`.
/// List order is kept: the first entry stays outermost.
pub(super) fn parse_transform_list(src: &str) -> Result<Vec<Transform>, String> {
    TransformListParser::from(src)
        .map(|token| {
            token
                .map(from_token)
                .map_err(|e| format!("Malformed transform '{src}': {e}"))
        })
        .collect()
}

fn from_token(token: TransformListToken) -> Transform {
    match token {
        TransformListToken::Translate { tx, ty } => Transform::Translate { x: tx, y: ty },
        TransformListToken::Scale { sx, sy } => Transform::Scale {
            x: sx,
            y: sy,
            origin: Point::ORIGIN,
        },
        TransformListToken::Rotate { angle } => Transform::Rotate {
            angle,
            center: Point::ORIGIN,
        },
        TransformListToken::Matrix { a, b, c, d, e, f } => Transform::Matrix([a, b, c, d, e, f]),
        TransformListToken::SkewX { angle } => {
            Transform::Matrix([1.0, 0.0, angle.to_radians().tan(), 1.0, 0.0, 0.0])
        }
        TransformListToken::SkewY { angle } => {
            Transform::Matrix([1.0, angle.to_radians().tan(), 0.0, 1.0, 0.0, 0.0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::compose;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_verovio_page_margin() {
        let list = parse_transform_list("translate(500, 500)").unwrap();
        assert_eq!(list, vec![Transform::Translate { x: 500.0, y: 500.0 }]);
    }

    #[test]
    fn parses_multiple_entries_in_order() {
        let list = parse_transform_list("translate(10) scale(2,1)").unwrap();
        assert_eq!(
            list,
            vec![
                Transform::Translate { x: 10.0, y: 0.0 },
                Transform::Scale { x: 2.0, y: 1.0, origin: Point::ORIGIN },
            ]
        );
    }

    #[test]
    fn rotation_about_a_center_keeps_the_center_fixed() {
        let list = parse_transform_list("rotate(90 3 4)").unwrap();
        let p = compose(&list) * Point::new(3.0, 4.0);
        assert!((p.x - 3.0).abs() < 1e-9 && (p.y - 4.0).abs() < 1e-9);
        let q = compose(&list) * Point::new(4.0, 4.0);
        assert!((q.x - 3.0).abs() < 1e-9 && (q.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_lists() {
        assert!(parse_transform_list("wobble(1)").is_err());
        assert!(parse_transform_list("translate(1").is_err());
    }
}

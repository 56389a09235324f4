//! Static geometry of a scene, read once when a warper is created.

use serde::Serialize;

use crate::config::WarpDomain;
use crate::error::{WarpError, WarpResult};
use crate::scene::{numeric_attribute, parse_view_box, Scene};

/// The local coordinate rectangle mapped onto the declared display size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewWindow {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Display size, view window and layout offset of one scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneMetrics {
    /// Declared display width
    pub width: f64,
    /// Declared display height
    pub height: f64,
    pub view_window: ViewWindow,
    /// Horizontal translation of the top-level layout group, in local units
    pub margin_offset_x: f64,
}

impl SceneMetrics {
    /// Build metrics from explicit values, rejecting anything the
    /// coordinate conversions cannot work with.
    pub fn new(
        width: f64,
        height: f64,
        view_window: ViewWindow,
        margin_offset_x: f64,
    ) -> WarpResult<Self> {
        let finite = [
            width,
            height,
            view_window.min_x,
            view_window.min_y,
            view_window.width,
            view_window.height,
            margin_offset_x,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(WarpError::metrics("non-finite scene metric"));
        }
        if width < 0.0 || height < 0.0 {
            return Err(WarpError::metrics(format!(
                "negative display size {width}x{height}"
            )));
        }
        if view_window.width <= 0.0 {
            return Err(WarpError::metrics(format!(
                "view window width must be positive, got {}",
                view_window.width
            )));
        }
        Ok(Self {
            width,
            height,
            view_window,
            margin_offset_x,
        })
    }

    /// Read display size, view window and layout offset from a scene.
    pub fn from_scene<S: Scene + ?Sized>(scene: &S) -> WarpResult<Self> {
        let root = scene.root();
        let width = numeric_attribute(scene, root, "width")
            .ok_or_else(|| WarpError::metrics("missing or invalid display width"))?;
        let height = numeric_attribute(scene, root, "height")
            .ok_or_else(|| WarpError::metrics("missing or invalid display height"))?;

        let vw_node = scene
            .view_window_node()
            .ok_or_else(|| WarpError::metrics("no element defines a view window"))?;
        let raw = scene.attribute(vw_node, "viewBox").unwrap_or_default();
        let [min_x, min_y, vw, vh] = parse_view_box(&raw)
            .ok_or_else(|| WarpError::metrics(format!("invalid view window '{raw}'")))?;

        let group = scene
            .layout_group()
            .ok_or_else(|| WarpError::metrics("no top-level layout group"))?;
        let margin_offset_x = scene
            .transforms(group)
            .first()
            .map(|t| t.to_affine().as_coeffs()[4])
            .ok_or_else(|| WarpError::metrics("layout group has no translation"))?;

        let metrics = Self::new(
            width,
            height,
            ViewWindow {
                min_x,
                min_y,
                width: vw,
                height: vh,
            },
            margin_offset_x,
        )?;
        tracing::debug!(
            width = metrics.width,
            height = metrics.height,
            view_window_width = metrics.view_window.width,
            margin_offset_x = metrics.margin_offset_x,
            "scene metrics"
        );
        Ok(metrics)
    }

    /// Length of the displacement array for the chosen domain.
    pub fn warp_len(&self, domain: WarpDomain) -> usize {
        let extent = match domain {
            WarpDomain::DisplayWidth => self.width,
            WarpDomain::ViewWindow => self.view_window.width,
        };
        extent.max(0.0).trunc() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::SvgScene;

    fn window(width: f64) -> ViewWindow {
        ViewWindow {
            min_x: 0.0,
            min_y: 0.0,
            width,
            height: 100.0,
        }
    }

    #[test]
    fn reads_metrics_from_svg() {
        let svg = r#"<svg width="2100px" height="2970.5px">
            <svg viewBox="0 0 21000 29700"><g class="page-margin" transform="translate(500, 400)"/></svg>
        </svg>"#;
        let scene = SvgScene::parse(svg).unwrap();
        let m = SceneMetrics::from_scene(&scene).unwrap();
        assert_eq!(m.width, 2100.0);
        assert_eq!(m.height, 2970.5);
        assert_eq!(m.view_window, ViewWindow { min_x: 0.0, min_y: 0.0, width: 21000.0, height: 29700.0 });
        assert_eq!(m.margin_offset_x, 500.0);
        assert_eq!(m.warp_len(WarpDomain::DisplayWidth), 2100);
        assert_eq!(m.warp_len(WarpDomain::ViewWindow), 21000);
    }

    #[test]
    fn glyph_symbols_do_not_define_the_view_window() {
        let svg = r#"<svg width="2100px" height="400px">
            <defs><symbol id="E0A4" viewBox="0 0 1000 1000"><path d="M0 0 L10 10"/></symbol></defs>
            <svg class="definition-scale" viewBox="0 0 21000 4000">
                <g class="page-margin" transform="translate(500, 400)"/>
            </svg>
        </svg>"#;
        let scene = SvgScene::parse(svg).unwrap();
        let m = SceneMetrics::from_scene(&scene).unwrap();
        assert_eq!(m.view_window.width, 21000.0);
        assert_eq!(m.view_window.height, 4000.0);
        assert_eq!(m.warp_len(WarpDomain::ViewWindow), 21000);
    }

    #[test]
    fn missing_pieces_are_fatal() {
        let cases = [
            r#"<svg height="10" viewBox="0 0 10 10"><g class="page-margin" transform="translate(1)"/></svg>"#,
            r#"<svg width="auto" height="10" viewBox="0 0 10 10"><g class="page-margin" transform="translate(1)"/></svg>"#,
            r#"<svg width="10" height="10"><g class="page-margin" transform="translate(1)"/></svg>"#,
            r#"<svg width="10" height="10" viewBox="0 0 10"><g class="page-margin" transform="translate(1)"/></svg>"#,
            r#"<svg width="10" height="10" viewBox="0 0 10 10"><g/></svg>"#,
            r#"<svg width="10" height="10" viewBox="0 0 10 10"><g class="page-margin"/></svg>"#,
        ];
        for svg in cases {
            let scene = SvgScene::parse(svg).unwrap();
            assert!(
                matches!(SceneMetrics::from_scene(&scene), Err(WarpError::Metrics(_))),
                "expected metrics error for {svg}"
            );
        }
    }

    #[test]
    fn rejects_degenerate_view_window() {
        assert!(SceneMetrics::new(10.0, 10.0, window(0.0), 0.0).is_err());
        assert!(SceneMetrics::new(f64::NAN, 10.0, window(10.0), 0.0).is_err());
        assert!(SceneMetrics::new(10.0, 10.0, window(10.0), 0.0).is_ok());
    }
}

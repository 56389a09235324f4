//! Warp options.

use serde::{Deserialize, Serialize};

/// Default distance (local units) within which a stem counts as a beam end.
pub const DEFAULT_BEAM_STEM_TOLERANCE: f64 = 12.0;

/// Which horizontal size sets the length of the displacement array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarpDomain {
    /// One entry per display pixel of the declared scene width.
    #[default]
    DisplayWidth,
    /// One entry per local unit of the view window width.
    ViewWindow,
}

/// Tunables for a warp. Every field has a default, so a partial JSON
/// object (or `{}`) deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpOptions {
    pub beam_stem_tolerance: f64,
    pub domain: WarpDomain,
    /// Run the individual-note pass after every warp.
    pub fine_pass: bool,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            beam_stem_tolerance: DEFAULT_BEAM_STEM_TOLERANCE,
            domain: WarpDomain::DisplayWidth,
            fine_pass: false,
        }
    }
}

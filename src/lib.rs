//! scorewarp: retimes an engraved score so each note sits where a
//! performance actually played it.
//!
//! Given an engraved SVG score and a list of alignment records (observed
//! onset times per note or chord), the warper builds a per-pixel horizontal
//! displacement curve and applies it to every note, rest, beam, slur, line
//! and mark in the scene.
//!
//! # Example
//! ```no_run
//! use scorewarp::{warp_svg_str, WarpOptions};
//!
//! let svg = std::fs::read_to_string("path/to/score.svg").unwrap();
//! let maps = std::fs::read_to_string("path/to/maps.json").unwrap();
//! let (scene, report) = warp_svg_str(&svg, &maps, WarpOptions::default()).unwrap();
//! println!("Elements: {}", scene.len());
//! println!("Matched span: {:?}", report.time_bounds);
//! ```

pub mod alignment;
pub mod config;
pub mod coords;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod model;
pub mod report;
pub mod scene;
pub mod svg;
pub mod warp;
pub mod warper;

pub use alignment::AlignmentIndex;
pub use config::{WarpDomain, WarpOptions};
pub use coords::Span;
pub use engine::ApplyStats;
pub use error::{WarpError, WarpResult};
pub use metrics::{SceneMetrics, ViewWindow};
pub use model::*;
pub use report::{generate_report, report_to_json, WarpReport};
pub use scene::Scene;
pub use svg::{NodeId, SvgScene};
pub use warp::WarpFunction;
pub use warper::ScoreWarper;

/// Decode alignment records from a JSON array.
///
/// Both this crate's field names (`ids`, `observed_onset_seconds`) and the
/// alignment tool's (`xml_id`, `obs_mean_onset`) are accepted.
pub fn parse_alignment_json(json: &str) -> WarpResult<Vec<AlignmentRecord>> {
    serde_json::from_str(json).map_err(|e| WarpError::alignment(format!("invalid alignment JSON: {e}")))
}

/// Load SVG text, warp it to the alignment in `alignment_json`, and return
/// the warped scene with a report of the warp.
pub fn warp_svg_str(
    svg: &str,
    alignment_json: &str,
    options: WarpOptions,
) -> WarpResult<(SvgScene, WarpReport)> {
    let mut scene = SvgScene::parse(svg)?;
    let records = parse_alignment_json(alignment_json)?;
    let mut warper = ScoreWarper::with_options(&scene, options)?;
    let stats = warper.warp_to(&mut scene, records)?;

    let mut report = generate_report(&warper);
    report.stats = Some(stats);
    Ok((scene, report))
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI for iOS (static library) and other native hosts
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Warp an SVG score to alignment JSON and return the warp report as a
/// JSON C string. The caller must free the returned string with
/// `scorewarp_free_string`. Returns null on any error.
///
/// # Safety
/// `svg` and `alignment` must be valid null-terminated UTF-8 C strings.
#[no_mangle]
pub unsafe extern "C" fn scorewarp_report_json(
    svg: *const c_char,
    alignment: *const c_char,
) -> *mut c_char {
    if svg.is_null() || alignment.is_null() {
        return std::ptr::null_mut();
    }
    let (svg_str, alignment_str) = match (
        unsafe { CStr::from_ptr(svg) }.to_str(),
        unsafe { CStr::from_ptr(alignment) }.to_str(),
    ) {
        (Ok(s), Ok(a)) => (s, a),
        _ => return std::ptr::null_mut(),
    };

    match warp_svg_str(svg_str, alignment_str, WarpOptions::default()) {
        Ok((_, report)) => CString::new(report_to_json(&report))
            .unwrap_or_default()
            .into_raw(),
        Err(e) => {
            tracing::error!(event = "fatal", error = %e, "warp failed");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by scorewarp functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a scorewarp function, or null.
#[no_mangle]
pub unsafe extern "C" fn scorewarp_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

//! Report tests: the one-call entry point, alignment JSON decoding and
//! the C string surface.

use std::ffi::{CStr, CString};

use pretty_assertions::assert_eq;
use scorewarp::{
    parse_alignment_json, report_to_json, scorewarp_free_string, scorewarp_report_json,
    warp_svg_str, Span, WarpError, WarpOptions,
};
use serde_json::{json, Value};

const SCORE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100px" height="20px">
  <svg class="definition-scale" viewBox="0 0 100 20">
    <g class="page-margin" transform="translate(0, 0)">
      <g class="staff"><g class="layer">
        <g id="n1" class="note"><g class="notehead"><rect x="9" y="8" width="2" height="2"/></g></g>
        <g id="n2" class="note"><g class="notehead"><rect x="29" y="8" width="2" height="2"/></g></g>
        <g id="n3" class="note"><g class="notehead"><rect x="49" y="8" width="2" height="2"/></g></g>
        <g id="n4" class="note"><g class="notehead"><rect x="69" y="8" width="2" height="2"/></g></g>
      </g></g>
    </g>
  </svg>
</svg>"##;

/// n0 does not exist and is unmatched; n4 is a synthetic trailer.
const MAPS: &str = r#"[
  {"xml_id": ["n0"], "obs_mean_onset": -1},
  {"xml_id": ["n1"], "obs_mean_onset": 0.0},
  {"xml_id": ["n2"], "obs_mean_onset": 0.75},
  {"xml_id": ["n3"], "obs_mean_onset": 1.0},
  {"xml_id": ["n4"], "obs_mean_onset": 1.5, "is_trailing_synthetic": true}
]"#;

#[test]
fn alignment_json_accepts_both_field_spellings() {
    let legacy = parse_alignment_json(MAPS).unwrap();
    assert_eq!(legacy.len(), 5);
    assert_eq!(legacy[2].ids, vec!["n2".to_string()]);
    assert_eq!(legacy[2].observed_onset_seconds, 0.75);
    assert!(!legacy[0].has_onset());
    assert!(legacy[4].is_trailing_synthetic);

    let current = parse_alignment_json(
        r#"[{"ids": ["a", "b"], "observed_onset_seconds": 2.5}]"#,
    )
    .unwrap();
    assert_eq!(current[0].ids, vec!["a".to_string(), "b".to_string()]);
    assert!(!current[0].is_trailing_synthetic);
}

#[test]
fn malformed_alignment_json_is_an_alignment_error() {
    assert!(matches!(
        parse_alignment_json("{not json"),
        Err(WarpError::Alignment(_))
    ));
    assert!(matches!(
        parse_alignment_json(r#"[{"ids": ["a"]}]"#),
        Err(WarpError::Alignment(_))
    ));
}

#[test]
fn warp_svg_str_reports_matched_span() {
    let (scene, report) = warp_svg_str(SCORE, MAPS, WarpOptions::default()).unwrap();
    assert!(!scene.is_empty());

    assert_eq!(report.first_valid_index, Some(1));
    assert_eq!(report.last_valid_index, Some(3));
    assert_eq!(report.time_bounds, Some(Span::new(0.0, 1.0)));
    assert_eq!(report.local_bounds, Some(Span::new(10.0, 50.0)));
    assert_eq!(report.screen_bounds, Some(Span::new(10.0, 50.0)));
    assert_eq!(report.note_positions, vec![10.0, 30.0, 50.0]);
    assert_eq!(report.note_screen_positions, vec![10.0, 30.0, 50.0]);
    assert_eq!(report.onset_positions, vec![10.0, 40.0, 50.0]);
    assert_eq!(report.warp_function.len(), 100);
    assert_eq!(report.stats.map(|s| s.groups), Some(4));
}

#[test]
fn report_json_has_every_section() {
    let (_, report) = warp_svg_str(SCORE, MAPS, WarpOptions::default()).unwrap();
    let value: Value = serde_json::from_str(&report_to_json(&report)).unwrap();

    assert_eq!(value["metrics"]["width"], json!(100.0));
    assert_eq!(value["metrics"]["view_window"]["width"], json!(100.0));
    assert_eq!(value["time_bounds"], json!({"start": 0.0, "end": 1.0}));
    assert_eq!(value["onset_positions"], json!([10.0, 40.0, 50.0]));
    assert_eq!(value["warp_function"].as_array().map(Vec::len), Some(100));
    assert_eq!(value["stats"]["groups"], json!(4));
}

#[test]
fn view_window_domain_sizes_warp_by_local_width() {
    let svg = SCORE.replace(r#"width="100px""#, r#"width="50px""#);
    let options = WarpOptions {
        domain: scorewarp::WarpDomain::ViewWindow,
        ..WarpOptions::default()
    };
    let (_, report) = warp_svg_str(&svg, MAPS, options).unwrap();
    assert_eq!(report.warp_function.len(), 100);
    // Display positions scale by 50 / 100.
    assert_eq!(report.screen_bounds, Some(Span::new(5.0, 25.0)));
}

#[test]
fn ffi_round_trip() {
    let svg = CString::new(SCORE).unwrap();
    let maps = CString::new(MAPS).unwrap();

    let ptr = unsafe { scorewarp_report_json(svg.as_ptr(), maps.as_ptr()) };
    assert!(!ptr.is_null());
    let json = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
    unsafe { scorewarp_free_string(ptr) };

    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["note_positions"], json!([10.0, 30.0, 50.0]));
}

#[test]
fn ffi_returns_null_on_failure() {
    let bad = CString::new("<html/>").unwrap();
    let maps = CString::new(MAPS).unwrap();
    let ptr = unsafe { scorewarp_report_json(bad.as_ptr(), maps.as_ptr()) };
    assert!(ptr.is_null());

    let null = unsafe { scorewarp_report_json(std::ptr::null(), maps.as_ptr()) };
    assert!(null.is_null());
    unsafe { scorewarp_free_string(std::ptr::null_mut()) };
}

//! Coordinate extraction from map-service URLs.
//!
//! Map permalinks embed coordinates in several formats. The patterns below
//! are tried in a fixed priority order and the first match wins. Every
//! format writes latitude before longitude; the returned pair is
//! `(longitude, latitude)` per GeoJSON convention, so the capture order is
//! inverted on the way out.

use once_cell::sync::Lazy;
use regex::Regex;

// Ordered pattern table. The `!8m2!3d` form is a superset of the plain
// `!3d...!4d` form and must stay behind it.
static COORDINATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // /@44.8142752,20.4588704,17z/ permalink path segment
        Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").unwrap(),
        // ?q=44.81,20.45 query parameter
        Regex::new(r"[?&]q=(-?\d+\.\d+),(-?\d+\.\d+)").unwrap(),
        // !3d44.81...!4d20.45 encoded parameters, possibly non-adjacent
        Regex::new(r"!3d(-?\d+\.\d+).*!4d(-?\d+\.\d+)").unwrap(),
        // /44.81,20.45 trailing path segment (followed by , / or end)
        Regex::new(r"/(-?\d+\.\d+),(-?\d+\.\d+)(?:[,/]|$)").unwrap(),
        // !8m2!3d44.81!4d20.45 adjacent encoded parameters
        Regex::new(r"!8m2!3d(-?\d+\.\d+)!4d(-?\d+\.\d+)").unwrap(),
    ]
});

/// Extracts `(longitude, latitude)` from a map-service URL.
///
/// Absence of a match is a normal outcome, not an error: the input does
/// not have to be a valid URL, and nothing is ever guessed. Deterministic,
/// no I/O.
pub fn extract_coordinates(url: &str) -> Option<(f64, f64)> {
    for pattern in COORDINATE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(url) {
            let lat = caps[1].parse::<f64>();
            let lng = caps[2].parse::<f64>();
            if let (Ok(lat), Ok(lng)) = (lat, lng) {
                return Some((lng, lat));
            }
        }
    }
    None
}

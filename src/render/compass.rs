//! Degree labels along the top and left edges of the map

use crate::colors::Role;
use crate::config::Geometry;
use crate::layout::Layout;
use crate::projection::project;
use crate::terminal::Frame;

/// Longest longitude label is five cells (" 150E"), centred on its tick
const MAX_LABEL_HALF: i32 = 2;

/// Longitude label: degrees plus hemisphere, padded to an odd width
pub fn lon_label(marker: i32) -> String {
    let deg = marker.unsigned_abs();
    match marker {
        0 => "000".to_string(),
        -180 | 180 => "180".to_string(),
        m if m < 0 => {
            let mut label = format!("{deg}W");
            if label.len() % 2 == 0 {
                label.push(' ');
            }
            label
        }
        _ => {
            let label = format!("{deg}E");
            if label.len() % 2 == 0 {
                format!(" {label}")
            } else {
                label
            }
        }
    }
}

/// Latitude label: degrees plus hemisphere
pub fn lat_label(marker: i32) -> String {
    let deg = marker.unsigned_abs();
    match marker {
        0 => "000".to_string(),
        m if m < 0 => format!("{deg}S"),
        _ => format!("{deg}N"),
    }
}

/// Draw both rulers for the given layout
pub fn render_compass(frame: &mut Frame, layout: &Layout, geo: &Geometry) {
    let (canvas_w, canvas_h) = (geo.canvas_width(), geo.canvas_height());

    let mut top = frame.region(layout.compass_top);
    let strip_w = top.width() as i32;
    let map_col = layout.map.left as i32 - layout.compass_top.left as i32;

    for &marker in &geo.lon_markers {
        let tick = map_col + project(0.0, marker as f64, canvas_w, canvas_h).0 as i32;
        // Markers ascend, so nothing further right can reach the strip
        if tick - MAX_LABEL_HALF >= strip_w {
            break;
        }
        let label = lon_label(marker);
        let start = tick - (label.len() / 2) as i32;
        top.put_str(start, 0, &label, Role::Neutral);
    }

    let mut left = frame.region(layout.compass_left);
    for &marker in &geo.lat_markers {
        let row = project(marker as f64, 0.0, canvas_w, canvas_h).1 as i32;
        if row >= layout.map.height as i32 {
            break;
        }
        left.put_str(0, row, &lat_label(marker), Role::Neutral);
    }
}

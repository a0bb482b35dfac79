//! Equirectangular projection of geographic coordinates onto the map canvas

/// Map (latitude, longitude) in degrees to a (column, row) cell of a
/// `width` x `height` canvas, north at the top.
///
/// Out-of-domain input is clamped to the canvas edge. Halves round away from
/// zero; both offsets are non-negative so this is round-half-up.
pub fn project(lat: f64, lon: f64, width: u16, height: u16) -> (u16, u16) {
    let dx = clamp_offset(lon + 180.0, 360.0);
    let dy = clamp_offset(90.0 - lat, 180.0);

    let max_x = width.saturating_sub(1) as f64;
    let max_y = height.saturating_sub(1) as f64;

    let x = (dx * max_x / 360.0).round();
    let y = (dy * max_y / 180.0).round();

    (x as u16, y as u16)
}

fn clamp_offset(value: f64, span: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, span)
}

//! Screen layout: where the map, compass gutters and route panel go

use crate::config::MapperConfig;

/// A rectangle of screen cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub top: u16,
    pub left: u16,
    pub height: u16,
    pub width: u16,
}

impl Rect {
    pub fn new(top: u16, left: u16, height: u16, width: u16) -> Self {
        Self { top, left, height, width }
    }
}

#[cfg(test)]
impl Rect {
    pub fn bottom(&self) -> u32 {
        self.top as u32 + self.height as u32
    }

    pub fn right(&self) -> u32 {
        self.left as u32 + self.width as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (self.left as u32) < other.right()
            && (other.left as u32) < self.right()
            && (self.top as u32) < other.bottom()
            && (other.top as u32) < self.bottom()
    }
}

/// Map position adjustable at runtime; owned by the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offsets {
    pub top: u16,
    pub left: u16,
}

impl Offsets {
    pub fn from_config(config: &MapperConfig) -> Self {
        Self {
            top: config.offset_top,
            left: config.offset_left,
        }
    }
}

/// Regions assigned to each renderer for one terminal size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub map: Rect,
    pub compass_top: Rect,
    pub compass_left: Rect,
    pub panel: Option<Rect>,
}

/// Lay out the dashboard for a `width` x `height` terminal.
///
/// Returns `None` when the map would have no rows or columns; nothing should
/// be drawn for that frame.
pub fn compute_layout(
    width: u16,
    height: u16,
    config: &MapperConfig,
    offsets: Offsets,
) -> Option<Layout> {
    let geo = &config.geometry;
    let width = width as i32;
    let height = height as i32;

    let map_top = offsets.top as i32 + geo.compass_top_height as i32;
    let map_left = offsets.left as i32 + geo.compass_left_width as i32;

    let canvas_h = geo.canvas_height() as i32;
    let canvas_w = geo.canvas_width() as i32;
    let panel_min = geo.min_panel_rows() as i32;

    let map_w = canvas_w.min(width - map_left);
    let rows_below_compass = height - map_top;

    let (map_h, panel) = if rows_below_compass > panel_min {
        // Directly under the map, or pinned to the bottom when that leaves
        // too little room; the higher top gives the larger panel.
        let panel_top = (map_top + canvas_h).min(height - panel_min);
        let panel = (panel_top, height - panel_top);
        (panel_top - map_top, Some(panel))
    } else {
        (canvas_h.min(rows_below_compass), None)
    };

    if map_w <= 0 || map_h <= 0 {
        return None;
    }

    let map = Rect::new(map_top as u16, map_left as u16, map_h as u16, map_w as u16);
    let panel = panel.map(|(top, h)| Rect::new(top as u16, map.left, h as u16, map.width));

    let compass_top = Rect::new(
        offsets.top,
        offsets.left,
        geo.compass_top_height,
        (width - offsets.left as i32).max(0) as u16,
    );
    let compass_left = Rect::new(
        map.top,
        offsets.left,
        map.height,
        geo.compass_left_width,
    );

    Some(Layout {
        map,
        compass_top,
        compass_left,
        panel,
    })
}

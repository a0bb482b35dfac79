//! Renderers for the map, compass ruler and route panel
//!
//! Each renderer draws into a `Region` handed out for its rectangle, so no
//! renderer can write outside the space the layout engine assigned it.

pub mod compass;
pub mod map;
pub mod panel;

use crate::config::{BorderStyle, MapperConfig};
use crate::layout::Layout;
use crate::snapshot::Snapshot;
use crate::terminal::{Frame, Region};

/// Box drawing characters for one border style
pub struct Glyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
    pub tee_down: char,   // on the top edge
    pub tee_up: char,     // on the bottom edge
    pub tee_right: char,  // on the left edge
    pub tee_left: char,   // on the right edge
}

pub const SINGLE: Glyphs = Glyphs {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
    tee_down: '┬',
    tee_up: '┴',
    tee_right: '├',
    tee_left: '┤',
};

pub const DOUBLE: Glyphs = Glyphs {
    top_left: '╔',
    top_right: '╗',
    bottom_left: '╚',
    bottom_right: '╝',
    horizontal: '═',
    vertical: '║',
    tee_down: '╦',
    tee_up: '╩',
    tee_right: '╠',
    tee_left: '╣',
};

impl BorderStyle {
    pub fn glyphs(self) -> &'static Glyphs {
        match self {
            BorderStyle::Single => &SINGLE,
            BorderStyle::Double => &DOUBLE,
        }
    }
}

/// Draw a one-cell border around the whole region
pub fn draw_border(region: &mut Region<'_>, glyphs: &Glyphs) {
    let w = region.width() as i32;
    let h = region.height() as i32;
    if w == 0 || h == 0 {
        return;
    }

    for x in 1..(w - 1) {
        region.put_plain(x, 0, glyphs.horizontal);
        region.put_plain(x, h - 1, glyphs.horizontal);
    }
    for y in 1..(h - 1) {
        region.put_plain(0, y, glyphs.vertical);
        region.put_plain(w - 1, y, glyphs.vertical);
    }

    region.put_plain(0, 0, glyphs.top_left);
    region.put_plain(w - 1, 0, glyphs.top_right);
    region.put_plain(0, h - 1, glyphs.bottom_left);
    region.put_plain(w - 1, h - 1, glyphs.bottom_right);
}

/// Compose a full frame; an absent layout leaves the frame blank
pub fn compose(
    width: u16,
    height: u16,
    layout: Option<&Layout>,
    config: &MapperConfig,
    snapshot: &Snapshot,
) -> Frame {
    let mut frame = Frame::new(width, height);
    let Some(layout) = layout else {
        return frame;
    };

    compass::render_compass(&mut frame, layout, &config.geometry);
    map::render_map(&mut frame.region(layout.map), config, snapshot);
    if let Some(panel) = layout.panel {
        panel::render_panel(&mut frame.region(panel), config, &snapshot.routes);
    }

    frame
}

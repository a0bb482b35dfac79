//! World map: border, compass ticks, map art and markers

use super::draw_border;
use crate::config::{CornerTickPolicy, MapperConfig};
use crate::projection::project;
use crate::snapshot::{PointKind, Snapshot};
use crate::colors::Role;
use crate::terminal::Region;

/// Glyph drawn for every marker
pub const MARKER: char = 'x';

/// Equirectangular world outline, one string per map row
pub const MAP_ART: [&str; 23] = [
    r#"           . _..::__:  ,-"-"._       |7       ,     _,.__             "#,
    r#"   _.___ _ _<_>`!(._`.`-.    /        _._     `_ ,_/  '  '-._.---.-.__"#,
    r#" .{     " " `-==,',._\{  \  / {)     / _ ">_,-' `                mt-2_"#,
    r#"  \_.:--.       `._ )`^-. "'      , [_/(                       __,/-' "#,
    r#" '"'     \         "    _L       oD_,--'                )     /. (|   "#,
    r#"          |           ,'         _)_.\._<> 6              _,' /  '   "#,
    r#"          `.         /          [_/_'` `"(                <'}  )      "#,
    r#"           \    .-. )          /   `-'"..' `:._          _)  '       "#,
    r#"    `        \  (  `(          /         `:\  > \  ,-^.  /' '         "#,
    r#"              `._,   ""        |           \`'   \|   ?_)  {\         "#,
    r#"                 `=.---.       `._._       ,'     "`  |' ,- '.        "#,
    r#"                   |    `-._        |     /          `:`<_|h--._      "#,
    r#"                   (        >       .     | ,          `=.__.`-'\     "#,
    r#"                    `.     /        |     |{|              ,-.,\     ."#,
    r#"                     |   ,'          \   / `'            ,"     \     "#,
    r#"                     |  /             |_'                |  __  /     "#,
    r#"                     | |                                 '-'  `-'   \."#,
    r#"                     |/                                        "    / "#,
    r#"                     \.                                            '  "#,
    r#"                                                                      "#,
    r#"                      ,/           ______._.--._ _..---.---------._   "#,
    r#"     ,-----"-..?----_/ )      _,-'"             "                  (   "#,
    r#" .._(                  `-----'                                      `- "#,
];

/// Draw the map into its region; the region may be smaller than the canvas
pub fn render_map(region: &mut Region<'_>, config: &MapperConfig, snapshot: &Snapshot) {
    let geo = &config.geometry;
    let border = geo.border as i32;
    let w = region.width() as i32;
    let h = region.height() as i32;
    let (canvas_w, canvas_h) = (geo.canvas_width(), geo.canvas_height());

    if border > 0 {
        let glyphs = config.border_style.glyphs();
        draw_border(region, glyphs);

        let skip_corners = config.corner_ticks == CornerTickPolicy::Skip;

        for &marker in &geo.lon_markers {
            let x = project(0.0, marker as f64, canvas_w, canvas_h).0 as i32;
            if x >= w - border {
                break;
            }
            if skip_corners && (x == 0 || x == w - 1) {
                continue;
            }
            region.put_plain(x, 0, glyphs.tee_down);
            region.put_plain(x, h - 1, glyphs.tee_up);
        }

        for &marker in &geo.lat_markers {
            let y = project(marker as f64, 0.0, canvas_w, canvas_h).1 as i32;
            if y >= h - border {
                break;
            }
            if skip_corners && (y == 0 || y == h - 1) {
                continue;
            }
            region.put_plain(0, y, glyphs.tee_right);
            region.put_plain(w - 1, y, glyphs.tee_left);
        }
    }

    let inner_w = (w - 2 * border).max(0) as usize;
    let inner_h = (h - 2 * border).max(0) as usize;
    for (y, line) in MAP_ART.iter().take(inner_h).enumerate() {
        for (x, ch) in line.chars().take(inner_w).enumerate() {
            region.put(x as i32 + border, y as i32 + border, ch, Role::Ok);
        }
    }

    for point in &snapshot.points {
        let (x, y) = project(point.lat, point.lon, canvas_w, canvas_h);
        let (x, y) = (x as i32, y as i32);
        if x < border || y < border || x >= w - border || y >= h - border {
            continue;
        }
        match point.kind {
            PointKind::SelfPoint => region.put_bold(x, y, MARKER, config.roles.self_point),
            PointKind::Inbound => region.put(x, y, MARKER, config.roles.inbound),
            PointKind::Route => region.put(x, y, MARKER, config.roles.route),
        }
    }
}

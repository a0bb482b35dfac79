//! Route status list under the map

use super::draw_border;
use crate::colors::Role;
use crate::config::MapperConfig;
use crate::snapshot::RouteStatus;
use crate::terminal::Region;

pub const DOWN: &str = "DOWN";

/// Columns between the route id and its address
const ID_GAP: i32 = 2;

/// One row per route: id, address or DOWN, and the locale pushed right
pub fn render_panel(region: &mut Region<'_>, config: &MapperConfig, routes: &[RouteStatus]) {
    let border = config.geometry.border as i32;
    let h = region.height() as i32;
    let right = region.width() as i32 - border;

    if border > 0 {
        draw_border(region, config.border_style.glyphs());
    }

    for (y, route) in (border..).zip(routes) {
        if y >= h - border {
            break;
        }

        let id = route.id.to_string();
        let id_x = border;
        put_clipped(region, id_x, y, &id, Role::Neutral, right);

        let addr_x = id_x + id.chars().count() as i32 + ID_GAP;
        let Some(address) = route.address.as_deref() else {
            put_clipped(region, addr_x, y, DOWN, Role::Error, right);
            continue;
        };
        put_clipped(region, addr_x, y, address, Role::Ok, right);

        if let Some(locale) = route.locale.as_deref() {
            let after_addr = addr_x + address.chars().count() as i32 + 1;
            let locale_x = after_addr.max(right - locale.chars().count() as i32);
            put_clipped(region, locale_x, y, locale, Role::Warn, right);
        }
    }
}

fn put_clipped(region: &mut Region<'_>, x: i32, y: i32, s: &str, role: Role, limit: i32) {
    for (i, ch) in s.chars().enumerate() {
        let col = x + i as i32;
        if col >= limit {
            break;
        }
        region.put(col, y, ch, role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Rect;
    use crate::snapshot::Place;
    use crate::terminal::Frame;

    fn mountain_view() -> RouteStatus {
        let place = Place {
            city: Some("Mountain View".into()),
            region: None,
            country: Some("US".into()),
        };
        RouteStatus::up(0, "8.8.8.8".into(), &place)
    }

    fn draw(width: u16, height: u16, routes: &[RouteStatus]) -> Frame {
        let config = MapperConfig::default();
        let mut frame = Frame::new(width, height);
        render_panel(&mut frame.region(Rect::new(0, 0, height, width)), &config, routes);
        frame
    }

    #[test]
    fn up_route_right_aligns_locale() {
        let frame = draw(40, 7, &[mountain_view()]);
        assert_eq!(
            frame.row_text(1),
            format!("│0  8.8.8.8{}Mountain View, US│", " ".repeat(11))
        );
        assert_eq!(frame.get(1, 1).unwrap().role, Some(Role::Neutral));
        assert_eq!(frame.get(4, 1).unwrap().role, Some(Role::Ok));
        assert_eq!(frame.get(22, 1).unwrap().role, Some(Role::Warn));
    }

    #[test]
    fn down_route_shows_sentinel_without_locale() {
        let frame = draw(40, 7, &[RouteStatus::down(0)]);
        assert_eq!(frame.row_text(1), format!("│0  DOWN{}│", " ".repeat(31)));
        assert_eq!(frame.get(4, 1).unwrap().role, Some(Role::Error));
    }

    #[test]
    fn colliding_locale_starts_after_address_and_is_cut() {
        let frame = draw(20, 7, &[mountain_view()]);
        assert_eq!(frame.row_text(1), "│0  8.8.8.8 Mountai│");
    }

    #[test]
    fn narrow_panel_truncates_address() {
        let frame = draw(8, 7, &[mountain_view()]);
        assert_eq!(frame.row_text(1), "│0  8.8│");
    }

    #[test]
    fn rows_stop_at_bottom_border() {
        let routes: Vec<_> = (0..4).map(RouteStatus::down).collect();
        let frame = draw(20, 4, &routes);
        assert!(frame.row_text(1).contains("0  DOWN"));
        assert!(frame.row_text(2).contains("1  DOWN"));
        assert!(frame.row_text(3).starts_with('└'));
    }

    #[test]
    fn rows_follow_route_order() {
        let routes = vec![RouteStatus::down(3), mountain_view(), RouteStatus::down(1)];
        let frame = draw(40, 7, &routes);
        assert!(frame.row_text(1).starts_with("│3  DOWN"));
        assert!(frame.row_text(2).starts_with("│0  8.8.8.8"));
        assert!(frame.row_text(3).starts_with("│1  DOWN"));
    }
}

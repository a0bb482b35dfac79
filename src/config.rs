use crate::colors::Role;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Border glyph family for the map and panel boxes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Single,
    Double,
}

/// Whether compass ticks may land on a border corner
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerTickPolicy {
    #[default]
    Skip,
    Draw,
}

/// Colour role of each kind of map marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoleMap {
    pub self_point: Role,
    pub inbound: Role,
    pub route: Role,
}

impl Default for RoleMap {
    fn default() -> Self {
        Self {
            self_point: Role::Neutral,
            inbound: Role::Warn,
            route: Role::Warn,
        }
    }
}

/// Fixed geometry of the map canvas and the gutters around it
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub map_width: u16,
    pub map_height: u16,
    pub border: u16,
    pub compass_top_height: u16,
    pub compass_left_width: u16,
    pub min_panel_height: u16,
    pub lon_markers: Vec<i32>,  // ascending
    pub lat_markers: Vec<i32>,  // descending
}

impl Geometry {
    /// Canvas the projection targets: map art plus border on both sides
    pub fn canvas_width(&self) -> u16 {
        self.map_width.saturating_add(self.border.saturating_mul(2))
    }

    pub fn canvas_height(&self) -> u16 {
        self.map_height.saturating_add(self.border.saturating_mul(2))
    }

    /// Smallest panel that still shows `min_panel_height` route rows
    pub fn min_panel_rows(&self) -> u16 {
        self.min_panel_height.saturating_add(self.border.saturating_mul(2))
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            map_width: 71,
            map_height: 23,
            border: 1,
            compass_top_height: 1,
            compass_left_width: 3,
            min_panel_height: 5,
            lon_markers: (-180..=180).step_by(30).collect(),
            lat_markers: vec![90, 60, 30, 0, -30, -60, -90],
        }
    }
}

/// Where each route's probe and the bulk lookups go
#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub probe_command: Vec<String>,
    pub probe_timeout: Duration,
    pub geoip_db: Option<PathBuf>,
    pub batch_url: Option<String>,
    pub self_url: Option<String>,
}

/// Placeholder substituted with the route id in `probe_command`
pub const ROUTE_PLACEHOLDER: &str = "{route}";

pub fn default_probe_command() -> Vec<String> {
    let base = [
        "curl",
        "-s",
        "-m",
        "5",
        "http://ip-api.com/json/?fields=query,city,region,countryCode,lat,lon",
    ];
    let mut cmd: Vec<String> = Vec::new();
    // FreeBSD scopes a process to a routing table with setfib(1)
    if cfg!(target_os = "freebsd") {
        cmd.push("setfib".into());
        cmd.push(ROUTE_PLACEHOLDER.into());
    }
    cmd.extend(base.iter().map(|s| s.to_string()));
    cmd
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            probe_command: default_probe_command(),
            probe_timeout: Duration::from_secs(5),
            geoip_db: None,
            batch_url: Some("http://ip-api.com/batch?fields=status,lat,lon,query".into()),
            self_url: None,
        }
    }
}

/// Immutable configuration shared by the layout engine, renderers and scheduler
#[derive(Clone, Debug)]
pub struct MapperConfig {
    pub geometry: Geometry,
    pub border_style: BorderStyle,
    pub corner_ticks: CornerTickPolicy,
    pub roles: RoleMap,
    pub routes: Vec<u32>,
    pub offset_top: u16,
    pub offset_left: u16,
    pub refresh_interval: Duration,
    pub tick: Duration,
    pub sources: SourceConfig,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            border_style: BorderStyle::default(),
            corner_ticks: CornerTickPolicy::default(),
            roles: RoleMap::default(),
            routes: vec![0, 1, 2, 3],
            offset_top: 0,
            offset_left: 1,
            refresh_interval: Duration::from_secs(300),
            tick: Duration::from_millis(250),
            sources: SourceConfig::default(),
        }
    }
}

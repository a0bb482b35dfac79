use crate::config::{
    BorderStyle, CornerTickPolicy, Geometry, MapperConfig, RoleMap, SourceConfig,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Upper bound for gutter and panel sizes; far beyond any real terminal
const MAX_EXTENT: u16 = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk settings, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub map: MapSettings,
    pub routes: RouteSettings,
    pub refresh: RefreshSettings,
    pub geo: GeoSettings,
    pub roles: RoleMap,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub offset_top: Option<u16>,
    pub offset_left: Option<u16>,
    pub border: Option<u16>,
    pub border_style: BorderStyle,
    pub corner_ticks: CornerTickPolicy,
    pub compass_top_height: Option<u16>,
    pub compass_left_width: Option<u16>,
    pub min_panel_height: Option<u16>,
    pub lon_markers: Option<Vec<i32>>,
    pub lat_markers: Option<Vec<i32>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    pub ids: Option<Vec<u32>>,
    pub probe_command: Option<Vec<String>>,
    pub probe_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    pub interval_secs: Option<u64>,
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeoSettings {
    pub geoip_db: Option<PathBuf>,  // Path to GeoLite2-City.mmdb database
    pub batch_url: Option<String>,
    pub self_url: Option<String>,
}

impl Settings {
    /// Load from `path`, or the default location; a missing file yields defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("routemap")
            .join("config.toml")
    }

    /// Validate and freeze into the runtime configuration
    pub fn into_config(self) -> Result<MapperConfig, ConfigError> {
        let defaults = MapperConfig::default();
        let geometry_defaults = Geometry::default();

        let border = self.map.border.unwrap_or(geometry_defaults.border);
        if border > 1 {
            return Err(ConfigError::Invalid(format!(
                "border must be 0 or 1, got {border}"
            )));
        }

        let compass_top_height = self
            .map
            .compass_top_height
            .unwrap_or(geometry_defaults.compass_top_height);
        let compass_left_width = self
            .map
            .compass_left_width
            .unwrap_or(geometry_defaults.compass_left_width);
        let min_panel_height = self
            .map
            .min_panel_height
            .unwrap_or(geometry_defaults.min_panel_height);
        for (name, value) in [
            ("compass_top_height", compass_top_height),
            ("compass_left_width", compass_left_width),
            ("min_panel_height", min_panel_height),
        ] {
            if value > MAX_EXTENT {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be at most {MAX_EXTENT}, got {value}"
                )));
            }
        }

        let mut lon_markers = self.map.lon_markers.unwrap_or(geometry_defaults.lon_markers);
        if let Some(bad) = lon_markers.iter().find(|m| !(-180..=180).contains(*m)) {
            return Err(ConfigError::Invalid(format!(
                "longitude marker {bad} outside [-180, 180]"
            )));
        }
        lon_markers.sort_unstable();
        lon_markers.dedup();

        let mut lat_markers = self.map.lat_markers.unwrap_or(geometry_defaults.lat_markers);
        if let Some(bad) = lat_markers.iter().find(|m| !(-90..=90).contains(*m)) {
            return Err(ConfigError::Invalid(format!(
                "latitude marker {bad} outside [-90, 90]"
            )));
        }
        lat_markers.sort_unstable_by(|a, b| b.cmp(a));
        lat_markers.dedup();

        let routes = self.routes.ids.unwrap_or(defaults.routes);
        if routes.is_empty() {
            return Err(ConfigError::Invalid("at least one route id is required".into()));
        }

        let source_defaults = SourceConfig::default();
        let probe_command = self.routes.probe_command.unwrap_or(source_defaults.probe_command);
        if probe_command.is_empty() {
            return Err(ConfigError::Invalid("probe_command must not be empty".into()));
        }

        let refresh_interval = self
            .refresh
            .interval_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.refresh_interval);
        let tick = self
            .refresh
            .tick_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick);
        if refresh_interval.is_zero() || tick.is_zero() {
            return Err(ConfigError::Invalid(
                "refresh interval and tick must be positive".into(),
            ));
        }

        Ok(MapperConfig {
            geometry: Geometry {
                border,
                compass_top_height,
                compass_left_width,
                min_panel_height,
                lon_markers,
                lat_markers,
                ..geometry_defaults
            },
            border_style: self.map.border_style,
            corner_ticks: self.map.corner_ticks,
            roles: self.roles,
            routes,
            offset_top: self.map.offset_top.unwrap_or(defaults.offset_top),
            offset_left: self.map.offset_left.unwrap_or(defaults.offset_left),
            refresh_interval,
            tick,
            sources: SourceConfig {
                probe_command,
                probe_timeout: self
                    .routes
                    .probe_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(source_defaults.probe_timeout),
                geoip_db: self.geo.geoip_db,
                batch_url: self.geo.batch_url.or(source_defaults.batch_url),
                self_url: self.geo.self_url,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::Role;
    use crate::layout::{compute_layout, Offsets};

    #[test]
    fn empty_file_gives_defaults() {
        let config = Settings::parse("").unwrap().into_config().unwrap();
        assert_eq!(config.routes, vec![0, 1, 2, 3]);
        assert_eq!(config.geometry, Geometry::default());
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert_eq!(config.tick, Duration::from_millis(250));
    }

    #[test]
    fn sections_override_defaults() {
        let toml = r#"
            [map]
            offset_top = 2
            border_style = "double"
            corner_ticks = "draw"
            lon_markers = [90, -90, 0, 0]

            [routes]
            ids = [3, 1]
            probe_command = ["echo", "{route}"]

            [refresh]
            interval_secs = 60

            [roles]
            self_point = "ok"
        "#;
        let config = Settings::parse(toml).unwrap().into_config().unwrap();
        assert_eq!(config.offset_top, 2);
        assert_eq!(config.border_style, BorderStyle::Double);
        assert_eq!(config.corner_ticks, CornerTickPolicy::Draw);
        assert_eq!(config.geometry.lon_markers, vec![-90, 0, 90]);
        assert_eq!(config.routes, vec![3, 1]);
        assert_eq!(config.sources.probe_command, vec!["echo", "{route}"]);
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.roles.self_point, Role::Ok);
        assert_eq!(config.roles.inbound, Role::Warn);
    }

    #[test]
    fn out_of_range_markers_are_rejected() {
        let err = Settings::parse("[map]\nlat_markers = [95]")
            .unwrap()
            .into_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_panel_and_gutters_are_rejected() {
        for toml in [
            "[map]\nmin_panel_height = 65535",
            "[map]\ncompass_top_height = 2000",
            "[map]\ncompass_left_width = 65535",
        ] {
            let err = Settings::parse(toml).unwrap().into_config().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{toml}");
        }

        let config = Settings::parse("[map]\nmin_panel_height = 1024")
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.geometry.min_panel_rows(), 1026);
        let layout = compute_layout(80, 24, &config, Offsets::from_config(&config)).unwrap();
        assert_eq!(layout.panel, None);
    }

    #[test]
    fn thick_border_is_rejected() {
        let err = Settings::parse("[map]\nborder = 2").unwrap().into_config().unwrap_err();
        assert!(err.to_string().contains("border"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(Settings::parse("[map"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("routemap-no-such-config.toml");
        let settings = Settings::load(Some(&path)).unwrap();
        assert!(settings.routes.ids.is_none());
    }
}

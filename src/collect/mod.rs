//! Data collection: route probes, connected peers and their locations
//!
//! Every lookup degrades to `Lookup::Unavailable` instead of failing; the
//! dashboard only ever shows a route as down or a peer as missing.

pub mod geoip;
pub mod peers;
pub mod probe;

use crate::config::SourceConfig;
use crate::snapshot::{GeoPoint, PointKind, RouteStatus, Snapshot};
use std::time::Instant;
use thiserror::Error;

/// Outcome of an external lookup
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Unavailable => None,
        }
    }

    #[cfg(test)]
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Lookup<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Lookup::Found(value),
            Err(e) => {
                tracing::debug!(error = %e, "lookup unavailable");
                Lookup::Unavailable
            }
        }
    }
}

/// Why a lookup came back empty; logged, never shown
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out")]
    Timeout { command: String },

    #[error("{command} exited with {status}")]
    Exit { command: String, status: std::process::ExitStatus },

    #[error("malformed reply: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply has no address")]
    NoAddress,

    #[error("http request failed: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces a complete snapshot for the configured routes
pub trait Collector {
    fn collect(&mut self, routes: &[u32]) -> Snapshot;
}

/// Collector backed by probe commands, the connection table and geolocation
pub struct LiveCollector {
    sources: SourceConfig,
    geo: geoip::GeoLocator,
}

impl LiveCollector {
    pub fn new(sources: SourceConfig) -> Self {
        let geo = geoip::GeoLocator::new(&sources);
        Self { sources, geo }
    }
}

impl Collector for LiveCollector {
    fn collect(&mut self, routes: &[u32]) -> Snapshot {
        let mut points = Vec::new();

        let peers = peers::discover();
        let peer_locations = self.geo.locate(&peers).found().unwrap_or_default();
        points.extend(
            peer_locations
                .into_iter()
                .map(|(lat, lon)| GeoPoint::new(lat, lon, PointKind::Inbound)),
        );

        if let Some((lat, lon)) = self.geo.own_location().found() {
            points.push(GeoPoint::new(lat, lon, PointKind::SelfPoint));
        }

        let mut statuses = Vec::with_capacity(routes.len());
        for &id in routes {
            match probe::probe_route(&self.sources, id) {
                Lookup::Found(host) => {
                    if let Some((lat, lon)) = host.position {
                        points.push(GeoPoint::new(lat, lon, PointKind::Route));
                    }
                    statuses.push(RouteStatus::up(id, host.address, &host.place));
                }
                Lookup::Unavailable => statuses.push(RouteStatus::down(id)),
            }
        }

        let snapshot = Snapshot {
            points,
            routes: statuses,
            fetched_at: Instant::now(),
        };
        tracing::info!(
            routes_up = snapshot.routes_up(),
            routes = snapshot.routes.len(),
            peers = peers.len(),
            points = snapshot.points.len(),
            "snapshot collected"
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use std::time::Duration;

    #[test]
    fn results_convert_to_lookups() {
        let ok: Result<u8, ProbeError> = Ok(3);
        let err: Result<u8, ProbeError> = Err(ProbeError::NoAddress);
        assert_eq!(Lookup::from(ok), Lookup::Found(3));
        assert_eq!(Lookup::from(err), Lookup::Unavailable);
        assert!(!Lookup::<u8>::Unavailable.is_found());
    }

    #[cfg(unix)]
    #[test]
    fn failed_routes_stay_in_the_snapshot_as_down() {
        // Even ids answer, odd ids exit non-zero
        let script = r#"case {route} in
            0|2) echo '{"ip":"192.0.2.{route}","city":"Oslo","country":"NO","lat":59.9,"lon":10.7}' ;;
            *) exit 1 ;;
        esac"#;
        let sources = SourceConfig {
            probe_command: vec!["sh".into(), "-c".into(), script.into()],
            probe_timeout: Duration::from_secs(5),
            geoip_db: None,
            batch_url: None,
            self_url: None,
        };
        let mut collector = LiveCollector::new(sources);
        let snapshot = collector.collect(&[0, 1, 2, 3]);

        let ids: Vec<u32> = snapshot.routes.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(snapshot.routes_up(), 2);
        assert_eq!(snapshot.routes[0].address.as_deref(), Some("192.0.2.0"));
        assert_eq!(snapshot.routes[0].locale.as_deref(), Some("Oslo, NO"));
        assert_eq!(snapshot.routes[1].address, None);
        assert_eq!(
            snapshot.points.iter().filter(|p| p.kind == PointKind::Route).count(),
            2
        );
    }
}

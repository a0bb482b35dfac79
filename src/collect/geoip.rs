//! Address geolocation
//!
//! Peers are located with a local MaxMind GeoLite2 database when one is
//! found, otherwise through an HTTP batch endpoint. Results are cached per
//! address for as long as the peer stays connected.

use super::{Lookup, ProbeError};
use crate::config::SourceConfig;
use maxminddb::{geoip2, Reader};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// ip-api.com rejects batches larger than this
const BATCH_LIMIT: usize = 100;
const HTTP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Deserialize)]
struct BatchEntry {
    status: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Deserialize)]
struct Position {
    #[serde(alias = "latitude")]
    lat: f64,
    #[serde(alias = "longitude")]
    lon: f64,
}

pub struct GeoLocator {
    reader: Option<Reader<Vec<u8>>>,
    batch_url: Option<String>,
    self_url: Option<String>,
    cache: HashMap<IpAddr, Option<(f64, f64)>>,
}

impl GeoLocator {
    pub fn new(sources: &SourceConfig) -> Self {
        let reader = find_database(sources.geoip_db.as_deref()).and_then(|path| {
            match Reader::open_readfile(&path) {
                Ok(reader) => {
                    tracing::info!(path = %path.display(), "geoip database loaded");
                    Some(reader)
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "geoip database unreadable");
                    None
                }
            }
        });

        Self {
            reader,
            batch_url: sources.batch_url.clone(),
            self_url: sources.self_url.clone(),
            cache: HashMap::new(),
        }
    }

    /// Whether a database or a batch endpoint can be asked
    pub fn is_available(&self) -> bool {
        self.reader.is_some() || self.batch_url.is_some()
    }

    /// Positions of the addresses that could be located, in input order
    pub fn locate(&mut self, peers: &[IpAddr]) -> Lookup<Vec<(f64, f64)>> {
        if !self.is_available() {
            return Lookup::Unavailable;
        }

        // Only the current peer set stays cached; departed peers are dropped
        let current: HashSet<IpAddr> = peers.iter().copied().collect();
        self.cache.retain(|ip, _| current.contains(ip));

        let missing: Vec<IpAddr> = peers
            .iter()
            .copied()
            .filter(|ip| !self.cache.contains_key(ip))
            .collect();

        if !missing.is_empty() {
            if let Some(reader) = &self.reader {
                for ip in missing {
                    self.cache.insert(ip, lookup_db(reader, ip));
                }
            } else if let Some(url) = self.batch_url.clone() {
                for chunk in missing.chunks(BATCH_LIMIT) {
                    match fetch_batch(&url, chunk) {
                        Ok(found) => {
                            // Entries come back in request order
                            for (ip, pos) in chunk.iter().zip(found) {
                                self.cache.insert(*ip, pos);
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, count = chunk.len(), "batch geolocation failed");
                            return Lookup::Unavailable;
                        }
                    }
                }
            }
        }

        Lookup::Found(
            peers
                .iter()
                .filter_map(|ip| self.cache.get(ip).copied().flatten())
                .collect(),
        )
    }

    /// This host's own position, when a lookup URL is configured
    pub fn own_location(&self) -> Lookup<(f64, f64)> {
        let Some(url) = &self.self_url else {
            return Lookup::Unavailable;
        };
        fetch_own(url).into()
    }
}

fn find_database(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "configured geoip database not found");
    }

    let candidates = [
        dirs::config_dir().map(|p| p.join("routemap/GeoLite2-City.mmdb")),
        dirs::data_dir().map(|p| p.join("GeoIP/GeoLite2-City.mmdb")),
        Some(PathBuf::from("/usr/share/GeoIP/GeoLite2-City.mmdb")),
        Some(PathBuf::from("/usr/local/share/GeoIP/GeoLite2-City.mmdb")),
        Some(PathBuf::from("/var/lib/GeoIP/GeoLite2-City.mmdb")),
    ];

    candidates.into_iter().flatten().find(|p| p.exists())
}

fn lookup_db(reader: &Reader<Vec<u8>>, ip: IpAddr) -> Option<(f64, f64)> {
    let city: geoip2::City = reader.lookup(ip).ok()?;
    let location = city.location?;
    Some((location.latitude?, location.longitude?))
}

fn fetch_batch(url: &str, chunk: &[IpAddr]) -> Result<Vec<Option<(f64, f64)>>, ProbeError> {
    let body: Vec<String> = chunk.iter().map(|ip| ip.to_string()).collect();
    let response = ureq::post(url)
        .timeout(HTTP_TIMEOUT)
        .send_json(&body)
        .map_err(|e| ProbeError::Http(e.to_string()))?;
    parse_batch(&response.into_string()?)
}

/// One slot per requested address; failed entries are `None`
fn parse_batch(body: &str) -> Result<Vec<Option<(f64, f64)>>, ProbeError> {
    let entries: Vec<BatchEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .map(|e| match e.status.as_deref() {
            Some("fail") => None,
            _ => e.lat.zip(e.lon),
        })
        .collect())
}

fn fetch_own(url: &str) -> Result<(f64, f64), ProbeError> {
    let response = ureq::get(url)
        .timeout(HTTP_TIMEOUT)
        .call()
        .map_err(|e| ProbeError::Http(e.to_string()))?;
    parse_position(&response.into_string()?)
}

fn parse_position(body: &str) -> Result<(f64, f64), ProbeError> {
    let pos: Position = serde_json::from_str(body)?;
    Ok((pos.lat, pos.lon))
}

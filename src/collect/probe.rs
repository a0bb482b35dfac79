//! Per-route reachability probe
//!
//! Runs the configured command with the route id substituted and reads a
//! JSON description of the egress host from its stdout.

use super::{Lookup, ProbeError};
use crate::config::{SourceConfig, ROUTE_PLACEHOLDER};
use crate::snapshot::Place;
use serde::Deserialize;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_STEP: Duration = Duration::from_millis(20);

/// Egress host reported for a route
#[derive(Clone, Debug, PartialEq)]
pub struct HostInfo {
    pub address: String,
    pub place: Place,
    pub position: Option<(f64, f64)>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reply {
    Wrapped {
        #[serde(rename = "Response")]
        response: Vec<WrappedEntry>,
    },
    Flat(FlatReply),
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WrappedEntry {
    address: Option<String>,
    geo_loc: Option<WrappedGeo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WrappedGeo {
    latitude: Option<f64>,
    longitude: Option<f64>,
    country: Option<String>,
    region: Option<String>,
    city: Option<String>,
}

#[derive(Deserialize)]
struct FlatReply {
    #[serde(alias = "query")]
    ip: Option<String>,
    city: Option<String>,
    #[serde(alias = "regionName")]
    region: Option<String>,
    #[serde(alias = "country_code", alias = "countryCode")]
    country: Option<String>,
    #[serde(alias = "lat")]
    latitude: Option<f64>,
    #[serde(alias = "lon")]
    longitude: Option<f64>,
    loc: Option<String>,  // "lat,lon"
}

/// Probe one route; any failure reports the route as down
pub fn probe_route(sources: &SourceConfig, route: u32) -> Lookup<HostInfo> {
    let args = command_for(&sources.probe_command, route);
    let result = run_command(&args, sources.probe_timeout).and_then(|out| parse_reply(&out));
    if let Err(e) = &result {
        tracing::debug!(route, error = %e, "route probe failed");
    }
    result.into()
}

fn command_for(template: &[String], route: u32) -> Vec<String> {
    let id = route.to_string();
    template
        .iter()
        .map(|arg| arg.replace(ROUTE_PLACEHOLDER, &id))
        .collect()
}

/// Run a command and capture stdout, killing it once `timeout` passes
pub fn run_command(args: &[String], timeout: Duration) -> Result<String, ProbeError> {
    let Some((program, rest)) = args.split_first() else {
        return Err(ProbeError::Spawn {
            command: String::new(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    let mut child = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ProbeError::Spawn {
            command: program.clone(),
            source,
        })?;

    // Drain stdout while waiting; a full pipe would block the child forever
    let (tx, rx) = mpsc::channel();
    if let Some(mut stdout) = child.stdout.take() {
        thread::spawn(move || {
            let mut out = String::new();
            let _ = tx.send(stdout.read_to_string(&mut out).map(|_| out));
        });
    }

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProbeError::Timeout {
                command: program.clone(),
            });
        }
        thread::sleep(POLL_STEP);
    };

    if !status.success() {
        return Err(ProbeError::Exit {
            command: program.clone(),
            status,
        });
    }

    // A backgrounded grandchild can keep the pipe open past the exit
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now()).max(POLL_STEP)) {
        Ok(out) => Ok(out?),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ProbeError::Timeout {
            command: program.clone(),
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Ok(String::new()),
    }
}

/// Accepts the wrapped `{"Response":[...]}` form or a flat object
pub fn parse_reply(body: &str) -> Result<HostInfo, ProbeError> {
    let reply: Reply = serde_json::from_str(body)?;

    let (address, place, lat, lon) = match reply {
        Reply::Wrapped { response } => {
            let entry = response.into_iter().next().ok_or(ProbeError::NoAddress)?;
            let geo = entry.geo_loc;
            let (lat, lon) = geo
                .as_ref()
                .map(|g| (g.latitude, g.longitude))
                .unwrap_or_default();
            let place = geo
                .map(|g| Place {
                    city: g.city,
                    region: g.region,
                    country: g.country,
                })
                .unwrap_or_default();
            (entry.address, place, lat, lon)
        }
        Reply::Flat(flat) => {
            let (lat, lon) = match (flat.latitude, flat.longitude) {
                (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
                _ => flat.loc.as_deref().and_then(parse_loc).unzip(),
            };
            let place = Place {
                city: flat.city,
                region: flat.region,
                country: flat.country,
            };
            (flat.ip, place, lat, lon)
        }
    };

    let address = address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .ok_or(ProbeError::NoAddress)?;

    Ok(HostInfo {
        address,
        place,
        position: lat.zip(lon),
    })
}

fn parse_loc(loc: &str) -> Option<(f64, f64)> {
    let (lat, lon) = loc.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

//! Latest known route and peer state, replaced whole on every refresh

use std::time::Instant;

/// What a map marker represents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointKind {
    SelfPoint,  // our own egress location
    Inbound,    // a connected peer
    Route,      // where a route exits to the internet
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub kind: PointKind,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, kind: PointKind) -> Self {
        Self {
            lat: lat.clamp(-90.0, 90.0),
            lon: lon.clamp(-180.0, 180.0),
            kind,
        }
    }
}

/// Place names reported for an address, any of which may be missing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Place {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl Place {
    /// Most specific first: "City Region, Country", falling back to "UNKNOWN"
    pub fn locale(&self) -> String {
        fn known(s: &Option<String>) -> Option<&str> {
            s.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }

        let specific: Vec<&str> = [known(&self.city), known(&self.region)]
            .into_iter()
            .flatten()
            .collect();
        let specific = specific.join(" ");

        match (specific.is_empty(), known(&self.country)) {
            (false, Some(country)) => format!("{specific}, {country}"),
            (true, Some(country)) => country.to_string(),
            (false, None) => specific,
            (true, None) => "UNKNOWN".to_string(),
        }
    }
}

/// Reachability of one configured route
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteStatus {
    pub id: u32,
    pub address: Option<String>,
    pub locale: Option<String>,
}

impl RouteStatus {
    pub fn up(id: u32, address: String, place: &Place) -> Self {
        Self {
            id,
            address: Some(address),
            locale: Some(place.locale()),
        }
    }

    pub fn down(id: u32) -> Self {
        Self {
            id,
            address: None,
            locale: None,
        }
    }

    pub fn is_up(&self) -> bool {
        self.address.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub points: Vec<GeoPoint>,
    pub routes: Vec<RouteStatus>,
    pub fetched_at: Instant,
}

impl Snapshot {
    /// Placeholder shown before the first refresh completes
    pub fn empty(route_ids: &[u32]) -> Self {
        Self {
            points: Vec::new(),
            routes: route_ids.iter().map(|&id| RouteStatus::down(id)).collect(),
            fetched_at: Instant::now(),
        }
    }

    pub fn routes_up(&self) -> usize {
        self.routes.iter().filter(|r| r.is_up()).count()
    }
}

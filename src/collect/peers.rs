//! Connected peer discovery
//!
//! Reads remote addresses from /proc/net/tcp where it exists, otherwise from
//! `netstat -n` output. Lines that don't parse are skipped.

use std::collections::BTreeSet;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::process::Command;

const PROC_NET_TCP: &str = "/proc/net/tcp";

/// TCP_LISTEN in /proc/net/tcp's state column
const STATE_LISTEN: u8 = 0x0A;

/// Remote public addresses of current connections, deduplicated and sorted
pub fn discover() -> Vec<IpAddr> {
    let peers = match fs::read_to_string(PROC_NET_TCP) {
        Ok(content) => parse_proc_net(&content),
        Err(_) => match Command::new("netstat").args(["-n", "-f", "inet"]).output() {
            Ok(out) if out.status.success() => {
                parse_netstat(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(out) => {
                tracing::debug!(status = %out.status, "netstat failed");
                Vec::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "no connection table available");
                Vec::new()
            }
        },
    };
    tracing::debug!(count = peers.len(), "peers discovered");
    peers
}

/// Parse /proc/net/tcp: hex `addr:port` columns, little-endian addresses
pub fn parse_proc_net(content: &str) -> Vec<IpAddr> {
    let mut seen = BTreeSet::new();

    for line in content.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }

        let Some((rem_ip_hex, _)) = parts[2].split_once(':') else {
            continue;
        };
        let Some(remote_ip) = parse_hex_ip(rem_ip_hex) else {
            continue;
        };
        if is_local_or_private(remote_ip) {
            continue;
        }

        let state = u8::from_str_radix(parts[3], 16).unwrap_or(0);
        if state == STATE_LISTEN {
            continue;
        }

        seen.insert(IpAddr::V4(remote_ip));
    }

    seen.into_iter().collect()
}

/// Parse `netstat -n`: the foreign address is the fifth column, written
/// `a.b.c.d.port` on BSD and `a.b.c.d:port` on Linux
pub fn parse_netstat(content: &str) -> Vec<IpAddr> {
    let mut seen = BTreeSet::new();

    for line in content.lines() {
        let Some(foreign) = line.split_whitespace().nth(4) else {
            continue;
        };
        let Some(ip) = strip_port(foreign).and_then(|a| a.parse::<Ipv4Addr>().ok()) else {
            continue;
        };
        if is_local_or_private(ip) {
            continue;
        }
        seen.insert(IpAddr::V4(ip));
    }

    seen.into_iter().collect()
}

fn strip_port(addr: &str) -> Option<&str> {
    let (host, port) = addr.rsplit_once(&[':', '.'][..])?;
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(host)
}

/// Parse hex IP from /proc/net format (little-endian)
fn parse_hex_ip(hex: &str) -> Option<Ipv4Addr> {
    let bytes = u32::from_str_radix(hex, 16).ok()?;
    Some(Ipv4Addr::from(bytes.swap_bytes()))
}

/// Loopback, RFC 1918, link-local, multicast and unspecified addresses have
/// no location
fn is_local_or_private(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_unspecified()
}

//! SSDP (Simple Service Discovery Protocol) messages used to locate a bridge.
//!
//! The streamer multicasts one `M-SEARCH` request to the well-known SSDP group
//! and inspects every reply.  Replies are HTTP-like header blocks; a bridge is
//! recognised by the presence of the `hue-bridgeid` header:
//!
//! ```text
//! HTTP/1.1 200 OK
//! HOST: 239.255.255.250:1900
//! LOCATION: http://192.168.1.20:80/description.xml
//! hue-bridgeid: 001788FFFE123456
//! ```
//!
//! Other UPnP devices answer on the same group, so non-matching and malformed
//! replies are simply ignored.

use std::collections::HashMap;
use std::net::Ipv4Addr;

/// SSDP multicast group address.
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// SSDP multicast port.
pub const SSDP_PORT: u16 = 1900;

/// Header whose presence identifies a Hue bridge reply.
pub const BRIDGE_ID_HEADER: &str = "hue-bridgeid";

/// Returns the discovery request: a method line followed by four headers.
pub fn search_request() -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST:{SSDP_MULTICAST_ADDR}:{SSDP_PORT}\r\n\
         ST:upnp:rootdevice\r\n\
         MX:2\r\n\
         MAN:\"ssdp:discover\"\r\n\r\n"
    )
}

/// Parses a reply into a header map.
///
/// The payload is split into lines on `\r\n`, `\r`, or `\n`; each line is split
/// on its first colon into key and value, with leading whitespace trimmed from
/// the value.  Lines without a colon (the status line, blank lines) are
/// skipped.  When a key repeats, the first occurrence wins.
pub fn parse_headers(payload: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for line in payload.split(['\r', '\n']) {
        if let Some((key, value)) = line.split_once(':') {
            headers
                .entry(key.to_string())
                .or_insert_with(|| value.trim_start().to_string());
        }
    }
    headers
}

/// Returns the bridge id if `payload` is a bridge reply.
pub fn bridge_id(payload: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(payload);
    parse_headers(&text).remove(BRIDGE_ID_HEADER)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

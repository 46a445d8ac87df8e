//! Host grammar checks for Lavalink node addresses
//!
//! A node host is accepted when it is either:
//! - A domain name: dot-separated labels of alphanumerics and hyphens
//!   (no leading/trailing hyphen, at most 63 characters), ending in an
//!   alphabetic top-level label of two or more letters
//! - A dotted-quad IPv4 address, each octet 0-255 written without leading
//!   zeros (`010.0.0.5` would be read as octal by URL parsers)
//!
//! Both forms may carry a trailing `:port` of one to five digits. No scheme,
//! path or query is allowed, and nothing is resolved; these checks are pure.

use regex::Regex;
use std::sync::LazyLock;

static DOMAIN_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}(?::[0-9]{1,5})?$",
    )
    .expect("domain host pattern is valid")
});

static IPV4_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])(?::[0-9]{1,5})?$",
    )
    .expect("ipv4 host pattern is valid")
});

/// Returns true if `host` is a domain name with an optional `:port`.
pub fn is_domain_host(host: &str) -> bool {
    DOMAIN_HOST.is_match(host)
}

/// Returns true if `host` is a dotted-quad IPv4 address with an optional `:port`.
///
/// Octets must be decimal 0-255 with no leading zeros, so the address that
/// passes here is the address that gets dialed.
pub fn is_ipv4_host(host: &str) -> bool {
    IPV4_HOST.is_match(host)
}

/// Validates a node host string against the domain-or-IPv4 grammar.
pub fn is_valid_host(host: &str) -> bool {
    is_domain_host(host) || is_ipv4_host(host)
}

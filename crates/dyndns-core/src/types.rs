//! Wire and domain types shared across the updater
//!
//! `Zone` and `DomainRecord` are fetched fresh every run; DNS state may
//! change externally between runs, so nothing here is ever cached.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Address family being reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// The DNS record type this family maps to
    pub fn record_type(self) -> RecordType {
        match self {
            Family::V4 => RecordType::A,
            Family::V6 => RecordType::Aaaa,
        }
    }

    /// Whether an address belongs to this family
    pub fn matches(self, addr: IpAddr) -> bool {
        match self {
            Family::V4 => addr.is_ipv4(),
            Family::V6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::V4 => write!(f, "IPv4"),
            Family::V6 => write!(f, "IPv6"),
        }
    }
}

/// DNS record type managed by this tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire representation used by the provider API
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An address produced by a resolver strategy
///
/// Strategies that cannot determine an address return `None` rather than a
/// `ResolvedAddress`; holding an `IpAddr` makes an empty-string target
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub family: Family,
    pub value: IpAddr,
}

impl ResolvedAddress {
    pub fn new(family: Family, value: IpAddr) -> Self {
        Self { family, value }
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// A DNS zone (domain) as returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    /// Provider-assigned zone identifier
    pub id: u64,
    /// Zone domain name
    pub domain: String,
}

/// A single record within a zone, as returned by the provider
///
/// Record listings contain every record type in the zone (MX, TXT, ...), so
/// the type stays a wire string and is matched case-insensitively against
/// the requested [`RecordType`].
#[derive(Debug, Clone, Deserialize)]
pub struct DomainRecord {
    /// Provider-assigned record identifier
    pub id: u64,
    /// Record type as the provider spells it ("A", "AAAA", "MX", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record name (host part, without the domain)
    pub name: String,
    /// Record target; an IP literal for A/AAAA records
    pub target: String,
    /// Record time-to-live in seconds
    pub ttl_sec: u32,
}

impl DomainRecord {
    /// Whether this record matches a (host, type) pair, case-insensitively
    pub fn matches(&self, host: &str, record_type: RecordType) -> bool {
        self.name.eq_ignore_ascii_case(host)
            && self.record_type.eq_ignore_ascii_case(record_type.as_str())
    }

    /// The record target parsed as an IP address, if it is one
    pub fn target_ip(&self) -> Option<IpAddr> {
        self.target.parse().ok()
    }
}

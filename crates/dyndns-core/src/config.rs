//! Site configuration for the updater
//!
//! A [`Site`] is constructed once at the boundary from external
//! configuration, validated before anything reaches the network, and is
//! immutable for the rest of the run.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default record TTL in seconds when the site does not set one
pub const DEFAULT_TTL_SEC: u32 = 300;

/// IP detection strategy for a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// Ask the OS routing table for the source address toward a public anchor
    #[serde(rename = "local")]
    Local,
    /// Ask a public IP-echo service
    #[serde(rename = "ipv.me")]
    Echo,
    /// Routing-table lookup toward a configurable VPN gateway
    #[serde(rename = "vpn")]
    Vpn,
}

impl Method {
    /// All recognised strategy names, for error messages
    pub const KNOWN: &'static [&'static str] = &["local", "ipv.me", "vpn"];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Local => "local",
            Method::Echo => "ipv.me",
            Method::Vpn => "vpn",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Method::Local),
            "ipv.me" => Ok(Method::Echo),
            "vpn" => Ok(Method::Vpn),
            other => Err(Error::config(format!(
                "Unrecognised IP retrieval method '{}'. Known methods: {}",
                other,
                Method::KNOWN.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One host to keep in sync, read-only for the duration of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// Host name only (the `sofa` in `sofa.example.com`)
    pub host: String,

    /// Domain the host belongs to (the `example.com` in `sofa.example.com`)
    pub domain: String,

    /// Provider API token
    pub token: String,

    /// IP detection strategy
    pub method: Method,

    /// Gateway address probed by the `vpn` method
    #[serde(default)]
    pub gateway: Option<String>,

    /// Desired record TTL; [`DEFAULT_TTL_SEC`] when unset
    #[serde(default)]
    pub ttl_sec: Option<u32>,
}

impl Site {
    /// The TTL this site wants on its records
    pub fn effective_ttl(&self) -> u32 {
        self.ttl_sec.unwrap_or(DEFAULT_TTL_SEC)
    }

    /// Fully qualified name of the managed record, for reporting
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.host, self.domain)
    }

    /// Validate the site before any network call
    ///
    /// Rejects malformed input at the boundary: an empty host, a domain that
    /// is not shaped like a DNS name, or a token that does not match the
    /// provider's credential format (64 lowercase alphanumeric characters).
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        validate_domain_name(&self.domain)?;

        if self.token.len() != 64
            || !self
                .token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(Error::config(
                "token does not look like an API token (expected 64 lowercase alphanumeric characters)",
            ));
        }

        if let Some(ttl) = self.ttl_sec
            && ttl == 0
        {
            return Err(Error::config("ttl_sec must be greater than zero"));
        }

        Ok(())
    }
}

/// Basic RFC 1035 shape validation for a domain name
///
/// Not comprehensive, but catches the common mistakes before they turn into
/// confusing zone-lookup failures.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("domain must not be empty"));
    }
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "domain '{}' is too long ({} chars, max 253)",
            domain,
            domain.len()
        )));
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!("domain '{}' has an empty label", domain)));
        }
        if label.len() > 63 {
            return Err(Error::config(format!(
                "domain label '{}' is too long ({} chars, max 63)",
                label,
                label.len()
            )));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "domain label '{}' contains invalid characters",
                label
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "domain label '{}' must not start or end with a hyphen",
                label
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        Site {
            host: "sofa".to_string(),
            domain: "example.com".to_string(),
            token: "a".repeat(64),
            method: Method::Local,
            gateway: None,
            ttl_sec: None,
        }
    }

    #[test]
    fn valid_site_passes() {
        assert!(site().validate().is_ok());
    }

    #[test]
    fn unknown_method_is_a_config_error() {
        let err = "google".parse::<Method>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn known_methods_parse() {
        assert_eq!("local".parse::<Method>().unwrap(), Method::Local);
        assert_eq!("ipv.me".parse::<Method>().unwrap(), Method::Echo);
        assert_eq!("vpn".parse::<Method>().unwrap(), Method::Vpn);
    }

    #[test]
    fn short_token_is_rejected() {
        let mut s = site();
        s.token = "abc123".to_string();
        assert!(matches!(s.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn uppercase_token_is_rejected() {
        let mut s = site();
        s.token = "A".repeat(64);
        assert!(matches!(s.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn malformed_domain_is_rejected() {
        for bad in ["", "example..com", "-bad.com", "bad-.com", "ex!ample.com"] {
            let mut s = site();
            s.domain = bad.to_string();
            assert!(s.validate().is_err(), "domain '{}' should be rejected", bad);
        }
    }

    #[test]
    fn effective_ttl_defaults_to_300() {
        assert_eq!(site().effective_ttl(), DEFAULT_TTL_SEC);
        let mut s = site();
        s.ttl_sec = Some(3600);
        assert_eq!(s.effective_ttl(), 3600);
    }
}

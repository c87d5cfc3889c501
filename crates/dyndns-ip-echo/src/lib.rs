// # IP-echo Resolver
//
// Implements the `ipv.me` detection strategy: ask a public IP-echo service
// which address this machine connects from. One service per family:
//
// - IPv4: `http://ip4.me/api/`
// - IPv6: `http://ip6only.me/api/`
//
// The reply is plain text, comma-delimited, first field a literal protocol
// tag and second field the address:
//
// ```text
// IPv4,45.33.54.82,Remaining fields reserved for future use,,,
// ```
//
// A reply that does not parse, or whose tag does not match the requested
// family, yields *absent*: there is no placeholder fallback for this
// strategy, so an IPv6-less host honestly skips its AAAA record instead of
// writing a bogus one. An unreachable service is a transport failure and
// aborts that family's reconciliation.

use async_trait::async_trait;
use dyndns_core::error::{Error, Result};
use dyndns_core::traits::IpResolver;
use dyndns_core::types::{Family, ResolvedAddress};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info};

/// Echo services queried per family
const V4_ECHO_URL: &str = "http://ip4.me/api/";
const V6_ECHO_URL: &str = "http://ip6only.me/api/";

/// Timeout for the echo request; expiry surfaces as a transport failure
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolver for the `ipv.me` method
pub struct EchoIpResolver {
    v4_url: String,
    v6_url: String,
    client: reqwest::Client,
}

impl EchoIpResolver {
    /// Resolver against the production echo services
    pub fn new() -> Result<Self> {
        Self::with_urls(V4_ECHO_URL, V6_ECHO_URL)
    }

    /// Resolver against arbitrary echo URLs (tests, self-hosted mirrors)
    pub fn with_urls(v4_url: impl Into<String>, v6_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            v4_url: v4_url.into(),
            v6_url: v6_url.into(),
            client,
        })
    }
}

#[async_trait]
impl IpResolver for EchoIpResolver {
    async fn resolve(&self, family: Family) -> Result<Option<ResolvedAddress>> {
        let url = match family {
            Family::V4 => &self.v4_url,
            Family::V6 => &self.v6_url,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(format!("echo request to {url} failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(format!(
                "echo service {url} answered {status}"
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("failed reading echo reply from {url}: {e}")))?;

        match parse_echo_reply(family, &body) {
            Some(addr) => {
                debug!(%family, %addr, url, "address from echo service");
                Ok(Some(ResolvedAddress::new(family, addr)))
            }
            None => {
                info!(%family, url, "echo reply did not carry a usable address");
                Ok(None)
            }
        }
    }

    fn method_name(&self) -> &'static str {
        "ipv.me"
    }
}

/// Parse a `IPv4,<addr>,...` / `IPv6,<addr>,...` echo reply
///
/// Returns `None` for a missing or mismatched tag, a missing address field,
/// an unparseable address, or an address of the wrong family.
fn parse_echo_reply(family: Family, body: &str) -> Option<IpAddr> {
    let mut fields = body.trim().split(',');
    let tag = fields.next()?;
    let expected = match family {
        Family::V4 => "IPv4",
        Family::V6 => "IPv6",
    };
    if tag != expected {
        return None;
    }
    let addr: IpAddr = fields.next()?.trim().parse().ok()?;
    family.matches(addr).then_some(addr)
}

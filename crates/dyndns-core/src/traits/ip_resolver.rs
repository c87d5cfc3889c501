// # IP Resolver Trait
//
// Defines the interface for discovering the machine's current address.
//
// ## Implementations
//
// - Routing-table lookup (`local`, `vpn` methods): `dyndns-ip-route` crate
// - Public IP-echo service (`ipv.me` method): `dyndns-ip-echo` crate
//
// ## Absence vs. failure
//
// A strategy that completes but cannot determine an address returns
// `Ok(None)`; the engine then skips that address family for the run with
// zero gateway calls. A hard failure (e.g. the echo service is unreachable)
// returns an error, which aborts that family's reconciliation while the
// other family proceeds independently.

use crate::error::Result;
use crate::types::{Family, ResolvedAddress};
use async_trait::async_trait;

/// Trait for IP detection strategies
///
/// Implementations must be thread-safe and must never report an address of
/// the wrong family for the one requested.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Determine the current address for one family, or `None` if this
    /// strategy cannot say
    async fn resolve(&self, family: Family) -> Result<Option<ResolvedAddress>>;

    /// Strategy name, for logging
    fn method_name(&self) -> &'static str;
}

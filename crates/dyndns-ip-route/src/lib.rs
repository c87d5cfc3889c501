// # Routing-table IP Resolver
//
// Implements the `local` and `vpn` detection strategies: ask the OS routing
// table which source address it would use to reach a target, by running
// `ip route get <target>` and parsing the `src` field.
//
// - `local` probes a well-known public anchor (`8.8.8.8`, and
//   `2001:4860:4860::8888` for IPv6)
// - `vpn` probes a configurable gateway instead (default `172.20.0.0`);
//   IPv6 is not supported by this strategy and resolves to absent
//
// ## Graceful degrade
//
// Failure to obtain a usable address (command missing, non-zero exit, no
// parseable `src` field) does not fail the run: the strategy falls back to
// a documented placeholder drawn from a reserved test block, `198.18.61.34`
// (RFC 2544 benchmarking block) for IPv4 and `2001:200::1` (RFC 5180) for
// IPv6, so a record always converges to a value the operator can recognise
// as "detection failed".
//
// ## Command execution
//
// All process spawning goes through the [`CommandRunner`] capability: one
// trait, one tokio implementation, mockable in tests. The command's stderr
// is discarded, which suppresses transient routing diagnostics without
// hiding a failed exit status.

use async_trait::async_trait;
use dyndns_core::error::Result;
use dyndns_core::traits::IpResolver;
use dyndns_core::types::{Family, ResolvedAddress};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::process::Stdio;
use tracing::{debug, warn};

/// Public anchors probed by the `local` method
const V4_ANCHOR: &str = "8.8.8.8";
const V6_ANCHOR: &str = "2001:4860:4860::8888";

/// Gateway probed by the `vpn` method when none is configured
pub const DEFAULT_VPN_GATEWAY: &str = "172.20.0.0";

/// Placeholder addresses from reserved test blocks
const V4_PLACEHOLDER: Ipv4Addr = Ipv4Addr::new(198, 18, 61, 34);
const V6_PLACEHOLDER: Ipv6Addr = Ipv6Addr::new(0x2001, 0x0200, 0, 0, 0, 0, 0, 1);

/// Captured result of one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Whether the command exited successfully
    pub success: bool,
}

/// Capability to run an external command and capture its output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            // Routing tools emit transient warnings on stderr; drop them.
            // A hard failure still shows as a non-success exit status.
            .stderr(Stdio::null())
            .output()
            .await?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            success: output.status.success(),
        })
    }
}

/// What the routing table is probed with
enum RouteTarget {
    /// `local` method: public anchor per family
    PublicAnchor,
    /// `vpn` method: a fixed gateway, IPv4 only
    VpnGateway(String),
}

/// Resolver for the `local` and `vpn` methods
pub struct RouteIpResolver {
    runner: Box<dyn CommandRunner>,
    target: RouteTarget,
}

impl RouteIpResolver {
    /// The `local` strategy with the real command runner
    pub fn local() -> Self {
        Self::local_with_runner(Box::new(TokioCommandRunner))
    }

    /// The `local` strategy with a caller-supplied runner
    pub fn local_with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            runner,
            target: RouteTarget::PublicAnchor,
        }
    }

    /// The `vpn` strategy; `gateway` defaults to [`DEFAULT_VPN_GATEWAY`]
    pub fn vpn(gateway: Option<String>) -> Self {
        Self::vpn_with_runner(gateway, Box::new(TokioCommandRunner))
    }

    /// The `vpn` strategy with a caller-supplied runner
    pub fn vpn_with_runner(gateway: Option<String>, runner: Box<dyn CommandRunner>) -> Self {
        let gateway = gateway
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| DEFAULT_VPN_GATEWAY.to_string());
        Self {
            runner,
            target: RouteTarget::VpnGateway(gateway),
        }
    }

    fn placeholder(family: Family) -> IpAddr {
        match family {
            Family::V4 => IpAddr::V4(V4_PLACEHOLDER),
            Family::V6 => IpAddr::V6(V6_PLACEHOLDER),
        }
    }
}

#[async_trait]
impl IpResolver for RouteIpResolver {
    async fn resolve(&self, family: Family) -> Result<Option<ResolvedAddress>> {
        let probe = match (&self.target, family) {
            (RouteTarget::PublicAnchor, Family::V4) => V4_ANCHOR,
            (RouteTarget::PublicAnchor, Family::V6) => V6_ANCHOR,
            (RouteTarget::VpnGateway(gateway), Family::V4) => gateway.as_str(),
            // The vpn strategy has no IPv6 route to probe.
            (RouteTarget::VpnGateway(_), Family::V6) => return Ok(None),
        };

        let args: &[&str] = match family {
            Family::V4 => &["route", "get", probe],
            Family::V6 => &["-6", "route", "get", probe],
        };

        let source = match self.runner.run("ip", args).await {
            Ok(output) if output.success => parse_src(&output.stdout, family),
            Ok(_) | Err(_) => None,
        };

        let value = match source {
            Some(addr) => {
                debug!(%family, %addr, probe, "source address from routing table");
                addr
            }
            None => {
                let placeholder = Self::placeholder(family);
                warn!(
                    %family,
                    probe,
                    %placeholder,
                    "could not determine a source address, using placeholder"
                );
                placeholder
            }
        };

        Ok(Some(ResolvedAddress::new(family, value)))
    }

    fn method_name(&self) -> &'static str {
        match self.target {
            RouteTarget::PublicAnchor => "local",
            RouteTarget::VpnGateway(_) => "vpn",
        }
    }
}

/// Extract the address following the `src` token of an `ip route get` reply
///
/// Typical reply:
/// `8.8.8.8 via 192.0.2.1 dev eth0 src 192.0.2.10 uid 1000`
fn parse_src(stdout: &str, family: Family) -> Option<IpAddr> {
    let mut tokens = stdout.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "src" {
            return tokens
                .next()
                .and_then(|t| t.parse::<IpAddr>().ok())
                .filter(|addr| family.matches(*addr));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Runner replaying a fixed outcome and recording invocations
    struct FixedRunner {
        outcome: std::io::Result<CommandOutput>,
        calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    impl FixedRunner {
        fn ok(stdout: &str) -> Self {
            Self::new(Ok(CommandOutput {
                stdout: stdout.to_string(),
                success: true,
            }))
        }

        fn failed_exit() -> Self {
            Self::new(Ok(CommandOutput {
                stdout: String::new(),
                success: false,
            }))
        }

        fn spawn_error() -> Self {
            Self::new(Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No such file or directory",
            )))
        }

        fn new(outcome: std::io::Result<CommandOutput>) -> Self {
            Self {
                outcome,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Arc<Mutex<Vec<(String, Vec<String>)>>> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FixedRunner {
        async fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push((
                program.to_string(),
                args.iter().map(|a| a.to_string()).collect(),
            ));
            match &self.outcome {
                Ok(output) => Ok(output.clone()),
                Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn local_v4_parses_the_src_field() {
        let runner = FixedRunner::ok("8.8.8.8 via 192.0.2.1 dev eth0 src 192.0.2.10 uid 1000");
        let calls = runner.calls();
        let resolver = RouteIpResolver::local_with_runner(Box::new(runner));

        let resolved = resolver.resolve(Family::V4).await.unwrap().unwrap();

        assert_eq!(resolved.value, "192.0.2.10".parse::<IpAddr>().unwrap());
        assert_eq!(
            calls.lock().unwrap()[0],
            ("ip".to_string(), vec!["route".into(), "get".into(), "8.8.8.8".into()])
        );
    }

    #[tokio::test]
    async fn local_v6_probes_the_v6_anchor() {
        let runner =
            FixedRunner::ok("2001:4860:4860::8888 from :: dev eth0 src 2001:db8::10 metric 1024");
        let calls = runner.calls();
        let resolver = RouteIpResolver::local_with_runner(Box::new(runner));

        let resolved = resolver.resolve(Family::V6).await.unwrap().unwrap();

        assert_eq!(resolved.value, "2001:db8::10".parse::<IpAddr>().unwrap());
        assert_eq!(
            calls.lock().unwrap()[0].1,
            vec!["-6", "route", "get", "2001:4860:4860::8888"]
        );
    }

    #[tokio::test]
    async fn vpn_probes_the_configured_gateway() {
        let runner = FixedRunner::ok("10.8.0.1 dev tun0 src 10.8.0.6");
        let calls = runner.calls();
        let resolver =
            RouteIpResolver::vpn_with_runner(Some("10.8.0.1".to_string()), Box::new(runner));

        let resolved = resolver.resolve(Family::V4).await.unwrap().unwrap();

        assert_eq!(resolved.value, "10.8.0.6".parse::<IpAddr>().unwrap());
        assert_eq!(calls.lock().unwrap()[0].1, vec!["route", "get", "10.8.0.1"]);
    }

    #[tokio::test]
    async fn vpn_without_gateway_uses_the_default() {
        let runner = FixedRunner::ok("172.20.0.0 dev tun0 src 172.20.0.6");
        let calls = runner.calls();
        let resolver = RouteIpResolver::vpn_with_runner(None, Box::new(runner));

        resolver.resolve(Family::V4).await.unwrap();

        assert_eq!(calls.lock().unwrap()[0].1[2], DEFAULT_VPN_GATEWAY);
    }

    #[tokio::test]
    async fn vpn_v6_is_absent_without_running_anything() {
        let runner = FixedRunner::ok("unused");
        let calls = runner.calls();
        let resolver = RouteIpResolver::vpn_with_runner(None, Box::new(runner));

        let resolved = resolver.resolve(Family::V6).await.unwrap();

        assert!(resolved.is_none());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_exit_degrades_to_the_v4_placeholder() {
        let resolver = RouteIpResolver::local_with_runner(Box::new(FixedRunner::failed_exit()));

        let resolved = resolver.resolve(Family::V4).await.unwrap().unwrap();

        assert_eq!(resolved.value, "198.18.61.34".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn missing_ip_binary_degrades_to_the_placeholder() {
        let resolver = RouteIpResolver::local_with_runner(Box::new(FixedRunner::spawn_error()));

        let resolved = resolver.resolve(Family::V6).await.unwrap().unwrap();

        assert_eq!(resolved.value, "2001:200::1".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn output_without_src_degrades_to_the_placeholder() {
        let resolver = RouteIpResolver::local_with_runner(Box::new(FixedRunner::ok(
            "8.8.8.8 via 192.0.2.1 dev eth0",
        )));

        let resolved = resolver.resolve(Family::V4).await.unwrap().unwrap();

        assert_eq!(resolved.value, "198.18.61.34".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn src_of_the_wrong_family_is_rejected() {
        // A v6 literal after `src` in a v4 lookup must not be reported as v4.
        let resolver = RouteIpResolver::local_with_runner(Box::new(FixedRunner::ok(
            "8.8.8.8 dev eth0 src 2001:db8::10",
        )));

        let resolved = resolver.resolve(Family::V4).await.unwrap().unwrap();

        assert_eq!(resolved.value, "198.18.61.34".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn parse_src_handles_trailing_fields() {
        let out = "8.8.8.8 via 192.0.2.1 dev eth0 src 192.0.2.10 uid 1000\n    cache";
        assert_eq!(
            parse_src(out, Family::V4),
            Some("192.0.2.10".parse().unwrap())
        );
    }
}

// # dyndns - single-shot dynamic DNS updater
//
// Thin integration shell over `dyndns-core`:
//
// 1. Parse the command line (one positional argument selecting the
//    configuration section)
// 2. Load and validate the selected [`Site`] from the TOML config file
// 3. Wire up the IP resolver for the site's method and the Linode gateway
// 4. Run the reconciliation engine once and report the outcome
//
// All reconciliation logic lives in `dyndns-core`; nothing here retries,
// caches or decides.
//
// ## Exit codes
//
// - 0: run completed, both families converged (or were skipped)
// - 1: configuration or validation error, nothing touched the network
// - 2: runtime error (zone lookup failed, or a family failed to reconcile)

mod settings;

use clap::Parser;
use dyndns_core::{Error, FamilyReport, IpResolver, Method, Site, SyncEngine, SyncOutcome};
use dyndns_ip_echo::EchoIpResolver;
use dyndns_ip_route::RouteIpResolver;
use dyndns_provider_linode::LinodeGateway;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Keep a Linode A/AAAA record pointed at this machine's current address
#[derive(Debug, Parser)]
#[command(name = "dyndns", version, about)]
struct Cli {
    /// Configuration section to use
    #[arg(default_value = "default")]
    section: String,

    /// Configuration file (default: <config dir>/dyndns/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Perform lookups but log mutating calls instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Log verbosity: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Exit codes for the different termination scenarios
#[derive(Debug, Clone, Copy)]
enum RunExitCode {
    /// Both families converged or were skipped
    Success = 0,
    /// Configuration or validation error; no network call was made
    ConfigError = 1,
    /// The run started but did not fully converge
    RuntimeError = 2,
}

impl From<RunExitCode> for ExitCode {
    fn from(code: RunExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!("Unknown log level '{other}' (expected trace, debug, info, warn or error)");
            return RunExitCode::ConfigError.into();
        }
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return RunExitCode::ConfigError.into();
    }

    // Everything configuration-shaped fails before the runtime is even built.
    let config_path = match cli.config.map(Ok).unwrap_or_else(settings::default_config_path) {
        Ok(path) => path,
        Err(e) => {
            error!("Configuration error: {e:#}");
            return RunExitCode::ConfigError.into();
        }
    };
    info!(section = %cli.section, config = %config_path.display(), "loading configuration");
    let site = match settings::load_site(&config_path, &cli.section) {
        Ok(site) => site,
        Err(e) => {
            error!("Configuration error: {e:#}");
            return RunExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return RunExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_once(site, cli.dry_run).await {
            Ok(true) => RunExitCode::Success,
            Ok(false) => RunExitCode::RuntimeError,
            Err(e) if matches!(e, Error::Config(_)) => {
                error!("Configuration error: {e}");
                RunExitCode::ConfigError
            }
            Err(e) => {
                error!("Run failed: {e}");
                RunExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the resolver for this site's method
fn resolver_for(site: &Site) -> Result<Box<dyn IpResolver>, Error> {
    Ok(match site.method {
        Method::Local => Box::new(RouteIpResolver::local()),
        Method::Vpn => Box::new(RouteIpResolver::vpn(site.gateway.clone())),
        Method::Echo => Box::new(EchoIpResolver::new()?),
    })
}

/// Perform one reconciliation run; `Ok(true)` means full convergence
async fn run_once(site: Site, dry_run: bool) -> Result<bool, Error> {
    let resolver = resolver_for(&site)?;
    let gateway = Box::new(LinodeGateway::new(site.token.clone())?);

    let fqdn = site.fqdn();
    info!(%fqdn, method = %site.method, dry_run, "starting reconciliation");

    let engine = SyncEngine::new(site, resolver, gateway)?.with_dry_run(dry_run);
    let report = engine.run().await?;

    for FamilyReport { family, outcome } in &report.families {
        match outcome {
            Ok(SyncOutcome::Created { address }) => {
                info!(%family, %address, fqdn = %report.fqdn, "record created")
            }
            Ok(SyncOutcome::Updated { address, previous }) => {
                info!(%family, %address, %previous, fqdn = %report.fqdn, "record updated")
            }
            Ok(SyncOutcome::Unchanged { address }) => {
                info!(%family, %address, fqdn = %report.fqdn, "record already up to date")
            }
            Ok(SyncOutcome::Skipped) => {
                info!(%family, fqdn = %report.fqdn, "skipped: no address for this family")
            }
            Err(e) => warn!(%family, fqdn = %report.fqdn, "family failed: {e}"),
        }
    }

    Ok(!report.has_failures())
}

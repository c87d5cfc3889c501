//! Reconciliation engine
//!
//! The [`SyncEngine`] drives one single-shot, idempotent run:
//!
//! ```text
//! ┌────────────┐      ┌──────────────────┐      ┌──────────────┐
//! │ IpResolver │ ───▶ │    SyncEngine    │ ───▶ │  ApiGateway  │
//! └────────────┘      │ zone lookup      │      └──────────────┘
//!                     │ record lookup    │
//!                     │ plan + apply     │
//!                     └──────────────────┘
//! ```
//!
//! For each address family (IPv4 strictly before IPv6): resolve the current
//! address, look the record up through the paginated listing, decide between
//! create/update/no-op, and act through the gateway. Nothing is cached and
//! nothing is retried; failures in one family are reported and the other
//! family proceeds independently.

use crate::config::Site;
use crate::error::{Error, Result};
use crate::pagination::{decode_page, find_matching};
use crate::traits::{ApiGateway, IpResolver};
use crate::types::{DomainRecord, Family, RecordType, ResolvedAddress, Zone};
use serde::Serialize;
use std::net::IpAddr;
use tracing::{debug, info, warn};

/// Decision for one address family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No authoritative record exists; create one
    Create { target: IpAddr, ttl_sec: u32 },
    /// The record disagrees on target or TTL; replace it by id
    Update {
        record_id: u64,
        target: IpAddr,
        ttl_sec: u32,
    },
    /// The record already matches the desired state
    NoOp,
    /// No address could be determined for this family
    Skip,
}

/// What actually happened to one family's record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A record was created
    Created { address: IpAddr },
    /// An existing record was replaced
    Updated { address: IpAddr, previous: String },
    /// The record already had the right target and TTL
    Unchanged { address: IpAddr },
    /// The strategy produced no address; nothing was attempted
    Skipped,
}

/// Per-family result of a run
#[derive(Debug)]
pub struct FamilyReport {
    pub family: Family,
    pub outcome: Result<SyncOutcome>,
}

/// Result of one complete run
#[derive(Debug)]
pub struct RunReport {
    /// Fully qualified record name that was reconciled
    pub fqdn: String,
    /// Zone the record lives in
    pub zone_id: u64,
    /// One entry per address family, IPv4 first
    pub families: Vec<FamilyReport>,
}

impl RunReport {
    /// Whether any family's reconciliation failed
    pub fn has_failures(&self) -> bool {
        self.families.iter().any(|f| f.outcome.is_err())
    }
}

/// Decide what to do for one family
///
/// Pure decision logic, no side effects: absence of a resolved address skips
/// the family, absence of a record creates one, a target or TTL mismatch
/// replaces the record, anything else is a no-op. A record target that does
/// not parse as an IP literal counts as a mismatch.
pub fn plan(site: &Site, resolved: Option<&ResolvedAddress>, existing: Option<&DomainRecord>) -> Action {
    let Some(resolved) = resolved else {
        return Action::Skip;
    };
    let ttl_sec = site.effective_ttl();

    match existing {
        None => Action::Create {
            target: resolved.value,
            ttl_sec,
        },
        Some(record) => {
            let target_matches = record.target_ip() == Some(resolved.value);
            if !target_matches || record.ttl_sec != ttl_sec {
                Action::Update {
                    record_id: record.id,
                    target: resolved.value,
                    ttl_sec,
                }
            } else {
                Action::NoOp
            }
        }
    }
}

/// Record creation body: `POST /domains/{zoneId}/records`
#[derive(Debug, Serialize)]
struct CreateRecordBody<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    target: String,
    ttl_sec: u32,
}

/// Record replacement body: `PUT /domains/{zoneId}/records/{recordId}`
#[derive(Debug, Serialize)]
struct UpdateRecordBody<'a> {
    name: &'a str,
    target: String,
    ttl_sec: u32,
}

/// Single-shot reconciliation engine
///
/// Owns the read-only [`Site`] plus boxed resolver and gateway capabilities.
/// All awaits are strictly sequential; the IPv4 pipeline fully completes
/// before IPv6 begins, so no record is ever written concurrently within a
/// run.
pub struct SyncEngine {
    site: Site,
    resolver: Box<dyn IpResolver>,
    gateway: Box<dyn ApiGateway>,
    dry_run: bool,
}

impl SyncEngine {
    /// Create a new engine, validating the site before any network call
    pub fn new(
        site: Site,
        resolver: Box<dyn IpResolver>,
        gateway: Box<dyn ApiGateway>,
    ) -> Result<Self> {
        site.validate()?;
        Ok(Self {
            site,
            resolver,
            gateway,
            dry_run: false,
        })
    }

    /// In dry-run mode lookups are performed but mutating calls are only
    /// logged, never sent
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Perform one reconciliation run
    ///
    /// Zone absence is fatal for the whole site (nothing can proceed).
    /// Family failures are captured in the report instead of aborting the
    /// run, so an IPv6 problem never prevents IPv4 from converging.
    pub async fn run(&self) -> Result<RunReport> {
        let zone = self.find_zone().await?;
        info!(domain = %zone.domain, zone_id = zone.id, "zone located");

        let mut families = Vec::with_capacity(2);
        for family in [Family::V4, Family::V6] {
            let outcome = self.sync_family(&zone, family).await;
            if let Err(e) = &outcome {
                warn!(%family, fqdn = %self.site.fqdn(), "reconciliation failed: {e}");
            }
            families.push(FamilyReport { family, outcome });
        }

        Ok(RunReport {
            fqdn: self.site.fqdn(),
            zone_id: zone.id,
            families,
        })
    }

    /// Locate the zone matching the site's domain, case-insensitively
    async fn find_zone(&self) -> Result<Zone> {
        let gateway = self.gateway.as_ref();
        let domain = &self.site.domain;
        find_matching(
            move |page| {
                let path = format!("/domains?page={page}");
                async move { decode_page(gateway.get(&path).await?, "domains") }
            },
            |zone: &Zone| zone.domain.eq_ignore_ascii_case(domain),
            &format!("domain \"{domain}\""),
        )
        .await
    }

    /// Locate the authoritative record for (host, type), if any
    ///
    /// When the provider holds duplicates for the same (name, type) pair the
    /// first match in page order is acted on; exactly-one-per-pair is not
    /// assumed to be provider-enforced.
    async fn find_record(&self, zone: &Zone, record_type: RecordType) -> Result<Option<DomainRecord>> {
        let gateway = self.gateway.as_ref();
        let site = &self.site;
        let lookup = find_matching(
            move |page| {
                let path = format!("/domains/{}/records?page={page}", zone.id);
                async move { decode_page(gateway.get(&path).await?, "records") }
            },
            |record: &DomainRecord| record.matches(&site.host, record_type),
            &format!(
                "{record_type} record for \"{}\" ({}/{})",
                site.fqdn(),
                zone.domain,
                zone.id
            ),
        )
        .await;

        match lookup {
            Ok(record) => Ok(Some(record)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve, look up, plan and apply for one family
    async fn sync_family(&self, zone: &Zone, family: Family) -> Result<SyncOutcome> {
        let record_type = family.record_type();

        let Some(resolved) = self.resolver.resolve(family).await? else {
            info!(
                %family,
                method = self.resolver.method_name(),
                "no address detected, skipping"
            );
            return Ok(SyncOutcome::Skipped);
        };
        debug!(%family, address = %resolved, "address resolved");

        let existing = self.find_record(zone, record_type).await?;

        match plan(&self.site, Some(&resolved), existing.as_ref()) {
            Action::Skip => Ok(SyncOutcome::Skipped),
            Action::NoOp => {
                info!(
                    fqdn = %self.site.fqdn(),
                    address = %resolved,
                    ttl_sec = self.site.effective_ttl(),
                    "no need to change record"
                );
                Ok(SyncOutcome::Unchanged {
                    address: resolved.value,
                })
            }
            Action::Create { target, ttl_sec } => {
                info!(fqdn = %self.site.fqdn(), %record_type, %target, "adding record");
                if self.dry_run {
                    info!("dry-run: create suppressed");
                    return Ok(SyncOutcome::Created { address: target });
                }
                let created = self.create_record(zone, record_type, target, ttl_sec).await?;
                // The create endpoint does not always honor a custom TTL on
                // first write; re-check and fix up by the new record's id.
                if created.ttl_sec != ttl_sec {
                    debug!(
                        record_id = created.id,
                        stored = created.ttl_sec,
                        wanted = ttl_sec,
                        "stored TTL differs, replacing record"
                    );
                    self.replace_record(zone, created.id, target, ttl_sec).await?;
                }
                Ok(SyncOutcome::Created { address: target })
            }
            Action::Update {
                record_id,
                target,
                ttl_sec,
            } => {
                let previous = existing.map(|r| r.target).unwrap_or_default();
                info!(
                    fqdn = %self.site.fqdn(),
                    %record_type,
                    %target,
                    %previous,
                    "replacing record"
                );
                if self.dry_run {
                    info!("dry-run: update suppressed");
                    return Ok(SyncOutcome::Updated {
                        address: target,
                        previous,
                    });
                }
                self.replace_record(zone, record_id, target, ttl_sec).await?;
                Ok(SyncOutcome::Updated {
                    address: target,
                    previous,
                })
            }
        }
    }

    /// `POST /domains/{zoneId}/records`, returning the record as stored
    async fn create_record(
        &self,
        zone: &Zone,
        record_type: RecordType,
        target: IpAddr,
        ttl_sec: u32,
    ) -> Result<DomainRecord> {
        let body = serde_json::to_value(CreateRecordBody {
            record_type: record_type.as_str(),
            name: &self.site.host,
            target: target.to_string(),
            ttl_sec,
        })?;
        let reply = self
            .gateway
            .post(&format!("/domains/{}/records", zone.id), &body)
            .await?;
        Ok(serde_json::from_value(reply)?)
    }

    /// `PUT /domains/{zoneId}/records/{recordId}`
    async fn replace_record(
        &self,
        zone: &Zone,
        record_id: u64,
        target: IpAddr,
        ttl_sec: u32,
    ) -> Result<()> {
        let body = serde_json::to_value(UpdateRecordBody {
            name: &self.site.host,
            target: target.to_string(),
            ttl_sec,
        })?;
        self.gateway
            .put(&format!("/domains/{}/records/{record_id}", zone.id), &body)
            .await?;
        Ok(())
    }
}

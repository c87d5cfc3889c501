// # dyndns-core
//
// Core library for the single-shot Linode dynamic DNS updater.
//
// ## Architecture Overview
//
// - **IpResolver**: Trait for discovering the machine's current address
// - **ApiGateway**: Trait wrapping the provider's authenticated REST API
// - **SyncEngine**: Resolves, looks up zone and record through the paginated
//   listings, and decides between create/update/no-op per address family
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The engine decides; side effects live
//    behind the gateway trait
// 2. **Single-shot**: One idempotent run, no daemon loop, no cached state;
//    DNS state may change externally between runs and is re-fetched fresh
// 3. **Library-First**: The binary is a thin shell over this crate
// 4. **No retries**: A failure aborts the affected unit and is reported;
//    the operator re-runs the tool

pub mod config;
pub mod engine;
pub mod error;
pub mod pagination;
pub mod traits;
pub mod types;

// Re-export core types for convenience
pub use config::{DEFAULT_TTL_SEC, Method, Site};
pub use engine::{Action, FamilyReport, RunReport, SyncEngine, SyncOutcome, plan};
pub use error::{Error, Result};
pub use pagination::{Page, decode_page, find_matching};
pub use traits::{ApiGateway, IpResolver};
pub use types::{DomainRecord, Family, RecordType, ResolvedAddress, Zone};

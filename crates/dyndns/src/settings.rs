//! Configuration file loading
//!
//! The file is TOML, one table per site section, selected by the positional
//! CLI argument:
//!
//! ```toml
//! [default]
//! token = "0123…"            # 64 lowercase alphanumeric characters
//! host = "sofa"
//! domain = "example.com"
//! method = "local"           # local | ipv.me | vpn
//! # gateway = "172.20.0.0"   # vpn method only
//! # ttl_sec = 300
//! ```
//!
//! The default location is `<config dir>/dyndns/config.toml` (e.g.
//! `~/.config/dyndns/config.toml` on Linux). Loading produces a finished,
//! validated [`Site`]; malformed input is rejected here, before anything
//! reaches the network.

use anyhow::{Context, Result, bail};
use dyndns_core::Site;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file location
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("cannot determine the user configuration directory")?;
    Ok(dir.join("dyndns").join("config.toml"))
}

/// Load and validate one site section from a configuration file
pub fn load_site(path: &Path, section: &str) -> Result<Site> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read configuration file {}", path.display()))?;

    let mut sections: BTreeMap<String, Site> = toml::from_str(&raw)
        .with_context(|| format!("malformed configuration file {}", path.display()))?;

    let Some(site) = sections.remove(section) else {
        bail!(
            "no [{section}] section in {} (sections present: {})",
            path.display(),
            sections.keys().cloned().collect::<Vec<_>>().join(", ")
        );
    };

    site.validate()
        .with_context(|| format!("invalid [{section}] section in {}", path.display()))?;
    Ok(site)
}

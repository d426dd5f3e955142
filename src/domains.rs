//! Domain configuration and suffix matching.
//!
//! The served domain list comes from either a comma-separated command-line
//! value or a config file with one domain per line. It is resolved once at
//! startup and never mutated afterwards, so the query path can share it
//! without locking.

use std::fs;
use std::path::Path;

use hickory_proto::rr::Name;
use tracing::debug;

use crate::error::{CrapDnsError, Result};

/// The set of domains this server answers for.
///
/// Matching is ancestor-or-equal: a configured domain matches itself and
/// any of its subdomains, compared at label boundaries. Entries are tried
/// in configuration order and the first hit wins; there is no
/// longest-suffix preference. Duplicates are tolerated.
#[derive(Debug)]
pub struct DomainSet {
    entries: Vec<DomainEntry>,
}

#[derive(Debug)]
struct DomainEntry {
    /// The domain exactly as configured; used as the resolver filename.
    raw: String,
    /// Parsed FQDN form used for matching.
    name: Name,
}

impl DomainSet {
    /// Resolves the served domains from the command line or the config file.
    ///
    /// A command-line list takes precedence: it is split on commas and used
    /// as-is, and the config file is not consulted at all. Otherwise the
    /// file at `config_path` is read, one domain per line; blank lines are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CrapDnsError::Config`] if the config file cannot be read,
    /// or [`CrapDnsError::InvalidDomain`] if an entry does not parse as a
    /// DNS name.
    pub fn resolve(cli_domains: Option<&str>, config_path: &Path) -> Result<Self> {
        let raw: Vec<String> = if let Some(list) = cli_domains {
            debug!("domains supplied on command-line, config file disabled");
            list.split(',').map(str::to_owned).collect()
        } else {
            let content =
                fs::read_to_string(config_path).map_err(|source| CrapDnsError::Config {
                    path: config_path.to_path_buf(),
                    source,
                })?;
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_owned)
                .collect()
        };
        Self::from_domains(raw)
    }

    /// Builds a set from already-split domain strings, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`CrapDnsError::InvalidDomain`] if an entry does not parse
    /// as a DNS name.
    pub fn from_domains(domains: impl IntoIterator<Item = String>) -> Result<Self> {
        let entries = domains
            .into_iter()
            .map(|raw| {
                let mut name =
                    Name::from_utf8(&raw).map_err(|source| CrapDnsError::InvalidDomain {
                        domain: raw.clone(),
                        source,
                    })?;
                // Queries arrive fully qualified; compare apples to apples.
                name.set_fqdn(true);
                Ok(DomainEntry { raw, name })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Returns `true` if some configured domain is equal to `qname` or an
    /// ancestor of it. First match in configuration order wins.
    #[must_use]
    pub fn matches(&self, qname: &Name) -> bool {
        self.entries.iter().any(|entry| entry.name.zone_of(qname))
    }

    /// The configured domain strings, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.raw.as_str())
    }

    /// Number of configured domains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no domains are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

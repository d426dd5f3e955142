//! File-based `/etc/resolver/` management.
//!
//! Every file written by this module starts with an ownership marker (plus
//! the creating process's PID), so cleanup can decide by content inspection
//! alone which files it may delete — correct even across a crash-restart
//! with a different domain list.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::util::is_process_alive;

/// Ownership marker at the start of every resolver file crapdns creates.
const OWNERSHIP_MARKER: &str = "###CRAPDNS###";

/// Default macOS resolver directory.
const DEFAULT_RESOLVER_DIR: &str = "/etc/resolver";

/// Counts from a [`ResolverRegistry::cleanup`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOutcome {
    /// Files carrying the ownership marker that were deleted.
    pub removed: usize,
    /// Files without the marker that were left untouched.
    pub skipped: usize,
}

/// Provisions and removes `/etc/resolver/<domain>` files.
///
/// # Lifecycle
///
/// 1. [`cleanup_orphaned`](Self::cleanup_orphaned) at startup removes stale
///    files left by a crashed previous run.
/// 2. [`provision`](Self::provision) writes one file per served domain.
/// 3. [`cleanup`](Self::cleanup) at shutdown deletes exactly the files
///    carrying the ownership marker; everything else survives.
///
/// # Permissions
///
/// `/etc/resolver/` requires root. The caller must handle elevation.
pub struct ResolverRegistry {
    resolver_dir: PathBuf,
}

impl ResolverRegistry {
    /// Creates a registry targeting the default `/etc/resolver` directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver_dir: PathBuf::from(DEFAULT_RESOLVER_DIR),
        }
    }

    /// Creates a registry targeting a custom directory (useful for testing).
    #[must_use]
    pub fn with_dir(resolver_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver_dir: resolver_dir.into(),
        }
    }

    /// Returns the resolver directory path.
    #[must_use]
    pub fn resolver_dir(&self) -> &Path {
        &self.resolver_dir
    }

    /// Writes `<resolver_dir>/<domain>` for every domain, overwriting any
    /// existing file at that path unconditionally.
    ///
    /// A missing resolver directory is created on the fly; failure to
    /// create it is ignored here, since a root process that cannot create
    /// `/etc/resolver` will hit the same permissions wall on the first
    /// write below, with a clearer error.
    ///
    /// # Errors
    ///
    /// Returns [`CrapDnsError::Io`](crate::CrapDnsError::Io) on the first
    /// write failure; there is no partial-success tolerance.
    pub fn provision<'a>(&self, domains: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let _ = fs::create_dir(&self.resolver_dir);

        let content = file_content();
        for domain in domains {
            let path = self.resolver_dir.join(domain);
            fs::write(&path, &content)?;
            info!(domain, path = %path.display(), "created resolver file");
        }
        Ok(())
    }

    /// Deletes every file in the resolver directory that carries the
    /// ownership marker; files without it are skipped and counted.
    ///
    /// A missing directory is a no-op (provisioning never ran). Read or
    /// delete failures abort the scan: an unreadable resolver directory is
    /// environment corruption, not something to limp past.
    ///
    /// # Errors
    ///
    /// Returns [`CrapDnsError::Io`](crate::CrapDnsError::Io) on the first
    /// listing, read, or delete failure.
    pub fn cleanup(&self) -> Result<CleanupOutcome> {
        let mut outcome = CleanupOutcome::default();
        if !self.resolver_dir.exists() {
            return Ok(outcome);
        }

        for entry in fs::read_dir(&self.resolver_dir)? {
            let path = entry?.path();
            if path.is_dir() {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            if content.starts_with(OWNERSHIP_MARKER) {
                fs::remove_file(&path)?;
                info!(path = %path.display(), "removed resolver file");
                outcome.removed += 1;
            } else {
                info!(path = %path.display(), "skipping file not owned by crapdns");
                outcome.skipped += 1;
            }
        }
        Ok(outcome)
    }

    /// Removes marker files whose creating PID is no longer running.
    ///
    /// Returns the number of files removed. Files without the marker and
    /// files belonging to still-alive processes are left untouched; a
    /// failure to remove one stale file is logged and does not stop the
    /// sweep.
    ///
    /// # Errors
    ///
    /// Returns [`CrapDnsError::Io`](crate::CrapDnsError::Io) if the
    /// directory cannot be listed.
    pub fn cleanup_orphaned(&self) -> Result<usize> {
        if !self.resolver_dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.resolver_dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_owned(&path) {
                continue;
            }

            if let Some(pid) = extract_pid(&path) {
                if !is_process_alive(pid) {
                    info!(path = %path.display(), pid, "removing orphaned resolver file");
                    match fs::remove_file(&path) {
                        Ok(()) => removed += 1,
                        Err(e) => warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to remove orphaned resolver file"
                        ),
                    }
                }
            }
        }
        Ok(removed)
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// File content helpers
// ---------------------------------------------------------------------------

/// Generates resolver file content.
///
/// ```text
/// ###CRAPDNS### (pid=12345)
/// nameserver 127.0.0.1
/// ```
fn file_content() -> String {
    let pid = std::process::id();
    format!("{OWNERSHIP_MARKER} (pid={pid})\nnameserver 127.0.0.1\n")
}

/// Checks whether a file starts with the ownership marker.
fn is_owned(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|c| c.starts_with(OWNERSHIP_MARKER))
}

/// Extracts the PID from `###CRAPDNS### (pid=<N>)`.
fn extract_pid(path: &Path) -> Option<u32> {
    let content = fs::read_to_string(path).ok()?;
    let rest = content.lines().next()?.strip_prefix(OWNERSHIP_MARKER)?;
    let rest = rest.trim().strip_prefix("(pid=")?;
    rest.strip_suffix(')')?.parse().ok()
}

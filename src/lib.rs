//! # crapdns
//!
//! A local DNS override server for macOS development setups.
//!
//! crapdns answers A-record queries for a configured set of domains with
//! `127.0.0.1` and NXDOMAIN for everything else, and keeps `/etc/resolver/`
//! in sync with the served domain set so that macOS routes only those
//! domains to it. Every resolver file it creates is tagged with an
//! ownership marker, and shutdown removes exactly the tagged files —
//! entries belonging to other tools or the user survive untouched.
//!
//! ## Quick start
//!
//! ```bash
//! # Serve the domains listed in crapdns.conf (one per line).
//! sudo crapdns
//!
//! # Or bypass the config file entirely:
//! sudo crapdns --domains myapp.test,docker.internal
//! ```
//!
//! ## Lifecycle
//!
//! 1. Startup writes `/etc/resolver/<domain>` for every configured domain
//!    and binds a UDP listener on `127.0.0.1:53`.
//! 2. Queries are answered until SIGINT/SIGTERM (or a fatal error).
//! 3. Shutdown sweeps the resolver directory and deletes the files carrying
//!    the ownership marker, on every exit path.
//!
//! ## Crash recovery
//!
//! Each resolver file records the PID of the process that created it. On
//! startup, [`ResolverRegistry::cleanup_orphaned`] removes stale files left
//! by a previous run that exited without cleaning up.
//!
//! ## Permissions
//!
//! Both `/etc/resolver/` and port 53 require root. Run under `sudo`.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod domains;
pub mod error;
pub mod resolver_file;
pub mod server;
pub mod util;

pub use domains::DomainSet;
pub use error::{CrapDnsError, Result};
pub use resolver_file::{CleanupOutcome, ResolverRegistry};
pub use server::QueryResponder;

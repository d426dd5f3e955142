//! Error types.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for crapdns operations.
pub type Result<T> = std::result::Result<T, CrapDnsError>;

/// Fatal conditions, one variant per exit-code category.
#[derive(Debug, Error)]
pub enum CrapDnsError {
    /// The config file could not be read and no domains were supplied on
    /// the command line.
    #[error("unable to read config file ({path}) and no domains supplied on command-line")]
    Config {
        /// The path that was attempted.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured domain does not parse as a DNS name.
    #[error("invalid domain name {domain:?}")]
    InvalidDomain {
        /// The offending entry, as configured.
        domain: String,
        #[source]
        source: hickory_proto::error::ProtoError,
    },

    /// Resolver-file provisioning or cleanup failed (typically
    /// `PermissionDenied` on `/etc/resolver/`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The DNS listening socket could not be acquired.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The endpoint that could not be bound.
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The host does not use the `/etc/resolver` convention.
    #[error("this utility is for Mac OS only")]
    UnsupportedPlatform,
}

impl CrapDnsError {
    /// Stable process exit code for this failure category.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. } | Self::InvalidDomain { .. } => 1,
            Self::UnsupportedPlatform => 2,
            Self::Bind { .. } => 3,
            Self::Io(_) => 4,
        }
    }

    /// Returns `true` if the underlying I/O error is `PermissionDenied`.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Self::Io(e) | Self::Bind { source: e, .. }
                if e.kind() == std::io::ErrorKind::PermissionDenied
        )
    }
}

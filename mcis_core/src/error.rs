//! Error types returned from startup and from the binary configuration
//! loader. Runtime faults reported by the MB itself are not propagated as
//! `Result` errors — they are observable session state (see [`crate::session`]).

use thiserror::Error;

/// Failure while bringing up the RT scheduling environment for the
/// send-loop thread.
#[derive(Debug, Error)]
pub enum RtError {
    #[error("RT setup failed: {0}")]
    Setup(String),
}

/// Failure decoding a 4096-byte MDA configuration record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(String),

    #[error("bad record length: expected {expected} bytes, read {read}")]
    BadLength { expected: usize, read: usize },

    #[error("CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    BadCrc { stored: u32, computed: u32 },

    #[error("configuration header encodes an old little-endian format, unsupported")]
    LittleEndianConfig,

    #[error("configuration header does not identify a supported MCIS config type")]
    UnsupportedConfigType,
}

/// Failure during socket setup. During startup this aborts the process;
/// during the run, transient send failures are logged and do not kill the
/// send-loop (see `mb_sender`).
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("failed to create socket: {0}")]
    Create(std::io::Error),

    #[error("failed to bind socket to {addr}: {source}")]
    Bind { addr: std::net::SocketAddr, source: std::io::Error },

    #[error("failed to connect socket to {addr}: {source}")]
    Connect { addr: std::net::SocketAddr, source: std::io::Error },

    #[error("socket shutdown failed: {0}")]
    Shutdown(std::io::Error),
}

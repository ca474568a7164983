//! Error types for the git-tunnel crate.
//!
//! This module defines a unified error enumeration used across URL parsing,
//! command construction, subprocess lifecycle, and the session state machine.
//! It integrates with `thiserror` to provide rich `Display` implementations
//! and error source chaining where applicable.
//!
//! Notes:
//! - Each variant carries contextual details via its message payload.
//! - Call-order violations get a distinct variant so the driving protocol
//!   engine can treat them as caller bugs rather than transient network
//!   faults.

use thiserror::Error;

use crate::transport::types::SmartService;

#[derive(Error, Debug)]
/// Unified error enumeration for the git-tunnel library.
///
/// - Used across target parsing, tunnel setup, stream I/O and teardown.
/// - Implements `std::error::Error` via `thiserror`.
pub enum TunnelError {
    /// No external SSH tool path was configured for the transport.
    #[error("No SSH tool configured")]
    NoToolConfigured,

    /// A parsed URL component starts with a flag introducer and could be
    /// mistaken for a command-line option by the spawned tool.
    #[error("cannot start ssh: {field} '{value}' is ambiguous with command-line option")]
    AmbiguousArgument {
        /// Which component of the connection target was rejected.
        field: &'static str,
        /// The offending value as parsed.
        value: String,
    },

    /// The connection string could not be decomposed into host and path.
    #[error("malformed remote url: {0}")]
    InvalidUrl(String),

    /// A data-transfer action was requested without the matching list
    /// action having established a tunnel first.
    #[error("Must call {expected} before {requested}")]
    OutOfOrder {
        /// The list action that has to come first.
        expected: SmartService,
        /// The action that was actually requested.
        requested: SmartService,
    },

    /// Launching the external SSH tool failed.
    #[error("failed to launch ssh tool: {0}")]
    Spawn(#[source] std::io::Error),

    /// I/O error from the pipes connecting the subprocess.
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// The subprocess exited non-zero and produced diagnostic output.
    #[error("Command exited non-zero ({code}) and returned:\n{stderr}")]
    ProcessFailedWithOutput {
        /// Exit code reported by the operating system.
        code: i32,
        /// Captured stderr text, lossily decoded.
        stderr: String,
    },

    /// The subprocess exited non-zero without any diagnostic output.
    #[error("Command exited non-zero: {code}")]
    ProcessFailed {
        /// Exit code reported by the operating system.
        code: i32,
    },

    /// The subprocess was terminated by a signal, so no exit code exists.
    #[error("Command terminated by signal")]
    TerminatedBySignal,
}

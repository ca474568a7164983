//! git-tunnel: a pluggable Git smart-protocol subtransport that runs
//! upload-pack and receive-pack exchanges through an external SSH
//! executable (OpenSSH, plink, TortoiseGitPlink).
//!
//! Goals
//! - Let a smart-protocol engine speak to `ssh://` remotes without linking
//!   an SSH library: the configured tool is spawned per connection and the
//!   exchange is piped through its stdio.
//! - Keep the call-order contract explicit: a list action establishes the
//!   tunnel, the matching data-transfer action reuses it, disposal reaps
//!   the child and reports how it exited.
//!
//! Core Capabilities
//! - Connection strings: standard `ssh://[user@]host[:port]/path` URLs and
//!   the abbreviated scp form `[user@]host:path`, with percent-unescaping
//!   and an option-injection guard on every parsed component.
//! - Tool dialects: OpenSSH-compatible and Putty-family command lines
//!   (`-p` vs `-P`, `-batch`, console visibility) derived from the
//!   configured tool path.
//! - Streams: blocking duplex byte stream over the child's stdio with
//!   continuous stderr capture; non-zero exits surface as errors carrying
//!   the captured text.
//!
//! Modules
//! - `transport`: URL parsing, command construction, the tunnel stream,
//!   session state machine, facade, and scheme registry.
//! - `config`: serde-friendly tool/override/environment configuration.
//! - `errors`: unified error types.
//!
//! Typical Usage
//! - Look up the `ssh` factory via `transport_registry()`, build the
//!   subtransport with an [`SshToolConfig`], then drive it through
//!   [`SmartSubtransport::action`] with the list action first and close
//!   every stream through [`SmartSubtransport::close_stream`].
//!
//! The smart protocol itself (pkt-line framing, capability negotiation)
//! is owned by the driving engine; this crate moves opaque bytes and
//! manages the subprocess lifecycle.

pub mod config;
pub mod errors;
pub mod transport;

// Core traits and types that external users need to implement/use
pub use config::SshToolConfig;
pub use errors::TunnelError;
pub use transport::{
    ConnectionTarget, ServiceType, SmartService, SmartSubtransport, SshTunnelTransport,
    SubtransportStream, TunnelStream, transport_registry,
};

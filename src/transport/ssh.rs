//! SSH subtransport facade for the Git smart protocol.
//!
//! This is the piece a smart-protocol engine registers under the `ssh`
//! scheme. It dispatches the four protocol actions to the session state
//! machine and owns the immutable configuration: tool profile, optional
//! replacement environment, and per-service command-name overrides. SSH
//! itself (authentication, key exchange) is entirely the external tool's
//! business; this layer only moves opaque bytes.

use std::collections::HashMap;
use std::io::{Read, Write};

use super::command::ToolProfile;
use super::session::TunnelSession;
use super::stream::TunnelStream;
use super::types::{ServiceType, SmartService};
use crate::config::SshToolConfig;
use crate::errors::TunnelError;

/// The duplex stream a subtransport hands to the protocol engine. The
/// engine frames pkt-lines over it; the transport does not interpret the
/// bytes.
pub trait SubtransportStream: Read + Write + std::fmt::Debug {}

impl SubtransportStream for TunnelStream {}

/// The interface a smart-protocol engine drives.
///
/// `action` with a list service establishes the connection and returns a
/// stream borrowed from the subtransport; the matching non-list action
/// returns the same stream again (the URL argument is ignored there, as
/// the connection already exists). `close_stream` disposes the active
/// stream and surfaces how the child exited; `close` is the engine's
/// end-of-connection notification and expects every stream to be closed
/// already.
pub trait SmartSubtransport {
    fn action(
        &mut self,
        url: &str,
        service: SmartService,
    ) -> Result<&mut dyn SubtransportStream, TunnelError>;

    fn close_stream(&mut self) -> Result<(), TunnelError>;

    fn close(&mut self);
}

/// Smart subtransport running the exchange through an external SSH
/// executable. Immutable after construction apart from the single
/// active-stream slot inside the session.
pub struct SshTunnelTransport {
    profile: Option<ToolProfile>,
    environment: Option<HashMap<String, String>>,
    upload_pack_command: Option<String>,
    receive_pack_command: Option<String>,
    session: TunnelSession,
}

impl SshTunnelTransport {
    pub fn new(config: SshToolConfig) -> Self {
        Self {
            profile: config.tool_path.map(ToolProfile::new),
            environment: config.environment,
            upload_pack_command: config.upload_pack_command,
            receive_pack_command: config.receive_pack_command,
            session: TunnelSession::new(),
        }
    }

    /// Whether no stream is currently active.
    pub fn is_idle(&self) -> bool {
        self.session.is_idle()
    }

    fn open_tunnel(
        &mut self,
        url: &str,
        service: ServiceType,
    ) -> Result<&mut TunnelStream, TunnelError> {
        let remote_command = match service {
            ServiceType::UploadPack => self.upload_pack_command.as_deref(),
            ServiceType::ReceivePack => self.receive_pack_command.as_deref(),
        }
        .unwrap_or(service.default_command());

        self.session.open(
            self.profile.as_ref(),
            self.environment.as_ref(),
            url,
            remote_command,
            service,
        )
    }
}

impl SmartSubtransport for SshTunnelTransport {
    fn action(
        &mut self,
        url: &str,
        service: SmartService,
    ) -> Result<&mut dyn SubtransportStream, TunnelError> {
        let stream = match service {
            SmartService::UploadPackLs => self.open_tunnel(url, ServiceType::UploadPack)?,
            SmartService::ReceivePackLs => self.open_tunnel(url, ServiceType::ReceivePack)?,
            SmartService::UploadPack | SmartService::ReceivePack => self.session.reuse(service)?,
        };
        Ok(stream)
    }

    fn close_stream(&mut self) -> Result<(), TunnelError> {
        self.session.close_current()
    }

    fn close(&mut self) {
        debug_assert!(
            self.session.is_idle(),
            "subtransport closed with an active stream"
        );
        if !self.session.is_idle() {
            tracing::warn!("subtransport closed with an active stream");
        }
    }
}

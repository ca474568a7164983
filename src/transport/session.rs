//! At-most-one-active-tunnel session state.
//!
//! The session owns the stream slot. List actions fill it (tearing down a
//! leftover tunnel first), non-list actions borrow it when the service
//! family matches, and disposal empties it unconditionally. The driving
//! engine must close every stream it opened before the session goes away.

use std::collections::HashMap;

use super::command::{ToolProfile, TunnelCommand};
use super::stream::TunnelStream;
use super::types::{ServiceType, SmartService};
use super::url::ConnectionTarget;
use crate::errors::TunnelError;

pub(crate) struct TunnelSession {
    current: Option<TunnelStream>,
}

impl TunnelSession {
    pub(crate) fn new() -> Self {
        Self { current: None }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Establish a fresh tunnel for a list action.
    ///
    /// Setup order: parse the target, require a configured tool, run the
    /// injection guard, build the command, spawn. Any failure leaves the
    /// session idle with everything released.
    pub(crate) fn open(
        &mut self,
        tool: Option<&ToolProfile>,
        environment: Option<&HashMap<String, String>>,
        url: &str,
        remote_command: &str,
        service: ServiceType,
    ) -> Result<&mut TunnelStream, TunnelError> {
        // A list action while a tunnel is live replaces it. The old child
        // is reaped first; its exit status belongs to a session the caller
        // has already abandoned, so a teardown error only gets logged.
        if let Some(previous) = self.current.take() {
            tracing::warn!(url = %previous.url(), "replacing active tunnel on new list action");
            if let Err(err) = previous.close() {
                tracing::warn!(%err, "replaced tunnel closed with error");
            }
        }

        let target = ConnectionTarget::parse(url)?;
        let tool = tool.ok_or(TunnelError::NoToolConfigured)?;
        target.reject_option_like_fields()?;

        let command = TunnelCommand::build(tool, &target, remote_command);
        tracing::debug!(command = %command.render(), "starting ssh tunnel");
        let stream = TunnelStream::spawn(&command, environment, service, url)?;
        Ok(self.current.insert(stream))
    }

    /// Hand back the live tunnel for a non-list action of the same
    /// family. No new process is spawned.
    pub(crate) fn reuse(
        &mut self,
        requested: SmartService,
    ) -> Result<&mut TunnelStream, TunnelError> {
        match self.current.as_mut() {
            Some(stream) if stream.service_type() == requested.service_type() => Ok(stream),
            _ => Err(TunnelError::OutOfOrder {
                expected: requested.list_action(),
                requested,
            }),
        }
    }

    /// Dispose the active tunnel. The slot is empty afterwards no matter
    /// how the child exited.
    pub(crate) fn close_current(&mut self) -> Result<(), TunnelError> {
        match self.current.take() {
            Some(stream) => stream.close(),
            None => Ok(()),
        }
    }
}

impl Drop for TunnelSession {
    fn drop(&mut self) {
        // The protocol engine owns stream lifetimes; a live tunnel here is
        // a caller bug.
        debug_assert!(
            self.current.is_none(),
            "tunnel session dropped with an active stream"
        );
        if self.current.is_some() {
            tracing::warn!("tunnel session dropped with an active stream");
        }
    }
}

//! Launch-command construction for the external SSH tool.
//!
//! The tool's dialect is derived once from its path: Putty-family tools
//! spell the port flag `-P` and accept `-batch`, OpenSSH-compatible tools
//! use `-p`. Arguments are assembled as a structured list and handed to
//! process creation as-is; the quoted single-string rendering exists only
//! for diagnostics.

use std::path::{Path, PathBuf};

use super::types::ConsoleMode;
use super::url::ConnectionTarget;

/// Which external SSH tool is configured, with its dialect derived from
/// the path. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ToolProfile {
    path: PathBuf,
    is_putty: bool,
    is_tortoise_plink: bool,
}

impl ToolProfile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lowered = path.to_string_lossy().to_ascii_lowercase();
        let is_putty = lowered.contains("plink");
        let is_tortoise_plink = lowered.contains("tortoiseplink");
        Self {
            path,
            is_putty,
            is_tortoise_plink,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_putty(&self) -> bool {
        self.is_putty
    }

    /// Putty-family tools may prompt interactively, so they keep a
    /// console; everything else runs detached.
    pub fn console_mode(&self) -> ConsoleMode {
        if self.is_putty {
            ConsoleMode::Visible
        } else {
            ConsoleMode::Detached
        }
    }

    fn port_flag(&self) -> &'static str {
        if self.is_putty { "-P" } else { "-p" }
    }

    /// TortoiseGitPlink manages its own prompting and rejects `-batch`.
    fn wants_batch_flag(&self) -> bool {
        self.is_putty && !self.is_tortoise_plink
    }
}

/// A fully assembled launch command: program plus argument list, ready
/// for process creation.
#[derive(Debug, Clone)]
pub struct TunnelCommand {
    program: PathBuf,
    args: Vec<String>,
    console_mode: ConsoleMode,
}

impl TunnelCommand {
    /// Assemble the argument list for `remote_command` against `target`.
    ///
    /// The target must already have passed the option-injection guard;
    /// nothing here re-validates it.
    pub fn build(profile: &ToolProfile, target: &ConnectionTarget, remote_command: &str) -> Self {
        let mut args = Vec::with_capacity(6);
        if let Some(port) = &target.port {
            args.push(profile.port_flag().to_string());
            args.push(port.clone());
        }
        if profile.wants_batch_flag() {
            args.push("-batch".to_string());
        }
        let destination = match &target.username {
            Some(username) => format!("{username}@{}", target.host),
            None => target.host.clone(),
        };
        args.push(destination);
        args.push(remote_command.to_string());
        args.push(target.path.clone());

        Self {
            program: profile.path().to_path_buf(),
            args,
            console_mode: profile.console_mode(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn console_mode(&self) -> ConsoleMode {
        self.console_mode
    }

    /// Single-string form for logs and error messages. The tool path,
    /// destination, and repository path are quoted; spawning never goes
    /// through this string.
    pub fn render(&self) -> String {
        let mut out = format!("\"{}\"", self.program.display());
        let last = self.args.len() - 1;
        for (i, arg) in self.args.iter().enumerate() {
            if i == last || i == last - 2 {
                out.push_str(&format!(" \"{arg}\""));
            } else {
                out.push_str(&format!(" {arg}"));
            }
        }
        out
    }
}

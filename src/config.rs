use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration handed to the SSH subtransport factory.
///
/// Everything here is fixed for the lifetime of the transport instance:
/// the path of the external SSH executable, optional replacements for the
/// remote `git-upload-pack`/`git-receive-pack` command names, and an
/// optional environment block the subprocess is spawned with instead of
/// the inherited one.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SshToolConfig {
    /// Path of the SSH executable to spawn. `None` means the transport is
    /// unusable and every connection attempt fails with a configuration
    /// error.
    pub tool_path: Option<PathBuf>,
    /// Remote command run for fetch negotiation instead of
    /// `git-upload-pack`.
    pub upload_pack_command: Option<String>,
    /// Remote command run for push negotiation instead of
    /// `git-receive-pack`.
    pub receive_pack_command: Option<String>,
    /// Replacement environment block for the spawned tool. `None` inherits
    /// the parent environment.
    pub environment: Option<HashMap<String, String>>,
}

impl SshToolConfig {
    /// Config pointing at the given executable, with defaults otherwise.
    pub fn with_tool(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: Some(tool_path.into()),
            ..Default::default()
        }
    }
}

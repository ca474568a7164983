use std::fmt;

/// Default remote command for fetch negotiation.
pub const CMD_UPLOAD_PACK: &str = "git-upload-pack";
/// Default remote command for push negotiation.
pub const CMD_RECEIVE_PACK: &str = "git-receive-pack";

/// The two remote service families of the smart protocol.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ServiceType {
    UploadPack,
    ReceivePack,
}

impl ServiceType {
    /// Default remote command name for this service family.
    pub fn default_command(&self) -> &'static str {
        match self {
            ServiceType::UploadPack => CMD_UPLOAD_PACK,
            ServiceType::ReceivePack => CMD_RECEIVE_PACK,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.default_command())
    }
}

/// The four actions a smart-protocol engine dispatches to a subtransport.
///
/// The `*Ls` variants are the preparatory ref-advertisement steps; they
/// establish the connection. The bare variants reuse it for the actual
/// pack exchange.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SmartService {
    UploadPackLs,
    UploadPack,
    ReceivePackLs,
    ReceivePack,
}

impl SmartService {
    /// Service family this action belongs to.
    pub fn service_type(&self) -> ServiceType {
        match self {
            SmartService::UploadPackLs | SmartService::UploadPack => ServiceType::UploadPack,
            SmartService::ReceivePackLs | SmartService::ReceivePack => ServiceType::ReceivePack,
        }
    }

    /// Whether this is a connection-establishing list action.
    pub fn is_list(&self) -> bool {
        matches!(self, SmartService::UploadPackLs | SmartService::ReceivePackLs)
    }

    /// The list action that must precede this action.
    pub fn list_action(&self) -> SmartService {
        match self.service_type() {
            ServiceType::UploadPack => SmartService::UploadPackLs,
            ServiceType::ReceivePack => SmartService::ReceivePackLs,
        }
    }
}

impl fmt::Display for SmartService {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SmartService::UploadPackLs => "UPLOADPACK_LS",
            SmartService::UploadPack => "UPLOADPACK",
            SmartService::ReceivePackLs => "RECEIVEPACK_LS",
            SmartService::ReceivePack => "RECEIVEPACK",
        };
        f.write_str(name)
    }
}

/// Console behavior for the spawned tool.
///
/// Putty-family tools may need to prompt for host-key confirmation or a
/// passphrase, so they get a visible console; everything else runs fully
/// detached. Only meaningful on Windows, a no-op elsewhere.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConsoleMode {
    Visible,
    Detached,
}

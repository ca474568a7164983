//! Process-wide subtransport registry.
//!
//! Maps a URL scheme to the factory that builds a subtransport for it.
//! Built lazily on first access and immutable afterwards; the hosting
//! engine looks up the scheme of an incoming URL and calls the factory
//! with its tool configuration.

use std::sync::OnceLock;

use super::ssh::{SmartSubtransport, SshTunnelTransport};
use crate::config::SshToolConfig;

/// Builds a subtransport instance for one connection.
pub type SubtransportFactory = fn(SshToolConfig) -> Box<dyn SmartSubtransport>;

/// Immutable scheme → factory table.
pub struct TransportRegistry {
    entries: Vec<(&'static str, SubtransportFactory)>,
}

impl TransportRegistry {
    fn builtin() -> Self {
        fn ssh_factory(config: SshToolConfig) -> Box<dyn SmartSubtransport> {
            Box::new(SshTunnelTransport::new(config))
        }

        // The ssh scheme aliases Git accepts all resolve to the same
        // tunnel transport.
        Self {
            entries: vec![
                ("ssh", ssh_factory as SubtransportFactory),
                ("ssh+git", ssh_factory),
                ("git+ssh", ssh_factory),
            ],
        }
    }

    /// Factory registered for `scheme`, matched case-insensitively.
    pub fn lookup(&self, scheme: &str) -> Option<SubtransportFactory> {
        self.entries
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(scheme))
            .map(|(_, factory)| *factory)
    }

    /// All registered schemes.
    pub fn schemes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(scheme, _)| *scheme)
    }
}

static REGISTRY: OnceLock<TransportRegistry> = OnceLock::new();

/// Accessor for the process-wide registry.
pub fn transport_registry() -> &'static TransportRegistry {
    REGISTRY.get_or_init(TransportRegistry::builtin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TunnelError;
    use crate::transport::types::SmartService;

    #[test]
    fn looks_up_ssh_schemes_case_insensitively() {
        let registry = transport_registry();
        assert!(registry.lookup("ssh").is_some());
        assert!(registry.lookup("SSH").is_some());
        assert!(registry.lookup("git+ssh").is_some());
        assert!(registry.lookup("http").is_none());
    }

    #[test]
    fn factory_builds_a_working_subtransport() {
        let factory = transport_registry().lookup("ssh").unwrap();
        let mut transport = factory(SshToolConfig::default());
        // No tool configured, so the first list action must fail with the
        // configuration error, proving dispatch reached the tunnel logic.
        let err = transport
            .action("ssh://example.com/repo.git", SmartService::UploadPackLs)
            .unwrap_err();
        assert!(matches!(err, TunnelError::NoToolConfigured));
        transport.close();
    }
}

/// Git smart-protocol SSH tunnel transport.
///
/// This module implements a pluggable subtransport that performs the
/// smart-protocol exchange over an external SSH executable instead of a
/// built-in SSH library: URL decomposition, dialect-aware command
/// construction, subprocess stream adaptation, and the session state
/// machine that enforces the list-before-action call order.
pub mod command;
pub mod registry;
mod session;
pub mod ssh;
pub mod stream;
pub mod types;
pub mod url;

// Re-export main interfaces
pub use command::{ToolProfile, TunnelCommand};
pub use registry::{SubtransportFactory, TransportRegistry, transport_registry};
pub use ssh::{SmartSubtransport, SshTunnelTransport, SubtransportStream};
pub use stream::TunnelStream;
pub use types::{ConsoleMode, ServiceType, SmartService};
pub use url::ConnectionTarget;

//! Realtime runtime: session registry, per-session state, and the broker.

pub mod broker;
pub mod host_endpoint;
pub mod participant_endpoint;
pub mod session_registry;
pub mod session_state;

pub use broker::{Broker, Subscriber};
pub use session_registry::SessionRegistry;
pub use session_state::{HostFanIn, SessionState};

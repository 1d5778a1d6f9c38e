//! Host boundary: the call contract, its wire types and transports.

pub mod host;
pub mod ipc;
pub mod sim;
pub mod types;

pub use host::{Host, HostCall, HostError, HostResult};
pub use ipc::{serve_host, IpcHost};
pub use sim::SimulatedHost;
pub use types::{AutostartRequest, PortStatus, StatsSnapshot, ToggleRequest};

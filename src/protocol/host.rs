//! Contract of the host process.
//!
//! The panel never enumerates ports, opens serial devices, samples system
//! stats or touches OS autostart registration itself. All of that lives behind
//! the [`Host`] trait, which is implemented by a socket transport
//! ([`crate::protocol::ipc::IpcHost`]) and by an in-process simulator
//! ([`crate::protocol::sim::SimulatedHost`]).

use async_trait::async_trait;
use derive_more::Display;
use strum::{AsRefStr, EnumIter};

use super::types::{AutostartRequest, PortStatus, ToggleRequest};

/// Wire names of the remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum HostCall {
    CheckAutostart,
    SetAutostart,
    GetPorts,
    GetStats,
    ToggleConnection,
}

/// Failure of a host call.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum HostError {
    /// The host handled the call and returned an error text. Displayed verbatim.
    #[display("{_0}")]
    Rejected(String),
    /// The call never produced a response (socket error, timeout).
    #[display("host unreachable: {_0}")]
    Transport(String),
    /// The host answered with something that does not match the contract.
    #[display("malformed host response: {_0}")]
    Decode(String),
}

impl std::error::Error for HostError {}

impl HostError {
    /// Text shown to the user when this failure is surfaced.
    pub fn user_text(&self) -> String {
        self.to_string()
    }
}

pub type HostResult<T> = Result<T, HostError>;

#[async_trait]
pub trait Host: Send + Sync {
    async fn check_autostart(&self) -> HostResult<bool>;

    async fn set_autostart(&self, request: AutostartRequest) -> HostResult<()>;

    async fn get_ports(&self) -> HostResult<PortStatus>;

    /// Stats as JSON text, `"{}"` while the host has no sample yet.
    async fn get_stats(&self) -> HostResult<String>;

    async fn toggle_connection(&self, request: ToggleRequest) -> HostResult<()>;
}

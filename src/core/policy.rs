//! What to do when a host call fails.
//!
//! Poll failures are stale-but-harmless and get dropped; failures of actions
//! the user is waiting on get surfaced, reverted or disable the control.

use crate::protocol::host::HostCall;

/// Panel operations that reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    RefreshPorts,
    RefreshStats,
    Connect,
    Disconnect,
    InitAutostart,
    SetAutostart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Leave view and state as they are; the next tick corrects it.
    Ignore,
    /// Show the host's error text in the error tone.
    Surface,
    /// Undo the optimistic change the user made.
    Revert,
    /// Treat the feature as unavailable and disable its control.
    Disable,
}

impl Operation {
    pub fn call(self) -> HostCall {
        match self {
            Operation::RefreshPorts => HostCall::GetPorts,
            Operation::RefreshStats => HostCall::GetStats,
            Operation::Connect | Operation::Disconnect => HostCall::ToggleConnection,
            Operation::InitAutostart => HostCall::CheckAutostart,
            Operation::SetAutostart => HostCall::SetAutostart,
        }
    }

    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Operation::RefreshPorts | Operation::RefreshStats => FailurePolicy::Ignore,
            // A failed disconnect leaves the panel claiming "Connected" with no
            // message. Kept as-is; see DESIGN.md.
            Operation::Disconnect => FailurePolicy::Ignore,
            Operation::Connect => FailurePolicy::Surface,
            Operation::SetAutostart => FailurePolicy::Revert,
            Operation::InitAutostart => FailurePolicy::Disable,
        }
    }

    /// Poll operations run on a timer; the rest are user actions.
    pub fn is_poll(self) -> bool {
        matches!(self, Operation::RefreshPorts | Operation::RefreshStats)
    }
}

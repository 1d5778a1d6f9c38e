//! Tinytosh panel — status panel for the Tinytosh serial bridge
//!
//! The panel polls a host process for serial-port availability, connection
//! state and system stats, and reconciles them into a view model. The host
//! does the actual serial I/O and sampling; this crate only talks to it.
//!
//! - [`protocol`]: the host call contract, wire types, the local-socket
//!   transport and an in-process simulated host.
//! - [`core`]: reconciler, view model, failure policy, runtime loop and
//!   configuration.
//! - [`console`]: a line-oriented frontend driving the runtime.

pub mod cli;
pub mod console;
pub mod core;
pub mod protocol;

pub use crate::core::{run_panel, Reconciler, RuntimeConfig, ViewModel};
pub use protocol::{Host, HostError, IpcHost, SimulatedHost};

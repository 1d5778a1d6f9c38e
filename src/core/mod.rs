//! Panel logic, independent of any frontend
//!
//! - Status reconciliation against host snapshots
//! - View model the reconciler drives
//! - Failure policy for host calls
//! - Message bus and runtime loop shared by frontends
//! - Configuration

pub mod bus;
pub mod config;
pub mod format;
pub mod policy;
pub mod reconciler;
pub mod runtime;
pub mod task_manager;
pub mod view;

pub use bus::{Bus, CoreEnds, CoreToUi, UiToCore};
pub use config::{HostMode, PanelConfig};
pub use policy::{FailurePolicy, Operation};
pub use reconciler::{ConnectionState, Reconciler, Transition};
pub use runtime::{run_panel, RuntimeConfig};
pub use view::{ButtonMode, Tone, ViewModel};

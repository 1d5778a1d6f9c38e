//! Status reconciler.
//!
//! Owns the panel's connection state and the view model, and folds host
//! snapshots into them. The connection state is a two-state machine; view
//! changes tied to it happen only on a transition, never on every tick where
//! the state merely holds.
//!
//! Every operation comes in two halves so a caller can keep host calls in
//! flight while doing other work: a request half that decides what to ask the
//! host (`begin_toggle`, `request_autostart`) and an apply half that consumes
//! the host's result (`apply_ports`, `apply_stats_payload`, `finish_toggle`,
//! ...). The `async` methods at the bottom run both halves back to back.

use crate::{
    core::{
        format::{format_percent, format_rate},
        policy::{FailurePolicy, Operation},
        view::{
            ids, ButtonMode, Checkbox, Tone, ViewModel, DISCONNECTED_TEXT, WAITING_TEXT,
        },
    },
    protocol::{
        host::{Host, HostError, HostResult},
        types::{AutostartRequest, PortStatus, StatsSnapshot, ToggleRequest},
    },
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }

    pub fn port(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected(port) => Some(port),
            ConnectionState::Disconnected => None,
        }
    }
}

/// A connection state edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Connected(String),
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortsOutcome {
    /// Host call failed; nothing changed.
    Skipped(HostError),
    Applied { transition: Option<Transition> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsOutcome {
    Skipped(HostError),
    /// Host has no sample yet.
    NoData,
    /// Payload was not a stats object; nothing changed.
    Invalid(String),
    /// Number of display fields the payload carried.
    Applied(usize),
}

/// A toggle request handed to the host, remembered until its result arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub operation: Operation,
    pub request: ToggleRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// No real port selected; nothing was sent.
    Refused,
    Connected(String),
    Disconnected,
    /// Connect failed and the host's text is on the status line.
    ConnectFailed(String),
    /// Disconnect failed; the panel still shows the connection.
    DisconnectFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutostartOutcome {
    Bound(bool),
    Unavailable,
    /// Checkbox is disabled; nothing was sent.
    Refused,
    Persisted(bool),
    Reverted(bool),
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    state: ConnectionState,
    view: ViewModel,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    /// User picked a port in the selector.
    pub fn select_port(&mut self, port: &str) -> bool {
        if self.view.port_select.disabled {
            log::debug!("select_port({port}) ignored: selector disabled while connected");
            return false;
        }
        if !self.view.port_select.options.iter().any(|p| p == port) {
            log::debug!("select_port({port}) ignored: not a listed port");
            return false;
        }
        self.view.force_select(port)
    }

    fn failure(&self, operation: Operation, err: &HostError) -> FailurePolicy {
        let policy = operation.failure_policy();
        if operation.is_poll() {
            log::trace!("{operation} failed ({policy:?}): {err}");
        } else {
            log::warn!("{operation} failed ({policy:?}): {err}");
        }
        policy
    }

    fn show_connected(&mut self, port: &str) {
        self.view.set_button(ButtonMode::Disconnect);
        self.view.set_selector_disabled(true);
        self.view.set_status(format!("Connected to {port}"), Tone::Success);
    }

    fn show_disconnected(&mut self) {
        self.view.set_button(ButtonMode::Connect);
        self.view.set_selector_disabled(false);
    }

    pub fn apply_ports(&mut self, result: HostResult<PortStatus>) -> PortsOutcome {
        let status = match result {
            Ok(status) => status,
            Err(err) => {
                self.failure(Operation::RefreshPorts, &err);
                return PortsOutcome::Skipped(err);
            }
        };

        self.view.set_port_options(&status.ports);

        let transition = match status.connected_port() {
            Some(port) => {
                if self.state.is_connected() {
                    None
                } else {
                    log::info!("host reports connection on {port}");
                    self.state = ConnectionState::Connected(port.to_string());
                    self.view.force_select(port);
                    self.show_connected(port);
                    Some(Transition::Connected(port.to_string()))
                }
            }
            None => {
                let transition = if self.state.is_connected() {
                    log::info!("host reports connection lost");
                    self.state = ConnectionState::Disconnected;
                    self.show_disconnected();
                    Some(Transition::Disconnected)
                } else {
                    None
                };

                match status.message() {
                    Some(text) => {
                        let tone = if text.to_lowercase().contains("failed") {
                            Tone::Error
                        } else {
                            Tone::Neutral
                        };
                        self.view.set_status(text, tone);
                    }
                    None => {
                        self.view.set_status(WAITING_TEXT, Tone::Neutral);
                    }
                }
                transition
            }
        };

        PortsOutcome::Applied { transition }
    }

    pub fn apply_stats_payload(&mut self, result: HostResult<String>) -> StatsOutcome {
        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                self.failure(Operation::RefreshStats, &err);
                return StatsOutcome::Skipped(err);
            }
        };
        if StatsSnapshot::is_empty_payload(&raw) {
            return StatsOutcome::NoData;
        }
        let stats = match StatsSnapshot::parse(&raw) {
            Ok(stats) => stats,
            Err(err) => {
                log::trace!("stats payload rejected: {err}");
                return StatsOutcome::Invalid(err.to_string());
            }
        };

        let mut fields = 0;
        if let Some(cpu) = stats.cpu_percent {
            self.view.set_text(ids::CPU, format_percent(cpu));
            fields += 1;
        }
        if let Some(kb) = stats.net_down_kb {
            let (value, unit) = format_rate(kb);
            self.view.set_text(ids::DL_VAL, value);
            self.view.set_text(ids::DL_UNIT, unit.to_string());
            fields += 1;
        }
        if let Some(mem) = stats.mem_percent {
            self.view.set_text(ids::RAM, format_percent(mem));
            fields += 1;
        }
        if let Some(disk) = stats.disk_percent {
            self.view.set_text(ids::DISK, format_percent(disk));
            fields += 1;
        }
        StatsOutcome::Applied(fields)
    }

    /// Decide what the action button asks of the host. `None` when
    /// disconnected with no real port selected.
    pub fn begin_toggle(&self) -> Option<PendingToggle> {
        if self.state.is_connected() {
            return Some(PendingToggle {
                operation: Operation::Disconnect,
                request: ToggleRequest::disconnect(),
            });
        }
        match self.view.port_select.selected_port() {
            Some(port) => Some(PendingToggle {
                operation: Operation::Connect,
                request: ToggleRequest::connect(port),
            }),
            None => {
                log::debug!("toggle refused: no port selected");
                None
            }
        }
    }

    pub fn finish_toggle(&mut self, pending: PendingToggle, result: HostResult<()>) -> ToggleOutcome {
        match (pending.operation, result) {
            (Operation::Connect, Ok(())) => {
                let port = pending.request.port_name;
                log::info!("connected to {port}");
                self.state = ConnectionState::Connected(port.clone());
                self.show_connected(&port);
                ToggleOutcome::Connected(port)
            }
            (Operation::Disconnect, Ok(())) => {
                log::info!("disconnected");
                self.state = ConnectionState::Disconnected;
                self.show_disconnected();
                self.view.set_status(DISCONNECTED_TEXT, Tone::Neutral);
                ToggleOutcome::Disconnected
            }
            (operation, Err(err)) => match self.failure(operation, &err) {
                FailurePolicy::Surface => {
                    let text = err.user_text();
                    self.view.set_status(text.clone(), Tone::Error);
                    ToggleOutcome::ConnectFailed(text)
                }
                _ => ToggleOutcome::DisconnectFailed,
            },
            (operation, Ok(())) => {
                log::warn!("unexpected toggle operation {operation}");
                ToggleOutcome::Refused
            }
        }
    }

    pub fn apply_autostart_init(&mut self, result: HostResult<bool>) -> AutostartOutcome {
        match result {
            Ok(enabled) => {
                self.view.set_autostart(Checkbox {
                    checked: enabled,
                    disabled: false,
                });
                AutostartOutcome::Bound(enabled)
            }
            Err(err) => {
                self.failure(Operation::InitAutostart, &err);
                let checked = self.view.autostart.checked;
                self.view.set_autostart(Checkbox {
                    checked,
                    disabled: true,
                });
                AutostartOutcome::Unavailable
            }
        }
    }

    /// User flipped the autostart checkbox to `enable`.
    pub fn request_autostart(&mut self, enable: bool) -> Option<AutostartRequest> {
        if self.view.autostart.disabled {
            log::debug!("autostart toggle refused: checkbox disabled");
            return None;
        }
        self.view.set_autostart(Checkbox {
            checked: enable,
            disabled: false,
        });
        Some(AutostartRequest { enable })
    }

    pub fn finish_autostart(&mut self, request: AutostartRequest, result: HostResult<()>) -> AutostartOutcome {
        match result {
            Ok(()) => AutostartOutcome::Persisted(request.enable),
            Err(err) => {
                self.failure(Operation::SetAutostart, &err);
                let reverted = !request.enable;
                self.view.set_autostart(Checkbox {
                    checked: reverted,
                    disabled: false,
                });
                AutostartOutcome::Reverted(reverted)
            }
        }
    }

    pub async fn refresh_ports<H: Host + ?Sized>(&mut self, host: &H) -> PortsOutcome {
        let result = host.get_ports().await;
        self.apply_ports(result)
    }

    pub async fn refresh_stats<H: Host + ?Sized>(&mut self, host: &H) -> StatsOutcome {
        let result = host.get_stats().await;
        self.apply_stats_payload(result)
    }

    pub async fn toggle_connection<H: Host + ?Sized>(&mut self, host: &H) -> ToggleOutcome {
        let Some(pending) = self.begin_toggle() else {
            return ToggleOutcome::Refused;
        };
        let result = host.toggle_connection(pending.request.clone()).await;
        self.finish_toggle(pending, result)
    }

    pub async fn init_autostart<H: Host + ?Sized>(&mut self, host: &H) -> AutostartOutcome {
        let result = host.check_autostart().await;
        self.apply_autostart_init(result)
    }

    pub async fn set_autostart<H: Host + ?Sized>(&mut self, host: &H, enable: bool) -> AutostartOutcome {
        let Some(request) = self.request_autostart(enable) else {
            return AutostartOutcome::Refused;
        };
        let result = host.set_autostart(request).await;
        self.finish_autostart(request, result)
    }
}

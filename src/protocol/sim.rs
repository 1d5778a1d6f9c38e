//! In-process stand-in for the host process.
//!
//! Mirrors the observable behavior of the real bridge host: the status line
//! starts as "Waiting for connection...", a failed open reports
//! "Connection failed: {reason}", a manual disconnect reports "Disconnected",
//! and `get_stats` returns `"{}"` until the first sample has been taken.
//! Failures can be injected per call, and every call is counted.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;

use super::{
    host::{Host, HostCall, HostError, HostResult},
    types::{AutostartRequest, PortStatus, StatsSnapshot, ToggleRequest},
};

const WAITING: &str = "Waiting for connection...";

#[derive(Debug, Default)]
struct SimState {
    ports: Vec<String>,
    active_port: Option<String>,
    status_msg: String,
    autostart: bool,
    stats: Option<StatsSnapshot>,
    samples: u64,
    /// Ports whose open attempt fails, with the reason reported.
    unopenable: HashMap<String, String>,
    /// Injected failures, consumed one per call.
    failures: HashMap<HostCall, Vec<HostError>>,
    calls: HashMap<HostCall, usize>,
}

#[derive(Debug)]
pub struct SimulatedHost {
    state: Mutex<SimState>,
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl SimulatedHost {
    pub fn new<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Mutex::new(SimState {
                ports: ports.into_iter().map(Into::into).collect(),
                status_msg: WAITING.to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn set_ports<I, S>(&self, ports: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut st = self.state.lock();
        st.ports = ports.into_iter().map(Into::into).collect();
        if let Some(active) = st.active_port.clone() {
            if !st.ports.contains(&active) {
                log::info!("sim: {active} vanished, dropping connection");
                st.active_port = None;
                st.status_msg.clear();
            }
        }
    }

    /// Attach to `port` as if the host's own auto-scan had found it.
    pub fn attach(&self, port: &str) {
        let mut st = self.state.lock();
        st.active_port = Some(port.to_string());
        st.status_msg.clear();
    }

    /// Drop the connection as if the device had been unplugged mid-write.
    pub fn detach(&self) {
        let mut st = self.state.lock();
        st.active_port = None;
        st.status_msg.clear();
    }

    pub fn set_status_text(&self, text: &str) {
        self.state.lock().status_msg = text.to_string();
    }

    pub fn set_autostart_flag(&self, enabled: bool) {
        self.state.lock().autostart = enabled;
    }

    pub fn autostart_flag(&self) -> bool {
        self.state.lock().autostart
    }

    pub fn active_port(&self) -> Option<String> {
        self.state.lock().active_port.clone()
    }

    /// Make opening `port` fail with "Connection failed: {reason}".
    pub fn refuse_port(&self, port: &str, reason: &str) {
        self.state
            .lock()
            .unopenable
            .insert(port.to_string(), reason.to_string());
    }

    /// Queue a failure for the next `call`.
    pub fn fail_next(&self, call: HostCall, error: HostError) {
        self.state
            .lock()
            .failures
            .entry(call)
            .or_default()
            .push(error);
    }

    /// Replace the current stats sample. `None` reverts to the empty payload.
    pub fn set_stats(&self, stats: Option<StatsSnapshot>) {
        self.state.lock().stats = stats;
    }

    /// Produce a synthetic stats sample, as the host's sampler thread does once per second.
    pub fn sample(&self) {
        let mut st = self.state.lock();
        st.samples += 1;
        let n = st.samples as f64;
        st.stats = Some(StatsSnapshot {
            cpu_percent: Some((n * 7.3) % 100.0),
            net_down_kb: Some((n * 377.0) % 4096.0),
            mem_percent: Some(35.0 + (n % 10.0)),
            disk_percent: Some(61.0),
        });
    }

    pub fn calls(&self, call: HostCall) -> usize {
        self.state.lock().calls.get(&call).copied().unwrap_or(0)
    }

    fn enter(&self, call: HostCall) -> HostResult<parking_lot::MutexGuard<'_, SimState>> {
        let mut st = self.state.lock();
        *st.calls.entry(call).or_default() += 1;
        if let Some(queue) = st.failures.get_mut(&call) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        Ok(st)
    }
}

#[async_trait]
impl Host for SimulatedHost {
    async fn check_autostart(&self) -> HostResult<bool> {
        let st = self.enter(HostCall::CheckAutostart)?;
        Ok(st.autostart)
    }

    async fn set_autostart(&self, request: AutostartRequest) -> HostResult<()> {
        let mut st = self.enter(HostCall::SetAutostart)?;
        st.autostart = request.enable;
        Ok(())
    }

    async fn get_ports(&self) -> HostResult<PortStatus> {
        let st = self.enter(HostCall::GetPorts)?;
        Ok(PortStatus {
            ports: st.ports.clone(),
            connected: st.active_port.clone(),
            status_text: Some(st.status_msg.clone()),
        })
    }

    async fn get_stats(&self) -> HostResult<String> {
        let st = self.enter(HostCall::GetStats)?;
        match st.stats {
            Some(stats) => serde_json::to_string(&stats)
                .map_err(|err| HostError::Rejected(err.to_string())),
            None => Ok(json!({}).to_string()),
        }
    }

    async fn toggle_connection(&self, request: ToggleRequest) -> HostResult<()> {
        let mut st = self.enter(HostCall::ToggleConnection)?;
        if !request.connect {
            st.active_port = None;
            st.status_msg = "Disconnected".to_string();
            return Ok(());
        }

        let reason = if let Some(reason) = st.unopenable.get(&request.port_name) {
            Some(reason.clone())
        } else if !st.ports.contains(&request.port_name) {
            Some("No such file or directory".to_string())
        } else {
            None
        };

        match reason {
            None => {
                st.active_port = Some(request.port_name);
                st.status_msg.clear();
                Ok(())
            }
            Some(reason) => {
                let msg = format!("Connection failed: {reason}");
                st.status_msg = msg.clone();
                Err(HostError::Rejected(msg))
            }
        }
    }
}

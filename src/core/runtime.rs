//! Panel runtime loop
//!
//! One task owns the [`Reconciler`] and is the only place its state changes.
//! Host calls run concurrently as futures; their results are applied back on
//! this task, so timers and user input keep being serviced while a call is
//! outstanding.

use anyhow::Result;
use futures::{future::BoxFuture, stream::FuturesUnordered, FutureExt, StreamExt};
use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{
    bus::{CoreEnds, CoreToUi, UiToCore},
    config::PollingConfig,
    reconciler::{PendingToggle, Reconciler},
};
use crate::protocol::{
    host::{Host, HostResult},
    types::{AutostartRequest, PortStatus},
};

/// Configuration for the panel runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub ports_interval: Duration,
    pub stats_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        PollingConfig::default().into()
    }
}

impl From<PollingConfig> for RuntimeConfig {
    fn from(polling: PollingConfig) -> Self {
        Self {
            ports_interval: polling.ports_interval(),
            stats_interval: polling.stats_interval(),
        }
    }
}

/// Result of a host call, tagged with what it was for.
enum Completion {
    Ports(HostResult<PortStatus>),
    Stats(HostResult<String>),
    Toggle(PendingToggle, HostResult<()>),
    AutostartInit(HostResult<bool>),
    AutostartSet(AutostartRequest, HostResult<()>),
}

#[derive(Default)]
struct InFlight {
    ports: bool,
    stats: bool,
}

/// Run the panel until `Quit` arrives or the UI side hangs up. Both are a
/// clean stop.
///
/// Autostart state and the first port snapshot are requested immediately;
/// after that ports and stats are polled on their own intervals. Returns the
/// reconciler so callers can inspect the final state.
pub async fn run_panel(
    host: Arc<dyn Host>,
    config: RuntimeConfig,
    ends: CoreEnds,
) -> Result<Reconciler> {
    let CoreEnds { ui_rx, core_tx } = ends;
    let mut reconciler = Reconciler::new();
    let mut pending: FuturesUnordered<BoxFuture<'static, Completion>> = FuturesUnordered::new();
    let mut in_flight = InFlight::default();

    let start = Instant::now();
    let mut ports_tick = interval_at(start + config.ports_interval, config.ports_interval);
    let mut stats_tick = interval_at(start + config.stats_interval, config.stats_interval);
    ports_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    stats_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::info!(
        "panel runtime started (ports every {:?}, stats every {:?})",
        config.ports_interval,
        config.stats_interval
    );

    pending.push(autostart_init(host.clone()));
    pending.push(ports_call(host.clone()));
    in_flight.ports = true;

    let mut last_published = reconciler.view().revision;
    if !publish(&core_tx, &reconciler) {
        return Ok(reconciler);
    }

    loop {
        tokio::select! {
            _ = ports_tick.tick() => {
                if in_flight.ports {
                    log::trace!("ports tick skipped: previous call still outstanding");
                } else {
                    pending.push(ports_call(host.clone()));
                    in_flight.ports = true;
                }
            }
            _ = stats_tick.tick() => {
                if in_flight.stats {
                    log::trace!("stats tick skipped: previous call still outstanding");
                } else {
                    pending.push(stats_call(host.clone()));
                    in_flight.stats = true;
                }
            }
            Some(done) = pending.next(), if !pending.is_empty() => {
                match done {
                    Completion::Ports(result) => {
                        in_flight.ports = false;
                        let outcome = reconciler.apply_ports(result);
                        log::trace!("ports applied: {outcome:?}");
                    }
                    Completion::Stats(result) => {
                        in_flight.stats = false;
                        let outcome = reconciler.apply_stats_payload(result);
                        log::trace!("stats applied: {outcome:?}");
                    }
                    Completion::Toggle(toggle, result) => {
                        let outcome = reconciler.finish_toggle(toggle, result);
                        log::debug!("toggle finished: {outcome:?}");
                    }
                    Completion::AutostartInit(result) => {
                        let outcome = reconciler.apply_autostart_init(result);
                        log::debug!("autostart bound: {outcome:?}");
                    }
                    Completion::AutostartSet(request, result) => {
                        let outcome = reconciler.finish_autostart(request, result);
                        log::debug!("autostart set: {outcome:?}");
                    }
                }
            }
            msg = ui_rx.recv_async() => {
                match msg {
                    Ok(UiToCore::Quit) | Err(_) => {
                        log::info!("Received quit signal, abandoning {} in-flight host call(s)", pending.len());
                        let _ = core_tx.send(CoreToUi::Quit);
                        return Ok(reconciler);
                    }
                    Ok(UiToCore::Toggle) => {
                        if let Some(toggle) = reconciler.begin_toggle() {
                            pending.push(toggle_call(host.clone(), toggle));
                        }
                    }
                    Ok(UiToCore::SelectPort(port)) => {
                        reconciler.select_port(&port);
                    }
                    Ok(UiToCore::SetAutostart(enable)) => {
                        if let Some(request) = reconciler.request_autostart(enable) {
                            pending.push(autostart_set(host.clone(), request));
                        }
                    }
                }
            }
        }

        let revision = reconciler.view().revision;
        if revision != last_published {
            last_published = revision;
            if !publish(&core_tx, &reconciler) {
                return Ok(reconciler);
            }
        }
    }
}

/// Returns false once the UI has gone away.
fn publish(core_tx: &flume::Sender<CoreToUi>, reconciler: &Reconciler) -> bool {
    match core_tx.send(CoreToUi::ViewChanged(Box::new(reconciler.view().clone()))) {
        Ok(()) => true,
        Err(_) => {
            log::info!("UI receiver closed, stopping panel runtime");
            false
        }
    }
}

fn ports_call(host: Arc<dyn Host>) -> BoxFuture<'static, Completion> {
    async move { Completion::Ports(host.get_ports().await) }.boxed()
}

fn stats_call(host: Arc<dyn Host>) -> BoxFuture<'static, Completion> {
    async move { Completion::Stats(host.get_stats().await) }.boxed()
}

fn toggle_call(host: Arc<dyn Host>, toggle: PendingToggle) -> BoxFuture<'static, Completion> {
    async move {
        let result = host.toggle_connection(toggle.request.clone()).await;
        Completion::Toggle(toggle, result)
    }
    .boxed()
}

fn autostart_init(host: Arc<dyn Host>) -> BoxFuture<'static, Completion> {
    async move { Completion::AutostartInit(host.check_autostart().await) }.boxed()
}

fn autostart_set(host: Arc<dyn Host>, request: AutostartRequest) -> BoxFuture<'static, Completion> {
    async move { Completion::AutostartSet(request, host.set_autostart(request).await) }.boxed()
}

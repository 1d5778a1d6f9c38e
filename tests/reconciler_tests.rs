//! Reconciler behavior against the simulated host

use tinytosh::{
    core::{
        reconciler::{
            AutostartOutcome, ConnectionState, PortsOutcome, Reconciler, StatsOutcome,
            ToggleOutcome, Transition,
        },
        view::{ids, ButtonMode, Tone, NO_PORTS_PLACEHOLDER, WAITING_TEXT},
    },
    protocol::{HostCall, HostError, SimulatedHost, StatsSnapshot},
};

async fn connected_to(host: &SimulatedHost, port: &str) -> Reconciler {
    host.attach(port);
    let mut rec = Reconciler::new();
    rec.refresh_ports(host).await;
    assert!(rec.is_connected());
    rec
}

#[tokio::test]
async fn ports_without_connection_are_listed_and_selector_stays_enabled() {
    let host = SimulatedHost::new(["COM1", "COM3"]);
    let mut rec = Reconciler::new();

    let outcome = rec.refresh_ports(&host).await;
    assert_eq!(outcome, PortsOutcome::Applied { transition: None });

    let view = rec.view();
    assert_eq!(view.port_select.entries(), vec!["COM1", "COM3"]);
    assert!(!view.port_select.disabled);
    assert_eq!(view.button, ButtonMode::Connect);
    assert_eq!(view.status.text, WAITING_TEXT);
    assert_eq!(view.status.tone, Tone::Neutral);
}

#[test]
fn empty_port_list_shows_placeholder() {
    let host = SimulatedHost::default();
    let mut rec = Reconciler::new();
    tokio_test::block_on(rec.refresh_ports(&host));
    assert_eq!(rec.view().port_select.entries(), vec![NO_PORTS_PLACEHOLDER]);
    assert_eq!(rec.view().port_select.selected_port(), None);
}

#[tokio::test]
async fn connect_edge_fires_once_across_repeated_snapshots() {
    let host = SimulatedHost::new(["COM1", "COM3"]);
    let mut rec = Reconciler::new();
    rec.refresh_ports(&host).await;

    host.attach("COM3");
    let first = rec.refresh_ports(&host).await;
    assert_eq!(
        first,
        PortsOutcome::Applied {
            transition: Some(Transition::Connected("COM3".into()))
        }
    );
    let view = rec.view();
    assert_eq!(view.port_select.selected_port(), Some("COM3"));
    assert!(view.port_select.disabled);
    assert_eq!(view.button, ButtonMode::Disconnect);
    assert_eq!(view.status.text, "Connected to COM3");
    assert_eq!(view.status.tone, Tone::Success);

    let revision = rec.view().revision;
    for _ in 0..3 {
        let again = rec.refresh_ports(&host).await;
        assert_eq!(again, PortsOutcome::Applied { transition: None });
    }
    assert_eq!(rec.view().revision, revision);
    assert_eq!(rec.state(), &ConnectionState::Connected("COM3".into()));
}

#[tokio::test]
async fn disconnect_edge_reenables_selector_and_restores_connect() {
    let host = SimulatedHost::new(["COM3"]);
    let mut rec = connected_to(&host, "COM3").await;

    host.detach();
    let outcome = rec.refresh_ports(&host).await;
    assert_eq!(
        outcome,
        PortsOutcome::Applied {
            transition: Some(Transition::Disconnected)
        }
    );
    let view = rec.view();
    assert!(!view.port_select.disabled);
    assert_eq!(view.button, ButtonMode::Connect);
    assert_eq!(view.status.text, WAITING_TEXT);
    assert!(!rec.is_connected());
}

#[tokio::test]
async fn status_text_tone_follows_failed_keyword() {
    let host = SimulatedHost::new(["COM3"]);
    let mut rec = Reconciler::new();

    host.set_status_text("Port scan FAILED: permission denied");
    rec.refresh_ports(&host).await;
    assert_eq!(rec.view().status.tone, Tone::Error);

    host.set_status_text("Scanning for device");
    rec.refresh_ports(&host).await;
    assert_eq!(rec.view().status.text, "Scanning for device");
    assert_eq!(rec.view().status.tone, Tone::Neutral);

    host.set_status_text("");
    rec.refresh_ports(&host).await;
    assert_eq!(rec.view().status.text, WAITING_TEXT);
}

#[tokio::test]
async fn failed_ports_poll_changes_nothing() {
    let host = SimulatedHost::new(["COM3"]);
    let mut rec = Reconciler::new();
    rec.refresh_ports(&host).await;
    let before = rec.view().clone();

    host.attach("COM3");
    host.fail_next(HostCall::GetPorts, HostError::Transport("timed out".into()));
    let outcome = rec.refresh_ports(&host).await;
    assert!(matches!(outcome, PortsOutcome::Skipped(HostError::Transport(_))));
    assert_eq!(rec.view(), &before);
    assert!(!rec.is_connected());

    // next tick self-heals
    rec.refresh_ports(&host).await;
    assert!(rec.is_connected());
}

#[tokio::test]
async fn download_rate_is_unit_scaled() {
    let host = SimulatedHost::new(["COM3"]);
    let mut rec = Reconciler::new();

    for (kb, value, unit) in [
        (2048.0, "2.0", "MB/s"),
        (500.0, "500", "KB/s"),
        (1024.0, "1.0", "MB/s"),
    ] {
        host.set_stats(Some(StatsSnapshot {
            net_down_kb: Some(kb),
            ..Default::default()
        }));
        assert_eq!(rec.refresh_stats(&host).await, StatsOutcome::Applied(1));
        assert_eq!(rec.view().text(ids::DL_VAL), Some(value));
        assert_eq!(rec.view().text(ids::DL_UNIT), Some(unit));
    }
}

#[tokio::test]
async fn stats_fields_update_independently() {
    let host = SimulatedHost::default();
    let mut rec = Reconciler::new();

    host.set_stats(Some(StatsSnapshot {
        cpu_percent: Some(12.6),
        net_down_kb: Some(10.0),
        mem_percent: Some(48.2),
        disk_percent: Some(71.0),
    }));
    assert_eq!(rec.refresh_stats(&host).await, StatsOutcome::Applied(4));
    assert_eq!(rec.view().cpu, "13%");
    assert_eq!(rec.view().ram, "48%");
    assert_eq!(rec.view().disk, "71%");

    host.set_stats(Some(StatsSnapshot {
        cpu_percent: Some(99.7),
        ..Default::default()
    }));
    assert_eq!(rec.refresh_stats(&host).await, StatsOutcome::Applied(1));
    assert_eq!(rec.view().cpu, "100%");
    assert_eq!(rec.view().ram, "48%");
    assert_eq!(rec.view().dl_val, "10");
}

#[tokio::test]
async fn empty_stats_payload_leaves_displays_unchanged() {
    let host = SimulatedHost::default();
    let mut rec = Reconciler::new();
    host.sample();
    rec.refresh_stats(&host).await;
    let before = rec.view().clone();

    host.set_stats(None);
    assert_eq!(rec.refresh_stats(&host).await, StatsOutcome::NoData);
    assert_eq!(rec.view(), &before);

    assert_eq!(rec.apply_stats_payload(Ok(String::new())), StatsOutcome::NoData);
    assert!(matches!(
        rec.apply_stats_payload(Ok("cpu=12".into())),
        StatsOutcome::Invalid(_)
    ));
    assert!(matches!(
        rec.apply_stats_payload(Ok("[50, 1, 2, 3]".into())),
        StatsOutcome::Invalid(_)
    ));
    host.fail_next(HostCall::GetStats, HostError::Transport("gone".into()));
    assert!(matches!(
        rec.refresh_stats(&host).await,
        StatsOutcome::Skipped(_)
    ));
    assert_eq!(rec.view(), &before);
}

#[tokio::test]
async fn toggle_with_placeholder_selected_does_nothing() {
    let host = SimulatedHost::default();
    let mut rec = Reconciler::new();
    rec.refresh_ports(&host).await;
    let before = rec.view().clone();

    assert_eq!(rec.toggle_connection(&host).await, ToggleOutcome::Refused);
    assert_eq!(host.calls(HostCall::ToggleConnection), 0);
    assert!(!rec.is_connected());
    assert_eq!(rec.view(), &before);
}

#[tokio::test]
async fn failed_connect_surfaces_host_error_and_stays_disconnected() {
    let host = SimulatedHost::new(["COM3"]);
    host.refuse_port("COM3", "Access is denied.");
    let mut rec = Reconciler::new();
    rec.refresh_ports(&host).await;

    let outcome = rec.toggle_connection(&host).await;
    assert_eq!(
        outcome,
        ToggleOutcome::ConnectFailed("Connection failed: Access is denied.".into())
    );
    assert!(!rec.is_connected());
    assert_eq!(rec.view().status.text, "Connection failed: Access is denied.");
    assert_eq!(rec.view().status.tone, Tone::Error);
    assert_eq!(rec.view().button, ButtonMode::Connect);

    // the host keeps reporting the failure; it stays red
    rec.refresh_ports(&host).await;
    assert_eq!(rec.view().status.tone, Tone::Error);
}

#[tokio::test]
async fn successful_connect_updates_view_before_next_poll() {
    let host = SimulatedHost::new(["COM1", "COM3"]);
    let mut rec = Reconciler::new();
    rec.refresh_ports(&host).await;
    assert!(rec.select_port("COM3"));

    assert_eq!(
        rec.toggle_connection(&host).await,
        ToggleOutcome::Connected("COM3".into())
    );
    assert_eq!(host.active_port().as_deref(), Some("COM3"));
    assert_eq!(rec.view().button, ButtonMode::Disconnect);
    assert!(rec.view().port_select.disabled);
    assert_eq!(rec.view().status.text, "Connected to COM3");

    // poll agrees with the optimistic state: no second transition
    assert_eq!(
        rec.refresh_ports(&host).await,
        PortsOutcome::Applied { transition: None }
    );
    assert!(!rec.select_port("COM1"));
}

#[tokio::test]
async fn disconnect_restores_connect_with_neutral_message() {
    let host = SimulatedHost::new(["COM3"]);
    let mut rec = connected_to(&host, "COM3").await;

    assert_eq!(rec.toggle_connection(&host).await, ToggleOutcome::Disconnected);
    assert!(!rec.is_connected());
    assert_eq!(rec.view().button, ButtonMode::Connect);
    assert!(!rec.view().port_select.disabled);
    assert_eq!(rec.view().status.text, "Disconnected");
    assert_eq!(rec.view().status.tone, Tone::Neutral);
    assert_eq!(host.active_port(), None);
}

#[tokio::test]
async fn failed_disconnect_keeps_connected_view_without_message() {
    let host = SimulatedHost::new(["COM3"]);
    let mut rec = connected_to(&host, "COM3").await;
    let before = rec.view().clone();

    host.fail_next(
        HostCall::ToggleConnection,
        HostError::Rejected("port busy".into()),
    );
    assert_eq!(
        rec.toggle_connection(&host).await,
        ToggleOutcome::DisconnectFailed
    );
    assert!(rec.is_connected());
    assert_eq!(rec.view(), &before);
}

#[tokio::test]
async fn autostart_binds_persists_and_reverts() {
    let host = SimulatedHost::default();
    host.set_autostart_flag(true);
    let mut rec = Reconciler::new();

    assert_eq!(rec.init_autostart(&host).await, AutostartOutcome::Bound(true));
    assert!(rec.view().autostart.checked);

    assert_eq!(
        rec.set_autostart(&host, false).await,
        AutostartOutcome::Persisted(false)
    );
    assert!(!host.autostart_flag());
    assert!(!rec.view().autostart.checked);

    host.fail_next(
        HostCall::SetAutostart,
        HostError::Rejected("registry locked".into()),
    );
    assert_eq!(
        rec.set_autostart(&host, true).await,
        AutostartOutcome::Reverted(false)
    );
    assert!(!rec.view().autostart.checked);
    assert!(!host.autostart_flag());
}

#[tokio::test]
async fn autostart_read_failure_disables_checkbox() {
    let host = SimulatedHost::default();
    host.fail_next(
        HostCall::CheckAutostart,
        HostError::Rejected("unsupported".into()),
    );
    let mut rec = Reconciler::new();

    assert_eq!(rec.init_autostart(&host).await, AutostartOutcome::Unavailable);
    assert!(rec.view().autostart.disabled);

    assert_eq!(
        rec.set_autostart(&host, true).await,
        AutostartOutcome::Refused
    );
    assert_eq!(host.calls(HostCall::SetAutostart), 0);
}

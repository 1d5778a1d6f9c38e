//! Line-oriented console frontend.
//!
//! Prints one line per view change and reads commands from stdin
//! (`connect`, `disconnect`, `select <port>`, `autostart on|off`, `quit`).

use anyhow::{Context, Result};
use chrono::Local;
use std::{io::BufRead, sync::Arc};

use crate::{
    core::{
        bus::{self, parse_command, CoreToUi, UiToCore},
        runtime::{run_panel, RuntimeConfig},
        task_manager::spawn_task,
        view::ViewModel,
    },
    protocol::host::Host,
};

/// Render the view as a single status line.
pub fn render_line(view: &ViewModel) -> String {
    let ports = view.port_select.entries().join(", ");
    let selected = view.port_select.selected_port().unwrap_or("-");
    let lock = if view.port_select.disabled { " (locked)" } else { "" };
    let autostart = match (view.autostart.disabled, view.autostart.checked) {
        (true, _) => "n/a",
        (false, true) => "on",
        (false, false) => "off",
    };
    format!(
        "[{}] {} | ports: {ports} | selected: {selected}{lock} | cpu {} ram {} disk {} dl {} {} | autostart {autostart}",
        view.button.label(),
        view.status.text,
        view.cpu,
        view.ram,
        view.disk,
        view.dl_val,
        view.dl_unit,
    )
}

pub async fn run_console(host: Arc<dyn Host>, config: RuntimeConfig) -> Result<()> {
    let (ui, core) = bus::channel();

    let quit_tx = ui.ui_tx.clone();
    ctrlc::set_handler(move || {
        let _ = quit_tx.send(UiToCore::Quit);
    })
    .context("Failed to install Ctrl-C handler")?;

    let input_tx = ui.ui_tx.clone();
    // Plain thread rather than the blocking pool: runtime shutdown waits on
    // pool tasks, and a stdin read never finishes on its own.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(cmd) => {
                    if input_tx.send(cmd).is_err() {
                        break;
                    }
                }
                None => log::warn!("unknown command: {}", line.trim()),
            }
        }
    });

    let core_rx = ui.core_rx.clone();
    let printer = spawn_task(async move {
        while let Ok(msg) = core_rx.recv_async().await {
            match msg {
                CoreToUi::ViewChanged(view) => {
                    println!("{} {}", Local::now().format("%H:%M:%S"), render_line(&view));
                }
                CoreToUi::Quit => break,
            }
        }
    });

    let reconciler = run_panel(host, config, core).await?;
    let _ = printer.await;
    log::info!(
        "panel stopped ({})",
        reconciler.state().port().unwrap_or("not connected")
    );
    Ok(())
}

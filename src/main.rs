use anyhow::Result;
use std::{sync::Arc, time::Duration};

use tinytosh::{
    cli,
    console::run_console,
    core::{config::HostMode, task_manager::spawn_task},
    protocol::{serve_host, Host, IpcHost, SimulatedHost},
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let matches = cli::parse_args();
    let config = cli::resolve_config(&matches)?;

    if matches.get_flag("serve-sim") {
        let sim = Arc::new(SimulatedHost::new(cli::sim_ports(&matches)));
        spawn_sampler(sim.clone());
        log::info!("Serving simulated host on {}", config.host.socket);
        let _server = serve_host(&config.host.socket, sim)?;
        tokio::signal::ctrl_c().await?;
        return Ok(());
    }

    let host: Arc<dyn Host> = match config.host.mode {
        HostMode::Ipc => {
            log::info!("Using host process at {}", config.host.socket);
            Arc::new(IpcHost::new(
                config.host.socket.clone(),
                config.host.io_timeout(),
            ))
        }
        HostMode::Simulated => {
            log::info!("Using simulated host");
            let sim = Arc::new(SimulatedHost::new(cli::sim_ports(&matches)));
            spawn_sampler(sim.clone());
            sim
        }
    };

    run_console(host, config.polling.into()).await
}

/// Take a simulated stats sample every second, like the host's sampler thread.
fn spawn_sampler(sim: Arc<SimulatedHost>) {
    spawn_task(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tick.tick().await;
            sim.sample();
        }
    });
}

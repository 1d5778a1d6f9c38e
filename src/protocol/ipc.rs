//! Local-socket transport for the host contract.
//!
//! Each call is one JSON line in each direction:
//!
//! ```text
//! -> {"cmd":"toggle_connection","args":{"portName":"COM3","connect":true}}
//! <- {"ok":null}
//! <- {"err":"Connection failed: Access is denied."}
//! ```
//!
//! The client keeps one connection open and reuses it; any I/O error drops the
//! connection so the next call reconnects. Socket I/O is blocking and runs on
//! tokio's blocking pool, with the socket's own send/receive timeouts set to
//! the call timeout so a host that never answers cannot pin a pool thread.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    io::{BufRead, BufReader, ErrorKind, Write},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use interprocess::local_socket::{
    prelude::*,
    {GenericFilePath, GenericNamespaced, ListenerOptions},
};

use super::{
    host::{Host, HostCall, HostError, HostResult},
    types::{AutostartRequest, PortStatus, ToggleRequest},
};
use crate::core::task_manager::run_blocking_io;

/// Request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "args", rename_all = "snake_case")]
pub enum HostRequest {
    CheckAutostart,
    SetAutostart(AutostartRequest),
    GetPorts,
    GetStats,
    ToggleConnection(ToggleRequest),
}

impl HostRequest {
    pub fn call(&self) -> HostCall {
        match self {
            HostRequest::CheckAutostart => HostCall::CheckAutostart,
            HostRequest::SetAutostart(_) => HostCall::SetAutostart,
            HostRequest::GetPorts => HostCall::GetPorts,
            HostRequest::GetStats => HostCall::GetStats,
            HostRequest::ToggleConnection(_) => HostCall::ToggleConnection,
        }
    }
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostResponse {
    Ok(serde_json::Value),
    Err(String),
}

/// Blocking calls allowed in the pool at once per client.
const MAX_OUTSTANDING_CALLS: usize = 4;

/// One open connection with its read buffer.
struct Pipe {
    conn: BufReader<LocalSocketStream>,
    line: String,
}

impl Pipe {
    fn new(conn: LocalSocketStream) -> Self {
        Pipe {
            conn: BufReader::new(conn),
            line: String::with_capacity(256),
        }
    }

    fn write_line<T: Serialize>(&mut self, data: &T) -> Result<()> {
        let mut encoded = serde_json::to_vec(data)?;
        encoded.push(b'\n');
        let conn = self.conn.get_mut();
        conn.write_all(&encoded)?;
        conn.flush()?;
        Ok(())
    }

    /// Returns `Ok(None)` when the peer closed the connection.
    fn read_line<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        self.line.clear();
        let read = self.conn.read_line(&mut self.line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(self.line.trim_end())?))
    }
}

/// [`Host`] implementation talking to the host process over a local socket.
pub struct IpcHost {
    name: String,
    io_timeout: Duration,
    pipe: Arc<Mutex<Option<Pipe>>>,
    outstanding: Arc<AtomicUsize>,
}

/// Counts one blocking call for as long as it lives.
struct OutstandingCall(Arc<AtomicUsize>);

impl OutstandingCall {
    fn acquire(counter: &Arc<AtomicUsize>) -> Option<Self> {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < MAX_OUTSTANDING_CALLS).then_some(n + 1)
            })
            .ok()
            .map(|_| OutstandingCall(counter.clone()))
    }
}

impl Drop for OutstandingCall {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for IpcHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcHost")
            .field("name", &self.name)
            .field("io_timeout", &self.io_timeout)
            .field("connected", &self.pipe.try_lock().map(|pipe| pipe.is_some()))
            .field("outstanding", &self.outstanding.load(Ordering::Relaxed))
            .finish()
    }
}

impl IpcHost {
    /// The connection is opened lazily on the first call.
    pub fn new(name: impl Into<String>, io_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            io_timeout,
            pipe: Arc::new(Mutex::new(None)),
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocking calls that have not finished yet, including ones whose caller
    /// already gave up on them.
    pub fn outstanding_calls(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    async fn call<T>(&self, request: HostRequest) -> HostResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let name = self.name.clone();
        let pipe = self.pipe.clone();
        let io_timeout = self.io_timeout;
        let call = request.call();

        let Some(slot) = OutstandingCall::acquire(&self.outstanding) else {
            return Err(HostError::Transport(format!(
                "{call} not sent: {MAX_OUTSTANDING_CALLS} earlier calls still outstanding"
            )));
        };

        run_blocking_io(io_timeout, move || {
            let _slot = slot;
            let Some(mut guard) = pipe.try_lock_for(io_timeout) else {
                return Err(HostError::Transport(format!(
                    "{call} not sent: connection busy for {io_timeout:?}"
                )));
            };
            if guard.is_none() {
                let stream = connect(&name, io_timeout)
                    .map_err(|err| HostError::Transport(err.to_string()))?;
                log::debug!("IPC connected to host socket {name}");
                *guard = Some(Pipe::new(stream));
            }
            let Some(active) = guard.as_mut() else {
                return Err(HostError::Transport("no connection".into()));
            };

            let exchanged = active
                .write_line(&request)
                .and_then(|_| active.read_line::<HostResponse>());
            let response = match exchanged {
                Ok(Some(response)) => response,
                Ok(None) => {
                    *guard = None;
                    return Err(HostError::Transport(format!(
                        "host closed the connection during {call}"
                    )));
                }
                Err(err) => {
                    log::warn!("IPC {call} failed, dropping connection: {err}");
                    *guard = None;
                    return Err(HostError::Transport(err.to_string()));
                }
            };

            match response {
                HostResponse::Ok(value) => serde_json::from_value(value)
                    .map_err(|err| HostError::Decode(format!("{call}: {err}"))),
                HostResponse::Err(text) => Err(HostError::Rejected(text)),
            }
        })
        .await
    }
}

#[async_trait]
impl Host for IpcHost {
    async fn check_autostart(&self) -> HostResult<bool> {
        self.call(HostRequest::CheckAutostart).await
    }

    async fn set_autostart(&self, request: AutostartRequest) -> HostResult<()> {
        self.call(HostRequest::SetAutostart(request)).await
    }

    async fn get_ports(&self) -> HostResult<PortStatus> {
        self.call(HostRequest::GetPorts).await
    }

    async fn get_stats(&self) -> HostResult<String> {
        self.call(HostRequest::GetStats).await
    }

    async fn toggle_connection(&self, request: ToggleRequest) -> HostResult<()> {
        self.call(HostRequest::ToggleConnection(request)).await
    }
}

/// Dispatch one request to `host` and wrap the outcome in a response.
pub async fn dispatch<H: Host + ?Sized>(host: &H, request: HostRequest) -> HostResponse {
    fn encode<T: Serialize>(result: HostResult<T>) -> HostResponse {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(json) => HostResponse::Ok(json),
                Err(err) => HostResponse::Err(err.to_string()),
            },
            Err(err) => HostResponse::Err(err.user_text()),
        }
    }

    match request {
        HostRequest::CheckAutostart => encode(host.check_autostart().await),
        HostRequest::SetAutostart(req) => encode(host.set_autostart(req).await),
        HostRequest::GetPorts => encode(host.get_ports().await),
        HostRequest::GetStats => encode(host.get_stats().await),
        HostRequest::ToggleConnection(req) => encode(host.toggle_connection(req).await),
    }
}

/// Serve `host` on a local socket until the listener fails.
///
/// The listener is bound before this returns, so clients may connect as soon
/// as the call completes. Accepting and every connection run on plain
/// threads; requests are dispatched back onto the calling runtime.
pub fn serve_host(name: &str, host: Arc<dyn Host>) -> Result<std::thread::JoinHandle<()>> {
    let listener = create_listener(name)?;
    let runtime = tokio::runtime::Handle::current();
    let name = name.to_string();
    log::info!("IPC host listening on {name}");

    Ok(std::thread::spawn(move || {
        for conn in listener.incoming() {
            let stream = match conn {
                Ok(stream) => stream,
                Err(err) => {
                    log::error!("IPC accept on {name} failed: {err}");
                    break;
                }
            };
            let host = host.clone();
            let runtime = runtime.clone();
            std::thread::spawn(move || serve_connection(Pipe::new(stream), host, runtime));
        }
    }))
}

fn serve_connection(mut pipe: Pipe, host: Arc<dyn Host>, runtime: tokio::runtime::Handle) {
    loop {
        let request = match pipe.read_line::<HostRequest>() {
            Ok(Some(request)) => request,
            Ok(None) => break,
            Err(err) => {
                log::warn!("IPC dropped malformed request: {err}");
                if pipe.write_line(&HostResponse::Err(err.to_string())).is_err() {
                    break;
                }
                continue;
            }
        };
        log::trace!("IPC request {}", request.call());
        let response = runtime.block_on(dispatch(host.as_ref(), request));
        if let Err(err) = pipe.write_line(&response) {
            log::debug!("IPC client went away: {err}");
            break;
        }
    }
}

/// Create a local socket listener with proper platform detection
fn create_listener(name: &str) -> Result<LocalSocketListener> {
    let created = if cfg!(unix) {
        match name.to_ns_name::<GenericNamespaced>() {
            Ok(ns) => ListenerOptions::new().name(ns).create_sync(),
            Err(_) => {
                let path = name.to_fs_name::<GenericFilePath>()?;
                ListenerOptions::new().name(path).create_sync()
            }
        }
    } else {
        let pipe_name = name.to_ns_name::<GenericNamespaced>()?;
        ListenerOptions::new().name(pipe_name).create_sync()
    };

    created.map_err(|e| {
        if e.kind() == ErrorKind::AddrInUse {
            anyhow!(
                "Socket address already in use: {name}. Please ensure no other host is running."
            )
        } else {
            anyhow!("Failed to create listener for {name}: {e}")
        }
    })
}

/// Connect and bound every later read and write on the stream by `io_timeout`.
///
/// Named pipes on Windows have no socket timeouts; there only the
/// outstanding-call cap limits how many pool threads a silent host can hold.
fn connect(name: &str, io_timeout: Duration) -> Result<LocalSocketStream> {
    let stream = if cfg!(unix) {
        match name.to_ns_name::<GenericNamespaced>() {
            Ok(ns) => LocalSocketStream::connect(ns)?,
            Err(_) => {
                let path = name.to_fs_name::<GenericFilePath>()?;
                LocalSocketStream::connect(path)?
            }
        }
    } else {
        let pipe_name = name.to_ns_name::<GenericNamespaced>()?;
        LocalSocketStream::connect(pipe_name)?
    };
    let bounded = stream
        .set_recv_timeout(Some(io_timeout))
        .and_then(|_| stream.set_send_timeout(Some(io_timeout)));
    if let Err(err) = bounded {
        log::warn!("IPC socket timeouts unavailable on {name}: {err}");
    }
    Ok(stream)
}

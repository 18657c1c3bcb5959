//! Lifecycle of a host child process.
//!
//! [`HostProcess::start`] spawns the host on a loopback port, waits until it
//! answers its health check and retries when an auto-selected port was lost to
//! another process. [`HostProcess::stop`] asks for a graceful shutdown and
//! blocks until the child has exited.

use crate::error::ConnectError;
use crate::transport::{HttpTransport, Transport};
use std::net::{Ipv4Addr, TcpListener};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tether_proto::KNOWN_TARGETS;
use tracing::{debug, info, warn};

pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BIND_ATTEMPTS: u32 = 3;
pub const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const STOP_GRACE: Duration = Duration::from_secs(5);

const HEALTH_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Host executable.
    pub program: PathBuf,
    pub spec_path: PathBuf,
    pub target: String,
    pub visible: bool,
    pub debug: bool,
    /// Fixed port. `None` picks a free one.
    pub port: Option<u16>,
    pub startup_timeout: Duration,
    /// Launch attempts when the auto-selected port is lost before the host binds it.
    pub bind_attempts: u32,
}

impl LaunchOptions {
    pub fn new(
        program: impl Into<PathBuf>,
        spec_path: impl Into<PathBuf>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            spec_path: spec_path.into(),
            target: target.into(),
            visible: false,
            debug: false,
            port: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            bind_attempts: DEFAULT_BIND_ATTEMPTS,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Command line for a host on `port`.
    pub fn command(&self, port: u16) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--port")
            .arg(port.to_string())
            .arg("--spec")
            .arg(&self.spec_path)
            .arg("--target")
            .arg(&self.target);
        if self.visible {
            command.arg("--visible");
        }
        if self.debug {
            command.arg("--debug");
        }
        command.stdin(Stdio::null()).stdout(Stdio::null());
        command.stderr(if self.debug {
            Stdio::inherit()
        } else {
            Stdio::null()
        });
        command
    }
}

/// Binds port 0 on loopback and returns what the OS picked.
///
/// The port is released before returning, so another process may take it
/// before the host binds it.
pub fn allocate_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

enum Readiness {
    Ready,
    Exited(ExitStatus),
    TimedOut,
}

/// Polls `GET /health` until the host answers.
///
/// A listener on the port is not enough: another process may hold it. The
/// child must still be running after a healthy answer.
fn wait_ready(child: &mut Child, port: u16, timeout: Duration) -> Result<Readiness, ConnectError> {
    let transport = HttpTransport::local(port)?;
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Readiness::Exited(status));
        }
        match transport.health(HEALTH_TIMEOUT) {
            Ok(response) if !response.error => {
                return Ok(match child.try_wait()? {
                    Some(status) => Readiness::Exited(status),
                    None => Readiness::Ready,
                });
            }
            Ok(response) => debug!("Port {} answered unhealthy: {:?}", port, response.message),
            Err(e) => debug!("Port {} not ready: {}", port, e),
        }
        if Instant::now() >= deadline {
            return Ok(Readiness::TimedOut);
        }
        thread::sleep(READINESS_POLL_INTERVAL);
    }
}

/// A running host child process.
#[derive(Debug)]
pub struct HostProcess {
    child: Child,
    port: u16,
    stopped: bool,
}

impl HostProcess {
    pub fn start(options: &LaunchOptions) -> Result<Self, ConnectError> {
        if !KNOWN_TARGETS.contains(&options.target.as_str()) {
            return Err(ConnectError::InvalidTarget(options.target.clone()));
        }

        let attempts = match options.port {
            Some(_) => 1,
            None => options.bind_attempts.max(1),
        };

        let mut last_error = None;
        for attempt in 1..=attempts {
            let port = match options.port {
                Some(port) => port,
                None => allocate_port()?,
            };
            debug!(
                "Starting {} on port {} (attempt {}/{})",
                options.program.display(),
                port,
                attempt,
                attempts
            );

            let mut child = options.command(port).spawn()?;
            match wait_ready(&mut child, port, options.startup_timeout)? {
                Readiness::Ready => {
                    info!("Host {} ready on port {}", child.id(), port);
                    return Ok(Self {
                        child,
                        port,
                        stopped: false,
                    });
                }
                Readiness::Exited(status) => {
                    warn!("Host exited before binding port {}: {}", port, status);
                    last_error = Some(ConnectError::HostExited {
                        port,
                        status: status.to_string(),
                    });
                }
                Readiness::TimedOut => {
                    warn!("Host not reachable on port {}, killing it", port);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ConnectError::StartupTimeout {
                        port,
                        timeout: options.startup_timeout,
                    });
                }
            }
        }

        Err(last_error.unwrap_or(ConnectError::HostExited {
            port: options.port.unwrap_or_default(),
            status: "not started".to_string(),
        }))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn transport(&self) -> Result<HttpTransport, ConnectError> {
        HttpTransport::local(self.port)
    }

    /// Whether the child is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Requests shutdown and blocks until the child has exited.
    ///
    /// The child is killed when the request fails or it is still running
    /// after [`STOP_GRACE`].
    pub fn stop(&mut self) -> Result<ExitStatus, ConnectError> {
        if let Some(status) = self.child.try_wait()? {
            self.stopped = true;
            return Ok(status);
        }

        let requested = self
            .transport()
            .and_then(|transport| transport.shutdown());
        match requested {
            Ok(response) => debug!("Shutdown acknowledged: {:?}", response.message),
            Err(e) => {
                warn!("Shutdown request failed, killing host: {}", e);
                let _ = self.child.kill();
            }
        }

        let deadline = Instant::now() + STOP_GRACE;
        let status = loop {
            if let Some(status) = self.child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                warn!("Host {} still running after {:?}, killing it", self.id(), STOP_GRACE);
                let _ = self.child.kill();
                break self.child.wait()?;
            }
            thread::sleep(READINESS_POLL_INTERVAL);
        };

        self.stopped = true;
        Ok(status)
    }
}

impl Drop for HostProcess {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        if let Ok(None) = self.child.try_wait() {
            warn!("Killing unstopped host {}", self.child.id());
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

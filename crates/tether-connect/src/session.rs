//! Opening and closing sessions.

use crate::error::ConnectError;
use crate::handle::{RemoteHandle, SessionContext};
use crate::stubs::StubTable;
use crate::supervisor::{HostProcess, LaunchOptions};
use crate::transmogrify::{Constructor, Transmogrifier};
use crate::transport::{HttpTransport, Transport};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;
use tether_proto::{ObjectRef, SessionRequest};
use tether_spec::SpecRegistry;
use tracing::{info, warn};

/// Builder for a session over a spec.
///
/// ```no_run
/// use std::sync::Arc;
/// use tether_connect::{LaunchOptions, Session};
/// use tether_spec::SpecRegistry;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let spec = Arc::new(SpecRegistry::load("specs/sandbox.json")?);
/// let options = LaunchOptions::new("tether-host", "specs/sandbox.json", "chromium");
///
/// let browser = Session::new(spec).launch(&options, vec![])?;
/// let page = browser.call("newPage", vec![])?.into_handle()?;
/// page.call("goto", vec!["https://example.test/".into()])?;
/// browser.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    spec: Arc<SpecRegistry>,
    stubs: StubTable,
    transmogrifier: Transmogrifier,
}

impl Session {
    pub fn new(spec: Arc<SpecRegistry>) -> Self {
        let stubs = StubTable::from_registry(&spec);
        let transmogrifier = Transmogrifier::from_registry(&spec);
        Self {
            spec,
            stubs,
            transmogrifier,
        }
    }

    /// Recognizes an extra tag in responses.
    pub fn register_tag(mut self, tag: &str, constructor: Constructor) -> Self {
        self.transmogrifier.register(tag, constructor);
        self
    }

    /// Starts a supervised host and opens a session on it.
    pub fn launch(
        self,
        options: &LaunchOptions,
        args: Vec<Value>,
    ) -> Result<SessionRoot, ConnectError> {
        let process = HostProcess::start(options)?;
        let transport = match process.transport() {
            Ok(transport) => transport,
            Err(e) => {
                stop_quietly(process);
                return Err(e);
            }
        };
        self.open(Arc::new(transport), &options.target, args, Some(process))
    }

    /// Opens a session on a host that is already running.
    pub fn attach(
        self,
        base_url: &str,
        target: &str,
        args: Vec<Value>,
    ) -> Result<SessionRoot, ConnectError> {
        let transport = HttpTransport::new(base_url)?;
        self.open(Arc::new(transport), target, args, None)
    }

    /// Opens a session over any transport.
    ///
    /// `process`, when given, is stopped when the session ends or fails to open.
    pub fn open(
        self,
        transport: Arc<dyn Transport>,
        target: &str,
        args: Vec<Value>,
        process: Option<HostProcess>,
    ) -> Result<SessionRoot, ConnectError> {
        let opened = transport
            .open_session(&SessionRequest::new(target, args))
            .and_then(|response| response.into_result().map_err(ConnectError::Remote))
            .and_then(|message| {
                ObjectRef::from_value(&message).ok_or_else(|| ConnectError::UnexpectedReply {
                    expected: "a root object reference",
                    got: message.to_string(),
                })
            });

        let root = match opened {
            Ok(root) => root,
            Err(e) => {
                if let Some(process) = process {
                    stop_quietly(process);
                }
                return Err(e);
            }
        };
        info!("Session opened on {} as {}", target, root.guid);

        let mut context = SessionContext::new(self.spec, transport, self.stubs, self.transmogrifier);
        if let Some(process) = process {
            context = context.with_process(process);
        }

        Ok(SessionRoot {
            handle: RemoteHandle::root(root.guid, root.class, Arc::new(context)),
        })
    }
}

fn stop_quietly(mut process: HostProcess) {
    if let Err(e) = process.stop() {
        warn!("Failed to stop host: {}", e);
    }
}

/// Handle to the root object of a session.
///
/// Dropping it ends the session.
#[derive(Debug)]
pub struct SessionRoot {
    handle: RemoteHandle,
}

impl SessionRoot {
    pub fn handle(&self) -> &RemoteHandle {
        &self.handle
    }

    /// Shuts the host down and waits for a supervised process to exit.
    pub fn close(self) -> Result<(), ConnectError> {
        self.handle.context().shutdown()
    }
}

impl Deref for SessionRoot {
    type Target = RemoteHandle;

    fn deref(&self) -> &RemoteHandle {
        &self.handle
    }
}

impl Drop for SessionRoot {
    fn drop(&mut self) {
        if let Err(e) = self.handle.context().shutdown() {
            warn!("Session shutdown failed: {}", e);
        }
    }
}

//! Client-side proxies for remote objects.

use crate::error::ConnectError;
use crate::stubs::{Stub, StubTable};
use crate::supervisor::HostProcess;
use crate::transmogrify::{Reply, Transmogrifier};
use crate::transport::Transport;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tether_proto::{CommandRequest, SCOPE_SEPARATOR};
use tether_spec::SpecRegistry;
use tracing::{debug, info};

/// Everything the handles of one session share.
pub struct SessionContext {
    spec: Arc<SpecRegistry>,
    transport: Arc<dyn Transport>,
    stubs: StubTable,
    transmogrifier: Transmogrifier,
    process: Mutex<Option<HostProcess>>,
    closed: AtomicBool,
}

impl SessionContext {
    pub fn new(
        spec: Arc<SpecRegistry>,
        transport: Arc<dyn Transport>,
        stubs: StubTable,
        transmogrifier: Transmogrifier,
    ) -> Self {
        Self {
            spec,
            transport,
            stubs,
            transmogrifier,
            process: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Context whose tables are built from `spec`.
    pub fn from_registry(spec: Arc<SpecRegistry>, transport: Arc<dyn Transport>) -> Self {
        let stubs = StubTable::from_registry(&spec);
        let transmogrifier = Transmogrifier::from_registry(&spec);
        Self::new(spec, transport, stubs, transmogrifier)
    }

    /// Hands the supervised host to the session, which stops it on shutdown.
    pub fn with_process(self, process: HostProcess) -> Self {
        *self.process.lock().unwrap_or_else(PoisonError::into_inner) = Some(process);
        self
    }

    pub fn spec(&self) -> &SpecRegistry {
        &self.spec
    }

    pub fn stubs(&self) -> &StubTable {
        &self.stubs
    }

    pub fn transmogrifier(&self) -> &Transmogrifier {
        &self.transmogrifier
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn convert(self: &Arc<Self>, value: Value) -> Reply {
        self.transmogrifier.convert(value, self)
    }

    /// Ends the session. Only the first call has any effect.
    ///
    /// A supervised host is stopped and reaped; an attached one is only asked
    /// to shut down.
    pub fn shutdown(&self) -> Result<(), ConnectError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let process = self
            .process
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match process {
            Some(mut process) => {
                let status = process.stop()?;
                info!("Host exited with {}", status);
            }
            None => {
                self.transport
                    .shutdown()?
                    .into_result()
                    .map_err(ConnectError::Remote)?;
                info!("Host acknowledged shutdown");
            }
        }
        Ok(())
    }

    fn send(
        self: &Arc<Self>,
        class: &str,
        guid: &str,
        command: String,
        args: Vec<Value>,
    ) -> Result<Reply, ConnectError> {
        if self.is_closed() {
            return Err(ConnectError::SessionClosed);
        }
        let request = CommandRequest::new(class, guid, command, args);
        let value = self
            .transport
            .command(&request)?
            .into_result()
            .map_err(ConnectError::Remote)?;
        debug!("{}.{} answered {}", guid, request.command, value);
        Ok(self.convert(value))
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("classes", &self.spec.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Proxy for one remote object.
#[derive(Clone)]
pub struct RemoteHandle {
    guid: String,
    class_name: String,
    is_root: bool,
    context: Arc<SessionContext>,
}

impl RemoteHandle {
    pub fn new(
        guid: impl Into<String>,
        class_name: impl Into<String>,
        context: Arc<SessionContext>,
    ) -> Self {
        Self {
            guid: guid.into(),
            class_name: class_name.into(),
            is_root: false,
            context,
        }
    }

    pub(crate) fn root(guid: String, class_name: String, context: Arc<SessionContext>) -> Self {
        Self {
            is_root: true,
            ..Self::new(guid, class_name, context)
        }
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Method names this handle answers.
    pub fn methods(&self) -> Vec<String> {
        self.context
            .stubs
            .methods(&self.class_name, self.is_root)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Calls `method`, locally for natives or through the transport.
    ///
    /// Nothing is sent for a method the handle does not have.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Reply, ConnectError> {
        match self.context.stubs.get(&self.class_name, method, self.is_root) {
            Some(Stub::Native(native)) => native(self, args),
            Some(Stub::Forward) => {
                self.context
                    .send(&self.class_name, &self.guid, method.to_string(), args)
            }
            None => Err(ConnectError::NoSuchMethod {
                class: self.class_name.clone(),
                method: method.to_string(),
            }),
        }
    }

    /// Enters a scoped sub-target such as `page.mouse`.
    pub fn scope(&self, member: &str) -> Result<ScopedHandle, ConnectError> {
        let class = scope_class(&self.context, &self.class_name, member)?;
        Ok(ScopedHandle {
            parent: self.clone(),
            path: member.to_string(),
            class,
        })
    }
}

impl std::fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("guid", &self.guid)
            .field("class_name", &self.class_name)
            .field("is_root", &self.is_root)
            .finish()
    }
}

impl PartialEq for RemoteHandle {
    fn eq(&self, other: &Self) -> bool {
        self.guid == other.guid
            && self.class_name == other.class_name
            && Arc::ptr_eq(&self.context, &other.context)
    }
}

/// A sub-target reached through its owner's guid.
///
/// Calls go out as `"<path>.<method>"` against the owning object; the
/// sub-target itself never gets a guid.
#[derive(Debug, Clone)]
pub struct ScopedHandle {
    parent: RemoteHandle,
    path: String,
    class: String,
}

impl ScopedHandle {
    pub fn owner(&self) -> &RemoteHandle {
        &self.parent
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Reply, ConnectError> {
        let context = &self.parent.context;
        if !context.stubs.forwards(&self.class, method) {
            return Err(ConnectError::NoSuchMethod {
                class: self.class.clone(),
                method: method.to_string(),
            });
        }
        let command = format!("{}{}{}", self.path, SCOPE_SEPARATOR, method);
        context.send(&self.parent.class_name, &self.parent.guid, command, args)
    }

    pub fn scope(&self, member: &str) -> Result<ScopedHandle, ConnectError> {
        let class = scope_class(&self.parent.context, &self.class, member)?;
        Ok(ScopedHandle {
            parent: self.parent.clone(),
            path: format!("{}{}{}", self.path, SCOPE_SEPARATOR, member),
            class,
        })
    }
}

fn scope_class(context: &SessionContext, class: &str, member: &str) -> Result<String, ConnectError> {
    match context.spec.member(class, member) {
        Some(descriptor) if descriptor.is_scope() => Ok(descriptor
            .returns
            .clone()
            .unwrap_or_else(|| member.to_string())),
        _ => Err(ConnectError::NoSuchMethod {
            class: class.to_string(),
            method: member.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, RecordingTransport};
    use serde_json::json;
    use tether_proto::Response;

    #[test]
    fn test_forward_builds_request_from_handle() {
        let transport = RecordingTransport::new();
        transport.push(Response::ok(json!("https://example.test/")));
        let ctx = context(transport.clone());
        let page = RemoteHandle::new("Page@3", "Page", ctx);

        let reply = page.call("url", vec![]).unwrap();
        assert_eq!(reply.as_str(), Some("https://example.test/"));

        let sent = transport.commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].class, "Page");
        assert_eq!(sent[0].object.as_deref(), Some("Page@3"));
        assert_eq!(sent[0].command, "url");
    }

    #[test]
    fn test_unknown_method_sends_nothing() {
        let transport = RecordingTransport::new();
        let page = RemoteHandle::new("Page@3", "Page", context(transport.clone()));

        assert!(matches!(
            page.call("evaluate", vec![json!("1 + 1")]),
            Err(ConnectError::NoSuchMethod { .. })
        ));
        assert!(transport.commands().is_empty());
    }

    #[test]
    fn test_error_response_becomes_remote_error() {
        let transport = RecordingTransport::new();
        transport.push(Response::failure("Unknown object: Page@3"));
        let page = RemoteHandle::new("Page@3", "Page", context(transport));

        match page.call("url", vec![]) {
            Err(ConnectError::Remote(message)) => assert_eq!(message, "Unknown object: Page@3"),
            other => panic!("expected a remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_natives_answer_locally() {
        let transport = RecordingTransport::new();
        let page = RemoteHandle::new("Page@3", "Page", context(transport.clone()));

        assert_eq!(page.call("guid", vec![]).unwrap().as_str(), Some("Page@3"));
        assert_eq!(page.call("class_name", vec![]).unwrap().as_str(), Some("Page"));
        let described = page.call("describe", vec![]).unwrap().into_value().unwrap();
        assert!(described.as_array().unwrap().contains(&json!("goto")));
        assert!(transport.commands().is_empty());
    }

    #[test]
    fn test_scoped_call_targets_owner() {
        let transport = RecordingTransport::new();
        transport.push(Response::ok(Value::Null));
        let page = RemoteHandle::new("Page@3", "Page", context(transport.clone()));

        let mouse = page.scope("mouse").unwrap();
        assert_eq!(mouse.class_name(), "Mouse");
        mouse.call("click", vec![json!(1), json!(2)]).unwrap();

        let sent = transport.commands();
        assert_eq!(sent[0].object.as_deref(), Some("Page@3"));
        assert_eq!(sent[0].class, "Page");
        assert_eq!(sent[0].command, "mouse.click");
        assert_eq!(sent[0].args, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_scope_requires_declared_scope() {
        let page = RemoteHandle::new("Page@3", "Page", context(RecordingTransport::new()));

        assert!(page.scope("touchscreen").is_err());
        assert!(page.scope("goto").is_err());
        assert!(matches!(
            page.scope("keyboard").unwrap().call("click", vec![]),
            Err(ConnectError::NoSuchMethod { .. })
        ));
    }

    #[test]
    fn test_closed_session_rejects_calls() {
        let transport = RecordingTransport::new();
        transport.push(Response::ok("shutting down"));
        let ctx = context(transport.clone());
        ctx.shutdown().unwrap();
        ctx.shutdown().unwrap();

        let page = RemoteHandle::new("Page@3", "Page", ctx);
        assert!(matches!(page.call("url", vec![]), Err(ConnectError::SessionClosed)));
        assert_eq!(transport.shutdowns(), 1);
    }
}

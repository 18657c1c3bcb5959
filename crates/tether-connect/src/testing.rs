//! In-memory transport for unit tests.

use crate::error::ConnectError;
use crate::handle::SessionContext;
use crate::transport::Transport;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tether_proto::{CommandRequest, Response, SessionRequest};
use tether_spec::SpecRegistry;

#[derive(Default)]
struct Recorded {
    replies: VecDeque<Response>,
    sessions: Vec<SessionRequest>,
    commands: Vec<CommandRequest>,
    shutdowns: usize,
}

/// Records every request and answers from a queue, then with `null`.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Response) {
        self.inner.lock().unwrap().replies.push_back(response);
    }

    pub fn sessions(&self) -> Vec<SessionRequest> {
        self.inner.lock().unwrap().sessions.clone()
    }

    pub fn commands(&self) -> Vec<CommandRequest> {
        self.inner.lock().unwrap().commands.clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.inner.lock().unwrap().shutdowns
    }

    fn next(&self) -> Response {
        self.inner
            .lock()
            .unwrap()
            .replies
            .pop_front()
            .unwrap_or_else(|| Response::ok(Value::Null))
    }
}

impl Transport for RecordingTransport {
    fn open_session(&self, request: &SessionRequest) -> Result<Response, ConnectError> {
        self.inner.lock().unwrap().sessions.push(request.clone());
        Ok(self.next())
    }

    fn command(&self, request: &CommandRequest) -> Result<Response, ConnectError> {
        self.inner.lock().unwrap().commands.push(request.clone());
        Ok(self.next())
    }

    fn shutdown(&self) -> Result<Response, ConnectError> {
        self.inner.lock().unwrap().shutdowns += 1;
        Ok(self.next())
    }
}

pub fn sandbox_spec() -> Arc<SpecRegistry> {
    Arc::new(SpecRegistry::from_json_str(include_str!("../../../specs/sandbox.json")).unwrap())
}

pub fn context(transport: RecordingTransport) -> Arc<SessionContext> {
    Arc::new(SessionContext::from_registry(sandbox_spec(), Arc::new(transport)))
}

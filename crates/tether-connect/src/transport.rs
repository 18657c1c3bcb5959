//! Wire transport between a client and a host.

use crate::error::ConnectError;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use tether_proto::{
    CommandRequest, Response, SessionRequest, COMMAND_PATH, HEALTH_PATH, SESSION_PATH,
    SHUTDOWN_PATH,
};
use tracing::debug;

/// One blocking request/response exchange per call.
///
/// Error-flagged responses are returned as `Ok`; only failures to reach the
/// host or decode its answer are errors here.
pub trait Transport: Send + Sync {
    fn open_session(&self, request: &SessionRequest) -> Result<Response, ConnectError>;

    fn command(&self, request: &CommandRequest) -> Result<Response, ConnectError>;

    fn shutdown(&self) -> Result<Response, ConnectError>;
}

/// HTTP transport against a host on `http://<host>:<port>`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConnectError> {
        // Calls have no deadline; only the readiness wait is bounded.
        let client = Client::builder().timeout(None).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Transport for a host listening on the loopback interface.
    pub fn local(port: u16) -> Result<Self, ConnectError> {
        Self::new(format!("http://127.0.0.1:{}", port))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Asks the host whether it is serving, giving up after `timeout`.
    pub fn health(&self, timeout: Duration) -> Result<Response, ConnectError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()?
            .error_for_status()?
            .json::<Response>()?;
        Ok(response)
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response, ConnectError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()?
            .error_for_status()?
            .json::<Response>()?;
        debug!("POST {} -> error={}", path, response.error);
        Ok(response)
    }
}

impl Transport for HttpTransport {
    fn open_session(&self, request: &SessionRequest) -> Result<Response, ConnectError> {
        self.post(SESSION_PATH, request)
    }

    fn command(&self, request: &CommandRequest) -> Result<Response, ConnectError> {
        debug!(
            "{} {}.{} ({} args)",
            request.object.as_deref().unwrap_or("-"),
            request.class,
            request.command,
            request.args.len()
        );
        self.post(COMMAND_PATH, request)
    }

    fn shutdown(&self) -> Result<Response, ConnectError> {
        let url = format!("{}{}", self.base_url, SHUTDOWN_PATH);
        let response = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json::<Response>()?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let transport = HttpTransport::new("http://127.0.0.1:9000/").unwrap();
        assert_eq!(transport.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_unreachable_host_is_a_transport_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let transport = HttpTransport::local(port).unwrap();
        let result = transport.command(&CommandRequest::new("Page", "Page@1", "url", vec![]));
        assert!(matches!(result, Err(ConnectError::Transport(_))));
    }

    #[test]
    fn test_silent_listener_fails_health_check() {
        // accepts connections through the backlog but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let transport = HttpTransport::local(port).unwrap();

        let started = std::time::Instant::now();
        let result = transport.health(Duration::from_millis(200));
        assert!(matches!(result, Err(ConnectError::Transport(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

/*!
 * Integration tests for the script runner
 *
 * A fake transport stands in for the host so the runner's binding and
 * scoping rules can be checked without spawning a process.
 */

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tether::{
    error::{TetherError, EXIT_PARTIAL},
    script::{self, Script},
    Session, SessionRoot, SpecRegistry,
};
use tether_connect::{ConnectError, Transport};
use tether_proto::{CommandRequest, Response, SessionRequest};

const SPEC: &str = include_str!("../specs/sandbox.json");

/// Answers like a host with one browser whose pages are numbered from 2
#[derive(Clone, Default)]
struct FakeHost {
    sent: Arc<Mutex<Vec<CommandRequest>>>,
}

impl FakeHost {
    fn sent(&self) -> Vec<CommandRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for FakeHost {
    fn open_session(&self, _request: &SessionRequest) -> Result<Response, ConnectError> {
        Ok(Response::ok(json!({"_guid": "Browser@1", "_type": "Browser"})))
    }

    fn command(&self, request: &CommandRequest) -> Result<Response, ConnectError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(request.clone());
        Ok(match request.command.as_str() {
            "newPage" => Response::ok(json!({"_guid": format!("Page@{}", sent.len() + 1), "_type": "Page"})),
            "goto" if request.args.first() == Some(&json!("")) => Response::failure("url is empty"),
            "url" => Response::ok("https://example.test/"),
            _ => Response::ok(Value::Null),
        })
    }

    fn shutdown(&self) -> Result<Response, ConnectError> {
        Ok(Response::ok("shutting down"))
    }
}

fn session(host: &FakeHost) -> SessionRoot {
    let spec = Arc::new(SpecRegistry::from_json_str(SPEC).unwrap());
    Session::new(spec)
        .open(Arc::new(host.clone()), "chromium", vec![], None)
        .unwrap()
}

fn script(source: &str) -> Script {
    serde_json::from_str(source).unwrap()
}

#[test]
fn test_bindings_and_scoped_calls() {
    let host = FakeHost::default();
    let root = session(&host);

    let steps = script(
        r#"[
            {"call": "newPage", "bind": "page"},
            {"on": "page", "call": "goto", "args": ["https://example.test/"]},
            {"on": "page", "call": "keyboard.type", "args": ["hi"]},
            {"on": "page", "call": "url"}
        ]"#,
    );

    let mut seen = Vec::new();
    let outcomes = script::run(&steps, &root, |o| seen.push(o.step)).unwrap();

    assert_eq!(seen, vec![1, 2, 3, 4]);
    assert_eq!(outcomes[0].result, json!({"_guid": "Page@2", "_type": "Page"}));
    assert_eq!(outcomes[3].result, json!("https://example.test/"));

    let sent = host.sent();
    assert_eq!(sent[1].object.as_deref(), Some("Page@2"));
    assert_eq!(sent[2].command, "keyboard.type");
    assert_eq!(sent[2].class, "Page");
}

#[test]
fn test_unknown_binding_stops_the_run() {
    let host = FakeHost::default();
    let root = session(&host);

    let steps = script(r#"[{"on": "page", "call": "url"}]"#);
    let err = script::run(&steps, &root, |_| {}).unwrap_err();

    assert!(matches!(err, TetherError::UnknownBinding { step: 1, .. }));
    assert!(host.sent().is_empty());
}

#[test]
fn test_remote_failure_is_reported_with_step() {
    let host = FakeHost::default();
    let root = session(&host);

    let steps = script(
        r#"[
            {"call": "newPage", "bind": "page"},
            {"on": "page", "call": "goto", "args": [""]},
            {"on": "page", "call": "url"}
        ]"#,
    );
    let err = script::run(&steps, &root, |_| {}).unwrap_err();

    assert!(err.is_remote());
    assert_eq!(err.exit_code(), EXIT_PARTIAL);
    assert!(matches!(err, TetherError::Step { step: 2, .. }));
    assert_eq!(host.sent().len(), 2);
}

#[test]
fn test_undeclared_member_is_never_sent() {
    let host = FakeHost::default();
    let root = session(&host);

    let steps = script(
        r#"[
            {"call": "newPage", "bind": "page"},
            {"on": "page", "call": "evaluate", "args": ["1 + 1"]}
        ]"#,
    );
    let err = script::run(&steps, &root, |_| {}).unwrap_err();

    assert!(matches!(
        err,
        TetherError::Step {
            source: ConnectError::NoSuchMethod { .. },
            ..
        }
    ));
    assert_eq!(host.sent().len(), 1);
}

#[test]
fn test_binding_a_plain_value_fails() {
    let host = FakeHost::default();
    let root = session(&host);

    let steps = script(r#"[{"call": "version", "bind": "v"}]"#);
    let err = script::run(&steps, &root, |_| {}).unwrap_err();

    assert!(matches!(
        err,
        TetherError::Step {
            source: ConnectError::UnexpectedReply { .. },
            ..
        }
    ));
}

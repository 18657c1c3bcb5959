//! Proxy behaviour over a scripted transport.

use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tether_connect::{ConnectError, RemoteHandle, Session, SessionRoot, Transport};
use tether_proto::{CommandRequest, Response, SessionRequest};
use tether_spec::SpecRegistry;

const WIDGET_SPEC: &str = r#"{
    "classes": [
        {"name": "Panel", "members": [
            {"name": "widget", "returns": "Widget"},
            {"name": "widgets"}
        ]},
        {"name": "Widget", "members": [
            {"name": "press", "args": [{"name": "key", "type": "string", "optional": true}]},
            {"name": "label", "kind": "property"}
        ]},
        {"name": "Page", "members": [{"name": "title"}]}
    ]
}"#;

#[derive(Clone, Default)]
struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Response>>>,
    sent: Arc<Mutex<Vec<CommandRequest>>>,
}

impl ScriptedTransport {
    fn reply(&self, message: Value) {
        self.replies.lock().unwrap().push_back(Response::ok(message));
    }

    fn sent(&self) -> Vec<CommandRequest> {
        self.sent.lock().unwrap().clone()
    }

    fn next(&self) -> Response {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Response::ok(Value::Null))
    }
}

impl Transport for ScriptedTransport {
    fn open_session(&self, _request: &SessionRequest) -> Result<Response, ConnectError> {
        Ok(Response::ok(json!({"_guid": "Panel@1", "_type": "Panel"})))
    }

    fn command(&self, request: &CommandRequest) -> Result<Response, ConnectError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(self.next())
    }

    fn shutdown(&self) -> Result<Response, ConnectError> {
        Ok(Response::ok("shutting down"))
    }
}

fn open(transport: &ScriptedTransport) -> SessionRoot {
    let spec = Arc::new(SpecRegistry::from_json_str(WIDGET_SPEC).unwrap());
    Session::new(spec)
        .open(Arc::new(transport.clone()), "chromium", vec![], None)
        .unwrap()
}

#[test]
fn test_widget_press_sends_method_class_and_guid() {
    let transport = ScriptedTransport::default();
    let panel = open(&transport);

    let widget = RemoteHandle::new("Widget@1", "Widget", panel.context().clone());
    transport.reply(json!(true));
    let reply = widget.call("press", vec![json!("x")]).unwrap();

    assert_eq!(reply.as_bool(), Some(true));
    assert_eq!(
        transport.sent(),
        vec![CommandRequest::new("Widget", "Widget@1", "press", vec![json!("x")])]
    );
}

#[test]
fn test_page_reference_becomes_handle() {
    let transport = ScriptedTransport::default();
    let panel = open(&transport);

    transport.reply(json!({"_guid": "Page@7", "_type": "Page"}));
    let page = panel.call("widget", vec![]).unwrap().into_handle().unwrap();

    assert_eq!(page.guid(), "Page@7");
    assert_eq!(page.class_name(), "Page");
    assert!(!page.is_root());

    page.call("title", vec![]).unwrap();
    assert_eq!(transport.sent()[1].object.as_deref(), Some("Page@7"));
}

#[test]
fn test_list_of_references() {
    let transport = ScriptedTransport::default();
    let panel = open(&transport);

    transport.reply(json!([
        {"_guid": "W-1", "_type": "Widget"},
        {"_guid": "W-2", "_type": "Widget"}
    ]));
    let widgets = panel.call("widgets", vec![]).unwrap().handles().unwrap();

    let guids: Vec<&str> = widgets.iter().map(RemoteHandle::guid).collect();
    assert_eq!(guids, vec!["W-1", "W-2"]);
}

#[test]
fn test_unrecognized_tag_stays_a_value() {
    let transport = ScriptedTransport::default();
    let panel = open(&transport);

    let payload = json!({"_guid": "Gizmo@1", "_type": "Gizmo"});
    transport.reply(payload.clone());

    assert_eq!(
        panel.call("widget", vec![]).unwrap().into_value().unwrap(),
        payload
    );
}

#[test]
fn test_registered_tag_is_recognized() {
    let transport = ScriptedTransport::default();
    let spec = Arc::new(SpecRegistry::from_json_str(WIDGET_SPEC).unwrap());
    let panel = Session::new(spec)
        .register_tag("Gizmo", |guid, _class, context| {
            RemoteHandle::new(guid, "Widget", context)
        })
        .open(Arc::new(transport.clone()), "chromium", vec![], None)
        .unwrap();

    transport.reply(json!({"_guid": "Gizmo@1", "_type": "Gizmo"}));
    let gizmo = panel.call("widget", vec![]).unwrap().into_handle().unwrap();

    assert_eq!(gizmo.class_name(), "Widget");
    gizmo.call("press", vec![]).unwrap();
    assert_eq!(transport.sent()[1].class, "Widget");
}

#[test]
fn test_undeclared_method_is_not_sent() {
    let transport = ScriptedTransport::default();
    let panel = open(&transport);

    match panel.call("explode", vec![]) {
        Err(ConnectError::NoSuchMethod { class, method }) => {
            assert_eq!(class, "Panel");
            assert_eq!(method, "explode");
        }
        other => panic!("expected NoSuchMethod, got {:?}", other),
    }
    assert!(transport.sent().is_empty());
}

#[test]
fn test_guid_round_trips_through_native_method() {
    let transport = ScriptedTransport::default();
    let panel = open(&transport);

    let widget = RemoteHandle::new("W-42", "Widget", panel.context().clone());
    assert_eq!(widget.call("guid", vec![]).unwrap().as_str(), Some("W-42"));
    assert!(transport.sent().is_empty());
}

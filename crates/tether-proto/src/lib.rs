//! Wire envelopes for the Tether bridge.
//!
//! Every exchange between a client and a host is a single JSON request answered
//! by a single JSON [`Response`]. Remote objects never travel by value: they are
//! replaced by an [`ObjectRef`] carrying the `_guid` and `_type` tags, which the
//! client turns back into a proxy.
//!
//! ```text
//! POST /session   { "type": "chromium", "args": [] }
//! POST /command   { "type": "Page", "object": "Page@2", "command": "goto", "args": ["about:blank"] }
//! GET  /shutdown
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opens a session and constructs the root remote object.
pub const SESSION_PATH: &str = "/session";

/// General dispatch endpoint.
pub const COMMAND_PATH: &str = "/command";

/// Acknowledges, then stops the host process.
pub const SHUTDOWN_PATH: &str = "/shutdown";

/// Readiness probe.
pub const HEALTH_PATH: &str = "/health";

/// Key carrying the identifier of a remote object.
pub const GUID_KEY: &str = "_guid";

/// Key carrying the class name of a remote object.
pub const TYPE_KEY: &str = "_type";

/// Root object kinds a host may be asked to launch.
pub const KNOWN_TARGETS: [&str; 3] = ["chromium", "firefox", "webkit"];

/// Separates scoped sub-target hops from the final member in a command name
/// (`mouse.click`).
pub const SCOPE_SEPARATOR: char = '.';

/// Body of `POST /session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Root object kind, e.g. `chromium`.
    #[serde(rename = "type")]
    pub target: String,

    /// Launch arguments forwarded to the root factory.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl SessionRequest {
    pub fn new(target: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            args,
        }
    }
}

/// Body of `POST /command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Class name of the target object as the caller knows it.
    #[serde(rename = "type")]
    pub class: String,

    /// Guid of the target object.
    #[serde(default)]
    pub object: Option<String>,

    /// Member name, optionally prefixed by scoped hops (`keyboard.type`).
    pub command: String,

    /// Ordered call arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl CommandRequest {
    pub fn new(
        class: impl Into<String>,
        object: impl Into<String>,
        command: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            class: class.into(),
            object: Some(object.into()),
            command: command.into(),
            args,
        }
    }

    /// Splits the command into its scoped hops and the final member name.
    ///
    /// `"mouse.click"` yields `(["mouse"], "click")`, `"goto"` yields `([], "goto")`.
    pub fn path(&self) -> (Vec<&str>, &str) {
        let mut hops: Vec<&str> = self.command.split(SCOPE_SEPARATOR).collect();
        let member = hops.pop().unwrap_or_default();
        (hops, member)
    }
}

/// Answer to every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub error: bool,
    pub message: Value,
}

impl Response {
    pub fn ok(message: impl Into<Value>) -> Self {
        Self {
            error: false,
            message: message.into(),
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            error: true,
            message: Value::String(description.into()),
        }
    }

    /// Converts the in-band error flag into a `Result`.
    ///
    /// The error side carries the failure description as text.
    pub fn into_result(self) -> Result<Value, String> {
        if self.error {
            Err(match self.message {
                Value::String(s) => s,
                other => other.to_string(),
            })
        } else {
            Ok(self.message)
        }
    }
}

/// Reference to a remote object as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(rename = "_guid")]
    pub guid: String,

    #[serde(rename = "_type")]
    pub class: String,
}

impl ObjectRef {
    pub fn new(guid: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            class: class.into(),
        }
    }

    /// Reads the tags from a JSON object. Extra fields are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let guid = map.get(GUID_KEY)?.as_str()?;
        let class = map.get(TYPE_KEY)?.as_str()?;
        Some(Self::new(guid, class))
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(GUID_KEY.to_string(), Value::String(self.guid.clone()));
        map.insert(TYPE_KEY.to_string(), Value::String(self.class.clone()));
        Value::Object(map)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        obj.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_request_wire_names() {
        let req = CommandRequest::new("Widget", "Widget@1", "press", vec![json!("x")]);
        let encoded = serde_json::to_value(&req).unwrap();

        assert_eq!(
            encoded,
            json!({"type": "Widget", "object": "Widget@1", "command": "press", "args": ["x"]})
        );
    }

    #[test]
    fn test_command_request_null_object() {
        let req: CommandRequest =
            serde_json::from_value(json!({"type": "Page", "object": null, "command": "goto"}))
                .unwrap();

        assert!(req.object.is_none());
        assert!(req.args.is_empty());
    }

    #[test]
    fn test_command_path_split() {
        let scoped = CommandRequest::new("Page", "Page@1", "mouse.click", vec![]);
        assert_eq!(scoped.path(), (vec!["mouse"], "click"));

        let plain = CommandRequest::new("Page", "Page@1", "goto", vec![]);
        assert_eq!(plain.path(), (vec![], "goto"));
    }

    #[test]
    fn test_response_into_result() {
        assert_eq!(Response::ok(true).into_result(), Ok(json!(true)));
        assert_eq!(
            Response::failure("boom").into_result(),
            Err("boom".to_string())
        );

        let structured = Response {
            error: true,
            message: json!({"reason": 1}),
        };
        assert_eq!(structured.into_result(), Err("{\"reason\":1}".to_string()));
    }

    #[test]
    fn test_object_ref_tags() {
        let value = json!({"_guid": "Page@7", "_type": "Page", "extra": 1});
        let obj = ObjectRef::from_value(&value).unwrap();

        assert_eq!(obj, ObjectRef::new("Page@7", "Page"));
        assert_eq!(obj.to_value(), json!({"_guid": "Page@7", "_type": "Page"}));
    }

    #[test]
    fn test_object_ref_requires_both_tags() {
        assert!(ObjectRef::from_value(&json!({"_guid": "Page@7"})).is_none());
        assert!(ObjectRef::from_value(&json!({"_type": "Page"})).is_none());
        assert!(ObjectRef::from_value(&json!({"_guid": 7, "_type": "Page"})).is_none());
        assert!(ObjectRef::from_value(&json!("Page@7")).is_none());
    }
}

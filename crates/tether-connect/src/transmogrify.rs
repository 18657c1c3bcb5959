//! Turns response payloads into handles.
//!
//! Payloads tagged with `_guid`/`_type` whose type has a registered
//! constructor become [`RemoteHandle`]s. Arrays become lists when at least one
//! element does. Everything else passes through unchanged.

use crate::error::ConnectError;
use crate::handle::{RemoteHandle, SessionContext};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tether_proto::ObjectRef;
use tether_spec::SpecRegistry;

/// Builds a handle from a guid and class name.
pub type Constructor = fn(String, String, Arc<SessionContext>) -> RemoteHandle;

/// Result of a forwarded call.
#[derive(Debug, Clone)]
pub enum Reply {
    Value(Value),
    Handle(RemoteHandle),
    List(Vec<Reply>),
}

impl Reply {
    pub fn into_handle(self) -> Result<RemoteHandle, ConnectError> {
        match self {
            Reply::Handle(handle) => Ok(handle),
            other => Err(other.unexpected("a handle")),
        }
    }

    pub fn into_value(self) -> Result<Value, ConnectError> {
        match self {
            Reply::Value(value) => Ok(value),
            other => Err(other.unexpected("a value")),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Reply::Value(value) => value.as_bool(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Value(value) => value.as_str(),
            _ => None,
        }
    }

    /// The handles of a list reply, in order. Plain elements are skipped.
    pub fn handles(self) -> Result<Vec<RemoteHandle>, ConnectError> {
        match self {
            Reply::List(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Reply::Handle(handle) => Some(handle),
                    _ => None,
                })
                .collect()),
            // An empty array never converts, so it arrives as a plain value.
            Reply::Value(Value::Array(items)) if items.is_empty() => Ok(Vec::new()),
            other => Err(other.unexpected("a list")),
        }
    }

    /// JSON form, with handles written back as wire references.
    pub fn to_json(&self) -> Value {
        match self {
            Reply::Value(value) => value.clone(),
            Reply::Handle(handle) => ObjectRef::new(handle.guid(), handle.class_name()).to_value(),
            Reply::List(items) => Value::Array(items.iter().map(Reply::to_json).collect()),
        }
    }

    fn unexpected(&self, expected: &'static str) -> ConnectError {
        ConnectError::UnexpectedReply {
            expected,
            got: self.to_json().to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct Transmogrifier {
    constructors: HashMap<String, Constructor>,
}

impl std::fmt::Debug for Transmogrifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&String> = self.constructors.keys().collect();
        tags.sort();
        f.debug_struct("Transmogrifier").field("tags", &tags).finish()
    }
}

fn plain_handle(guid: String, class: String, context: Arc<SessionContext>) -> RemoteHandle {
    RemoteHandle::new(guid, class, context)
}

impl Transmogrifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognizes every class the registry declares.
    pub fn from_registry(spec: &SpecRegistry) -> Self {
        let mut transmogrifier = Self::new();
        for class in spec.classes() {
            transmogrifier.register(&class.name, plain_handle);
        }
        transmogrifier
    }

    pub fn register(&mut self, tag: &str, constructor: Constructor) {
        self.constructors.insert(tag.to_string(), constructor);
    }

    pub fn recognizes(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    pub fn convert(&self, value: Value, context: &Arc<SessionContext>) -> Reply {
        match value {
            Value::Object(_) => match self.reference(&value) {
                Some((reference, constructor)) => Reply::Handle(constructor(
                    reference.guid,
                    reference.class,
                    context.clone(),
                )),
                None => Reply::Value(value),
            },
            Value::Array(items) if items.iter().any(|item| self.converts(item)) => Reply::List(
                items
                    .into_iter()
                    .map(|item| self.convert(item, context))
                    .collect(),
            ),
            other => Reply::Value(other),
        }
    }

    fn reference(&self, value: &Value) -> Option<(ObjectRef, Constructor)> {
        let reference = ObjectRef::from_value(value)?;
        let constructor = *self.constructors.get(&reference.class)?;
        Some((reference, constructor))
    }

    fn converts(&self, value: &Value) -> bool {
        match value {
            Value::Object(_) => self.reference(value).is_some(),
            Value::Array(items) => items.iter().any(|item| self.converts(item)),
            _ => false,
        }
    }
}

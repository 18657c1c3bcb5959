//! The seam between the dispatcher and the automation engine.

use crate::error::InvocationError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A live object owned by the automation engine.
///
/// The host never inspects an object beyond this surface: it asks for its
/// class and identity, forwards invocations, and follows scoped sub-targets.
#[async_trait]
pub trait RemoteObject: Send + Sync {
    /// Class name as declared in the specification.
    fn class_name(&self) -> &str;

    /// Identity assigned by the engine, if the object carries one.
    fn guid(&self) -> Option<&str>;

    /// Executes a member. May suspend while the engine waits on external events.
    async fn invoke(&self, member: &str, args: Vec<Value>) -> Result<Outcome, InvocationError>;

    /// Nested facility reachable for the rest of a single request
    /// (`page.mouse`). Never registered under its own guid.
    fn scoped(&self, _member: &str) -> Option<Arc<dyn RemoteObject>> {
        None
    }
}

impl fmt::Debug for dyn RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteObject")
            .field("class", &self.class_name())
            .field("guid", &self.guid())
            .finish()
    }
}

/// What a successful invocation produced.
#[derive(Debug)]
pub enum Outcome {
    /// Plain data, returned as is
    Value(Value),

    /// A remote object, registered before it is returned
    Object(Arc<dyn RemoteObject>),

    /// A sequence; every element is handled on its own
    List(Vec<Outcome>),
}

impl Outcome {
    pub fn null() -> Self {
        Outcome::Value(Value::Null)
    }

    pub fn object(obj: Arc<dyn RemoteObject>) -> Self {
        Outcome::Object(obj)
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

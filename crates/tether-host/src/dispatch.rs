//! Request dispatch against the remote object table.
//!
//! Every request runs the same state machine:
//!
//! ```text
//! resolve guid ──> walk scoped hops ──> check declaration ──> invoke ──> register results
//!      │                 │                  │                    │
//!      └─ UnknownObject  └─ Unsupported     └─ Unsupported       └─ {error: true, message}
//! ```
//!
//! Failures at any step end the request only; they are rendered into an
//! error-flagged [`Response`] and the host keeps serving.

use crate::error::DispatchError;
use crate::object::{Outcome, RemoteObject};
use crate::table::{IdentityPolicy, ObjectTable};
use crate::targets::TargetRegistry;
use serde_json::Value;
use std::sync::Arc;
use tether_proto::{CommandRequest, Response, SessionRequest};
use tether_spec::SpecRegistry;
use tracing::debug;

/// Everything a host needs to serve one session.
///
/// Owned by the server and shared by reference with every handler; nothing
/// here lives in process-wide globals.
pub struct HostContext {
    spec: Arc<SpecRegistry>,
    objects: ObjectTable,
    policy: IdentityPolicy,
    targets: TargetRegistry,
}

impl HostContext {
    pub fn new(spec: Arc<SpecRegistry>, targets: TargetRegistry) -> Self {
        Self {
            spec,
            objects: ObjectTable::new(),
            policy: IdentityPolicy::default(),
            targets,
        }
    }

    pub fn with_policy(mut self, policy: IdentityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn spec(&self) -> &SpecRegistry {
        &self.spec
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    /// `POST /session`: builds and registers the root object.
    pub async fn open_session(&self, request: SessionRequest) -> Response {
        debug!("Session request for {}", request.target);
        respond(self.try_open_session(request).await)
    }

    async fn try_open_session(&self, request: SessionRequest) -> Result<Value, DispatchError> {
        let root = self.targets.create(&request.target, &request.args)?;
        self.register(Outcome::Object(root)).await
    }

    /// `POST /command`: resolves, checks, invokes and registers.
    pub async fn dispatch(&self, request: CommandRequest) -> Response {
        debug!(
            "Dispatch {}.{} on {:?} ({} args)",
            request.class,
            request.command,
            request.object,
            request.args.len()
        );
        respond(self.try_dispatch(request).await)
    }

    async fn try_dispatch(&self, request: CommandRequest) -> Result<Value, DispatchError> {
        let (hops, member) = request.path();
        let (hops, member): (Vec<String>, String) =
            (hops.into_iter().map(str::to_string).collect(), member.to_string());
        let CommandRequest {
            class,
            object,
            args,
            ..
        } = request;

        let guid = object.ok_or_else(|| DispatchError::MissingObject(member.clone()))?;
        let mut target = self
            .objects
            .resolve(&guid)
            .await
            .ok_or_else(|| DispatchError::UnknownObject(guid.clone()))?;

        if target.class_name() != class {
            return Err(DispatchError::TypeMismatch {
                named: class,
                guid,
                actual: target.class_name().to_string(),
            });
        }

        let mut class = class;
        for hop in &hops {
            let (next, next_class) = self.enter_scope(target.as_ref(), &class, hop)?;
            target = next;
            class = next_class;
        }

        let descriptor =
            self.spec
                .member(&class, &member)
                .ok_or_else(|| DispatchError::UnsupportedCommand {
                    class: class.clone(),
                    command: member.clone(),
                })?;

        if descriptor.is_scope() {
            return Err(DispatchError::ScopeNotCallable { class, member });
        }

        let outcome = target.invoke(&member, args).await?;
        self.register(outcome).await
    }

    /// Follows one scoped hop (`mouse`) for the rest of the current request.
    fn enter_scope(
        &self,
        target: &dyn RemoteObject,
        class: &str,
        hop: &str,
    ) -> Result<(Arc<dyn RemoteObject>, String), DispatchError> {
        let unsupported = || DispatchError::UnsupportedCommand {
            class: class.to_string(),
            command: hop.to_string(),
        };

        let descriptor = self
            .spec
            .member(class, hop)
            .filter(|d| d.is_scope())
            .ok_or_else(unsupported)?;

        let next = target.scoped(hop).ok_or_else(unsupported)?;
        let next_class = descriptor
            .returns
            .clone()
            .unwrap_or_else(|| next.class_name().to_string());

        debug!("Scoped {}.{} -> {}", class, hop, next_class);
        Ok((next, next_class))
    }

    /// Registers every object in an outcome and encodes it for the wire.
    ///
    /// All new entries of one outcome are added under a single table write.
    async fn register(&self, outcome: Outcome) -> Result<Value, DispatchError> {
        let mut entries = Vec::new();
        let message = self.encode(outcome, &mut entries)?;
        let added = self.objects.insert_all(entries).await;
        if added > 0 {
            debug!("{} new objects registered", added);
        }
        Ok(message)
    }

    fn encode(
        &self,
        outcome: Outcome,
        entries: &mut Vec<(String, Arc<dyn RemoteObject>)>,
    ) -> Result<Value, DispatchError> {
        match outcome {
            Outcome::Value(value) => Ok(value),
            Outcome::Object(obj) => {
                let reference = self.policy.identify(obj.as_ref())?;
                entries.push((reference.guid.clone(), obj));
                Ok(reference.to_value())
            }
            Outcome::List(items) => items
                .into_iter()
                .map(|item| self.encode(item, entries))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }
}

fn respond(result: Result<Value, DispatchError>) -> Response {
    match result {
        Ok(message) => Response::ok(message),
        Err(err) => {
            debug!("Request failed: {}", err);
            Response::failure(err.to_string())
        }
    }
}

//! Root object factories for `POST /session`.

use crate::error::{DispatchError, InvocationError};
use crate::object::RemoteObject;
use crate::sandbox::{Engine, LaunchSettings};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tether_proto::KNOWN_TARGETS;
use tracing::info;

/// Builds the root object of a session from its launch arguments.
pub type RootFactory =
    Arc<dyn Fn(&[Value]) -> Result<Arc<dyn RemoteObject>, InvocationError> + Send + Sync>;

/// Root object kinds this host can construct, by type tag.
#[derive(Clone, Default)]
pub struct TargetRegistry {
    factories: HashMap<String, RootFactory>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known target backed by the in-memory sandbox engine.
    pub fn sandbox(settings: LaunchSettings) -> Self {
        let engine = Engine::new();
        let mut registry = Self::new();

        for target in KNOWN_TARGETS {
            let engine = engine.clone();
            registry.register(target, move |args: &[Value]| {
                let root: Arc<dyn RemoteObject> = engine.launch(target, settings.with_args(args));
                Ok(root)
            });
        }

        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&[Value]) -> Result<Arc<dyn RemoteObject>, InvocationError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn supports(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn create(&self, name: &str, args: &[Value]) -> Result<Arc<dyn RemoteObject>, DispatchError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DispatchError::UnsupportedTarget(name.to_string()))?;

        let root = factory(args)?;
        info!("Launched {} root {:?}", name, root.guid());
        Ok(root)
    }
}

//! Per-class capability tables.
//!
//! A [`StubTable`] maps `(class, method)` to either a native method that runs
//! locally or a forwarding stub that turns the call into a command request.
//! Native names always win: installing declared members never replaces them, and
//! installing the same member twice leaves the table unchanged.

use crate::error::ConnectError;
use crate::handle::RemoteHandle;
use crate::transmogrify::Reply;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use tether_spec::{MemberMap, SpecRegistry};
use tracing::debug;

/// Local behaviour of a native method.
pub type NativeFn = fn(&RemoteHandle, Vec<Value>) -> Result<Reply, ConnectError>;

#[derive(Clone, Copy)]
pub enum Stub {
    Native(NativeFn),
    Forward,
}

impl Stub {
    pub fn is_native(&self) -> bool {
        matches!(self, Stub::Native(_))
    }
}

impl std::fmt::Debug for Stub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stub::Native(_) => f.write_str("Native"),
            Stub::Forward => f.write_str("Forward"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StubTable {
    /// Natives every handle carries.
    common: BTreeMap<String, Stub>,
    /// Natives only the session root carries.
    root: BTreeMap<String, Stub>,
    classes: HashMap<String, BTreeMap<String, Stub>>,
}

impl Default for StubTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StubTable {
    /// A table holding only the native methods.
    pub fn new() -> Self {
        let mut common = BTreeMap::new();
        common.insert("guid".to_string(), Stub::Native(native_guid));
        common.insert("class_name".to_string(), Stub::Native(native_class_name));
        common.insert("describe".to_string(), Stub::Native(native_describe));

        let mut root = BTreeMap::new();
        root.insert("close".to_string(), Stub::Native(native_close));

        Self {
            common,
            root,
            classes: HashMap::new(),
        }
    }

    /// Builds the table for every class the registry declares.
    pub fn from_registry(spec: &SpecRegistry) -> Self {
        let mut table = Self::new();
        for class in spec.classes() {
            table.install(&class.name, &class.members);
        }
        table
    }

    /// Installs a forwarding stub for each member not already present.
    ///
    /// Returns how many stubs were added.
    pub fn install(&mut self, class: &str, members: &MemberMap) -> usize {
        let methods = self.classes.entry(class.to_string()).or_default();
        let mut added = 0;
        for name in members.keys() {
            if self.common.contains_key(name) || methods.contains_key(name) {
                continue;
            }
            methods.insert(name.clone(), Stub::Forward);
            added += 1;
        }
        debug!("Installed {} stubs on {}", added, class);
        added
    }

    /// Adds a native method to one class, replacing a forwarding stub.
    pub fn install_native(&mut self, class: &str, name: &str, native: NativeFn) {
        self.classes
            .entry(class.to_string())
            .or_default()
            .insert(name.to_string(), Stub::Native(native));
    }

    /// Resolves a method for a handle of `class`.
    pub fn get(&self, class: &str, method: &str, is_root: bool) -> Option<Stub> {
        if is_root {
            if let Some(stub) = self.root.get(method) {
                return Some(*stub);
            }
        }
        self.common
            .get(method)
            .or_else(|| self.classes.get(class).and_then(|m| m.get(method)))
            .copied()
    }

    /// Whether a non-root handle of `class` would forward `method`.
    pub fn forwards(&self, class: &str, method: &str) -> bool {
        matches!(self.get(class, method, false), Some(Stub::Forward))
    }

    pub fn knows_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Every method name a handle of `class` answers, sorted.
    pub fn methods(&self, class: &str, is_root: bool) -> Vec<&str> {
        let mut names: Vec<&str> = self.common.keys().map(String::as_str).collect();
        if is_root {
            names.extend(self.root.keys().map(String::as_str));
        }
        if let Some(methods) = self.classes.get(class) {
            names.extend(methods.keys().map(String::as_str));
        }
        names.sort_unstable();
        names.dedup();
        names
    }
}

fn native_guid(handle: &RemoteHandle, _args: Vec<Value>) -> Result<Reply, ConnectError> {
    Ok(Reply::Value(json!(handle.guid())))
}

fn native_class_name(handle: &RemoteHandle, _args: Vec<Value>) -> Result<Reply, ConnectError> {
    Ok(Reply::Value(json!(handle.class_name())))
}

fn native_describe(handle: &RemoteHandle, _args: Vec<Value>) -> Result<Reply, ConnectError> {
    Ok(Reply::Value(json!(handle.methods())))
}

fn native_close(handle: &RemoteHandle, _args: Vec<Value>) -> Result<Reply, ConnectError> {
    handle.context().shutdown()?;
    Ok(Reply::Value(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_spec::{MemberDescriptor, MemberKind};

    fn members(names: &[&str]) -> MemberMap {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    MemberDescriptor {
                        kind: MemberKind::Method,
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_install_adds_forward_stubs() {
        let mut table = StubTable::new();
        assert_eq!(table.install("Widget", &members(&["press", "label"])), 2);

        assert!(table.forwards("Widget", "press"));
        assert!(table.forwards("Widget", "label"));
        assert!(table.get("Widget", "missing", false).is_none());
    }

    #[test]
    fn test_install_is_idempotent() {
        let mut table = StubTable::new();
        table.install("Widget", &members(&["press"]));
        assert_eq!(table.install("Widget", &members(&["press"])), 0);
        assert_eq!(table.methods("Widget", false).iter().filter(|m| **m == "press").count(), 1);
    }

    #[test]
    fn test_native_names_are_never_replaced() {
        let mut table = StubTable::new();
        assert_eq!(table.install("Widget", &members(&["guid", "press"])), 1);
        assert!(table.get("Widget", "guid", false).unwrap().is_native());
    }

    #[test]
    fn test_root_close_is_native_only_for_root() {
        let mut table = StubTable::new();
        table.install("Browser", &members(&["close"]));

        assert!(table.get("Browser", "close", true).unwrap().is_native());
        assert!(table.forwards("Browser", "close"));
    }

    #[test]
    fn test_install_native_replaces_forward() {
        let mut table = StubTable::new();
        table.install("Widget", &members(&["press"]));
        table.install_native("Widget", "press", native_guid);

        assert!(table.get("Widget", "press", false).unwrap().is_native());
        assert_eq!(table.install("Widget", &members(&["press"])), 0);
    }

    #[test]
    fn test_from_registry_covers_every_class() {
        let spec = SpecRegistry::from_json_str(
            r#"{"classes":[
                {"name":"Widget","members":[{"name":"press"}]},
                {"name":"Panel","members":[{"name":"open"},{"name":"items","kind":"property"}]}
            ]}"#,
        )
        .unwrap();
        let table = StubTable::from_registry(&spec);

        assert!(table.knows_class("Widget"));
        assert_eq!(
            table.methods("Panel", false),
            vec!["class_name", "describe", "guid", "items", "open"]
        );
    }
}

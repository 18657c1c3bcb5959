//! Remote object table and the identity policy feeding it.

use crate::error::DispatchError;
use crate::object::RemoteObject;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tether_proto::ObjectRef;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Guid to live object, shared by every request handler of one host.
///
/// Entries are only ever added. Once a guid is registered it keeps pointing at
/// the same object for the lifetime of the session.
#[derive(Default)]
pub struct ObjectTable {
    objects: RwLock<HashMap<String, Arc<dyn RemoteObject>>>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve(&self, guid: &str) -> Option<Arc<dyn RemoteObject>> {
        self.objects.read().await.get(guid).cloned()
    }

    pub async fn contains(&self, guid: &str) -> bool {
        self.objects.read().await.contains_key(guid)
    }

    /// Registers a batch under a single write lock.
    ///
    /// A guid that is already present keeps its existing object. Returns the
    /// number of new entries.
    pub async fn insert_all(&self, entries: Vec<(String, Arc<dyn RemoteObject>)>) -> usize {
        if entries.is_empty() {
            return 0;
        }

        let mut objects = self.objects.write().await;
        let mut added = 0;
        for (guid, obj) in entries {
            if let std::collections::hash_map::Entry::Vacant(slot) = objects.entry(guid) {
                debug!("Registered {} ({})", slot.key(), obj.class_name());
                slot.insert(obj);
                added += 1;
            }
        }
        added
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

/// Decides the guid under which a produced object is registered.
///
/// Objects that carry an engine-assigned guid keep it. Objects without one get
/// a freshly minted `"<Type>@<uuid>"` when their type is addressable, and are
/// rejected otherwise.
#[derive(Debug, Clone)]
pub struct IdentityPolicy {
    addressable: HashSet<String>,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self::new(["Video"])
    }
}

impl IdentityPolicy {
    pub fn new<I, S>(addressable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addressable: addressable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_addressable(&self, class: &str) -> bool {
        self.addressable.contains(class)
    }

    pub fn identify(&self, obj: &dyn RemoteObject) -> Result<ObjectRef, DispatchError> {
        let class = obj.class_name();
        match obj.guid() {
            Some(guid) => Ok(ObjectRef::new(guid, class)),
            None if self.is_addressable(class) => {
                let minted = format!("{}@{}", class, Uuid::new_v4());
                debug!("Minted identity {} for {}", minted, class);
                Ok(ObjectRef::new(minted, class))
            }
            None => Err(DispatchError::UnaddressableResult(class.to_string())),
        }
    }
}

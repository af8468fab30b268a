//! Mock object store for testing
//!
//! This store keeps objects in memory as JSON, useful for unit tests
//! without requiring a Kubernetes cluster. It hands out resource versions
//! like the API server does so stale updates fail with a conflict.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ObjectKey, ObjectStore, StoredObject};
use crate::error::{KubeError, Result};

/// Storage key: "apiVersion/kind", namespace, name
type TypedKey = (String, String, String);

/// In-memory object store for testing
#[derive(Clone, Default)]
pub struct MockObjectStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<TypedKey, serde_json::Value>,
    resource_version: u64,
    operations: OperationCounts,
    failing_reads: HashSet<ObjectKey>,
    failing_writes: HashSet<ObjectKey>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub creates: usize,
    pub updates: usize,
}

impl OperationCounts {
    /// Creates plus updates
    pub fn writes(&self) -> usize {
        self.creates + self.updates
    }

    pub fn total(&self) -> usize {
        self.gets + self.writes()
    }
}

fn typed_key<K: StoredObject>(key: &ObjectKey) -> TypedKey {
    (
        format!("{}/{}", K::api_version(&()), K::kind(&())),
        key.namespace.clone(),
        key.name.clone(),
    )
}

impl MockObjectStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MockObjectStore::insert`]
    pub fn with_object<K: StoredObject>(self, object: &K) -> Self {
        self.insert(object);
        self
    }

    /// Put an object in place without counting an operation
    ///
    /// Assigns a fresh resource version, so anyone holding an older copy
    /// now has a stale one.
    pub fn insert<K: StoredObject>(&self, object: &K) {
        let Ok(key) = ObjectKey::for_object(object) else {
            return;
        };
        let mut inner = self.write();
        let mut object = object.clone();
        object.meta_mut().resource_version = Some(inner.next_resource_version());
        if let Ok(value) = serde_json::to_value(&object) {
            inner.objects.insert(typed_key::<K>(&key), value);
        }
    }

    /// Read an object back without counting an operation
    pub fn object<K: StoredObject>(&self, key: &ObjectKey) -> Option<K> {
        self.read()
            .objects
            .get(&typed_key::<K>(key))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Make every read of `key` fail
    pub fn fail_reads_from(&self, key: ObjectKey) {
        self.write().failing_reads.insert(key);
    }

    /// Make every create or update of `key` fail
    pub fn fail_writes_to(&self, key: ObjectKey) {
        self.write().failing_writes.insert(key);
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.read().operations.clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        self.write().operations = OperationCounts::default();
    }

    /// Count stored objects of every type
    pub fn object_count(&self) -> usize {
        self.read().objects.len()
    }

    // A panicking test thread must not hide the store from the rest of the test.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Inner {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn check_write(&self, key: &ObjectKey) -> Result<()> {
        if self.failing_writes.contains(key) {
            return Err(KubeError::Storage(format!("injected write failure for {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn get<K: StoredObject>(&self, key: &ObjectKey) -> Result<Option<K>> {
        let mut inner = self.write();
        inner.operations.gets += 1;

        if inner.failing_reads.contains(key) {
            return Err(KubeError::Storage(format!("injected read failure for {}", key)));
        }

        inner
            .objects
            .get(&typed_key::<K>(key))
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(KubeError::from)
    }

    async fn create<K: StoredObject>(&self, object: &K) -> Result<K> {
        let key = ObjectKey::for_object(object)?;
        let mut inner = self.write();
        inner.operations.creates += 1;
        inner.check_write(&key)?;

        let slot = typed_key::<K>(&key);
        if inner.objects.contains_key(&slot) {
            return Err(KubeError::AlreadyExists {
                kind: K::kind(&()).to_string(),
                namespace: key.namespace,
                name: key.name,
            });
        }

        let mut created = object.clone();
        created.meta_mut().resource_version = Some(inner.next_resource_version());
        inner.objects.insert(slot, serde_json::to_value(&created)?);
        Ok(created)
    }

    async fn update<K: StoredObject>(&self, object: &K) -> Result<K> {
        let key = ObjectKey::for_object(object)?;
        let mut inner = self.write();
        inner.operations.updates += 1;
        inner.check_write(&key)?;

        let slot = typed_key::<K>(&key);
        let current = inner
            .objects
            .get(&slot)
            .ok_or_else(|| KubeError::Storage(format!("{} '{}' not found", K::kind(&()), key)))?;

        let stored_version = current
            .pointer("/metadata/resourceVersion")
            .and_then(|v| v.as_str());
        let incoming_version = object.meta().resource_version.as_deref();
        if incoming_version.is_some() && incoming_version != stored_version {
            return Err(KubeError::Conflict {
                kind: K::kind(&()).to_string(),
                namespace: key.namespace,
                name: key.name,
            });
        }

        let mut updated = object.clone();
        updated.meta_mut().resource_version = Some(inner.next_resource_version());
        inner.objects.insert(slot, serde_json::to_value(&updated)?);
        Ok(updated)
    }
}

//! Object store access
//!
//! Everything Stackbridge reads or writes goes through [`ObjectStore`]:
//! - **KubeStore** (default): the Kubernetes API server via `kube::Client`
//! - **MockObjectStore**: an in-memory store for tests
//!
//! Objects are addressed by `{namespace, name}`. Updates carry the
//! `resourceVersion` that was read, so a concurrent writer surfaces as
//! [`KubeError::Conflict`] instead of a lost update. Retrying is left to the
//! caller's control loop.

mod kube;
mod mock;

pub use self::kube::KubeStore;
pub use mock::{MockObjectStore, OperationCounts};

use std::fmt;

use ::kube::Resource;
use ::kube::core::NamespaceResourceScope;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::{KubeError, Result};

/// A namespaced object the store can persist
pub trait StoredObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> StoredObject for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Address of an object in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an object from its metadata
    pub fn for_object<K: StoredObject>(object: &K) -> Result<Self> {
        let meta = object.meta();
        let name = meta.name.clone().ok_or_else(|| {
            KubeError::InvalidObject(format!("{} has no name", K::kind(&())))
        })?;
        let namespace = meta.namespace.clone().ok_or_else(|| {
            KubeError::InvalidObject(format!("{} '{}' has no namespace", K::kind(&()), name))
        })?;
        Ok(Self { namespace, name })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Store driver trait for object persistence
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get an object, `None` when it does not exist
    async fn get<K: StoredObject>(&self, key: &ObjectKey) -> Result<Option<K>>;

    /// Create a new object
    async fn create<K: StoredObject>(&self, object: &K) -> Result<K>;

    /// Replace an existing object; fails with `Conflict` on a stale `resourceVersion`
    async fn update<K: StoredObject>(&self, object: &K) -> Result<K>;
}

/// Fail fast when the caller has cancelled
pub fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(KubeError::Cancelled)
    } else {
        Ok(())
    }
}

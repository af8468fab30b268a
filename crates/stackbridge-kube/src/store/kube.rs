//! Kubernetes API server store
//!
//! Reads use `get_opt` so a missing object is `None`, not an error.
//! Writes map 409 responses onto the store's own error variants.

use async_trait::async_trait;
use kube::Client;
use kube::api::{Api, PostParams};
use tracing::debug;

use super::{ObjectKey, ObjectStore, StoredObject};
use crate::error::{KubeError, Result};

/// Store backed by a live cluster
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Connect using the ambient kubeconfig or in-cluster config
    pub async fn new() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Create with an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn api<K: StoredObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Translate a 409 with `on_conflict`, pass anything else through
fn map_conflict<K: StoredObject>(
    err: kube::Error,
    key: &ObjectKey,
    on_conflict: fn(String, String, String) -> KubeError,
) -> KubeError {
    match err {
        kube::Error::Api(resp) if resp.code == 409 => on_conflict(
            K::kind(&()).to_string(),
            key.namespace.clone(),
            key.name.clone(),
        ),
        other => KubeError::Api(other),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: StoredObject>(&self, key: &ObjectKey) -> Result<Option<K>> {
        debug!(kind = %K::kind(&()), object = %key, "get");
        let object = self.api::<K>(&key.namespace).get_opt(&key.name).await?;
        Ok(object)
    }

    async fn create<K: StoredObject>(&self, object: &K) -> Result<K> {
        let key = ObjectKey::for_object(object)?;
        debug!(kind = %K::kind(&()), object = %key, "create");
        self.api::<K>(&key.namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(|e| {
                map_conflict::<K>(e, &key, |kind, namespace, name| KubeError::AlreadyExists {
                    kind,
                    namespace,
                    name,
                })
            })
    }

    async fn update<K: StoredObject>(&self, object: &K) -> Result<K> {
        let key = ObjectKey::for_object(object)?;
        debug!(kind = %K::kind(&()), object = %key, "update");
        self.api::<K>(&key.namespace)
            .replace(&key.name, &PostParams::default(), object)
            .await
            .map_err(|e| {
                map_conflict::<K>(e, &key, |kind, namespace, name| KubeError::Conflict {
                    kind,
                    namespace,
                    name,
                })
            })
    }
}

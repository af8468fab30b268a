//! Create-or-update against an [`ObjectStore`]
//!
//! Read the current object, let the caller mutate it, and persist only when
//! the mutation changed something. A stale `resourceVersion` surfaces as
//! `Conflict`; retrying is the control loop's job.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{KubeError, Result};
use crate::store::{ObjectKey, ObjectStore, StoredObject, ensure_active};

/// What a create-or-update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

impl OperationResult {
    /// Whether anything was written
    pub fn is_changed(&self) -> bool {
        !matches!(self, OperationResult::Unchanged)
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Created => write!(f, "created"),
            OperationResult::Updated => write!(f, "updated"),
            OperationResult::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Create `object` or bring the stored copy in line with `mutate`
///
/// `object` only supplies the key when the object already exists; the
/// mutation then runs on the stored copy so fields owned by other writers
/// survive.
pub async fn create_or_update<S, K, F>(
    cancel: &CancellationToken,
    store: &S,
    object: K,
    mutate: F,
) -> Result<(OperationResult, K)>
where
    S: ObjectStore,
    K: StoredObject,
    F: FnOnce(&mut K) -> Result<()>,
{
    let key = ObjectKey::for_object(&object)?;
    let kind = K::kind(&());

    ensure_active(cancel)?;
    let current: Option<K> = store.get(&key).await?;

    match current {
        None => {
            let mut desired = object;
            mutate(&mut desired)?;
            check_key(&key, &desired)?;

            ensure_active(cancel)?;
            let created = store.create(&desired).await?;
            info!(kind = %kind, object = %key, "created");
            Ok((OperationResult::Created, created))
        }
        Some(existing) => {
            let before = serde_json::to_value(&existing)?;
            let mut desired = existing;
            mutate(&mut desired)?;
            check_key(&key, &desired)?;

            if serde_json::to_value(&desired)? == before {
                return Ok((OperationResult::Unchanged, desired));
            }

            ensure_active(cancel)?;
            let updated = store.update(&desired).await?;
            info!(kind = %kind, object = %key, "updated");
            Ok((OperationResult::Updated, updated))
        }
    }
}

fn check_key<K: StoredObject>(key: &ObjectKey, object: &K) -> Result<()> {
    let meta = object.meta();
    if meta.name.as_deref() != Some(key.name.as_str())
        || meta.namespace.as_deref() != Some(key.namespace.as_str())
    {
        return Err(KubeError::Storage(format!(
            "mutation changed the name or namespace of {} '{}'",
            K::kind(&()),
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockObjectStore;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn config_map(name: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("cp".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn set_value(value: &'static str) -> impl FnOnce(&mut ConfigMap) -> Result<()> {
        move |cm| {
            cm.data
                .get_or_insert_with(BTreeMap::new)
                .insert("key".to_string(), value.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_create_then_unchanged_then_update() {
        let store = MockObjectStore::new();
        let cancel = CancellationToken::new();

        let (result, _) = create_or_update(&cancel, &store, config_map("a"), set_value("1"))
            .await
            .unwrap();
        assert_eq!(result, OperationResult::Created);

        let (result, _) = create_or_update(&cancel, &store, config_map("a"), set_value("1"))
            .await
            .unwrap();
        assert_eq!(result, OperationResult::Unchanged);
        assert!(!result.is_changed());

        let (result, stored) = create_or_update(&cancel, &store, config_map("a"), set_value("2"))
            .await
            .unwrap();
        assert_eq!(result, OperationResult::Updated);
        assert_eq!(stored.data.unwrap()["key"], "2");

        let counts = store.operation_counts();
        assert_eq!(counts.gets, 3);
        assert_eq!(counts.creates, 1);
        assert_eq!(counts.updates, 1);
    }

    #[tokio::test]
    async fn test_mutation_sees_stored_fields() {
        let mut existing = config_map("a");
        existing.metadata.labels = Some(BTreeMap::from([("owner".to_string(), "other".to_string())]));
        let store = MockObjectStore::new().with_object(&existing);
        let cancel = CancellationToken::new();

        let (result, stored) = create_or_update(&cancel, &store, config_map("a"), set_value("1"))
            .await
            .unwrap();
        assert_eq!(result, OperationResult::Updated);
        assert_eq!(stored.metadata.labels.unwrap()["owner"], "other");
    }

    #[tokio::test]
    async fn test_mutation_error_writes_nothing() {
        let store = MockObjectStore::new();
        let cancel = CancellationToken::new();

        let result = create_or_update(&cancel, &store, config_map("a"), |_| {
            Err(KubeError::Storage("refused".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(store.operation_counts().writes(), 0);
    }

    #[tokio::test]
    async fn test_rename_is_rejected() {
        let store = MockObjectStore::new();
        let cancel = CancellationToken::new();

        let err = create_or_update(&cancel, &store, config_map("a"), |cm| {
            cm.metadata.name = Some("b".to_string());
            Ok(())
        })
        .await
        .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"storage error: mutation changed the name or namespace of ConfigMap 'cp/a'");
    }

    #[tokio::test]
    async fn test_cancelled_makes_no_calls() {
        let store = MockObjectStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = create_or_update(&cancel, &store, config_map("a"), set_value("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, KubeError::Cancelled));
        assert_eq!(store.operation_counts().total(), 0);
    }
}

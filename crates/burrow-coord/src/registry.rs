//! Name registries: one document per claimed name, keyed by the name and
//! pointing back at the owning entity.

use burrow_paths::{resolve_document, PathKey};
use burrow_store::Document;
use tracing::warn;

use crate::coordinator::Coordinator;
use crate::error::{CoordError, CoordResult};
use crate::named::{NamedKind, REGISTRY_ID_FIELD};

/// Registry key claiming `name` within `scope`.
pub(crate) fn registry_key(kind: NamedKind, scope: &[&str], name: &str) -> CoordResult<PathKey> {
    let mut ids = scope.to_vec();
    ids.push(name);
    Ok(resolve_document(kind.registry_kind(), &ids)?)
}

pub(crate) fn registry_entry(id: &str) -> Document {
    Document::new().with(REGISTRY_ID_FIELD, id)
}

impl Coordinator {
    /// The identifier of the entity holding `name`, if it is claimed.
    pub async fn lookup_name(
        &self,
        kind: NamedKind,
        scope: &[&str],
        name: &str,
    ) -> CoordResult<Option<String>> {
        let key = registry_key(kind, scope, name)?;
        Ok(self
            .store()
            .get(&key)
            .await?
            .and_then(|entry| entry.get_str(REGISTRY_ID_FIELD).map(str::to_string)))
    }

    /// Fail with `NameAlreadyInUse` if the registry entry exists.
    pub(crate) async fn ensure_name_free(&self, key: &PathKey, name: &str) -> CoordResult<()> {
        if self.store().exists(key).await? {
            return Err(CoordError::NameAlreadyInUse {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// The registry entry to remove on behalf of entity `id`, or `None` when
    /// the entry is gone or now belongs to someone else.
    pub(crate) async fn owned_registry_entry(
        &self,
        key: &PathKey,
        id: &str,
    ) -> CoordResult<Option<PathKey>> {
        if !self.config().verify_registry_owner {
            return Ok(Some(key.clone()));
        }
        match self.store().get(key).await? {
            None => Ok(None),
            Some(entry) if entry.get_str(REGISTRY_ID_FIELD) == Some(id) => Ok(Some(key.clone())),
            Some(entry) => {
                warn!(
                    %key,
                    owner = entry.get_str(REGISTRY_ID_FIELD).unwrap_or("<none>"),
                    expected = %id,
                    "registry entry held by another entity; leaving it in place"
                );
                Ok(None)
            }
        }
    }
}

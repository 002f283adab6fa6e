//! Snapshot version resolution.
//!
//! Versioned artifacts are laid out as `<location>/<token>/<basename>`:
//! the artifact location acts as a directory of immutable snapshots, one
//! per version token. Resolution is composed into storage backends as a
//! [`VersionedPath`] strategy rather than inherited behavior.

use std::sync::OnceLock;

use common::{DatasetName, VersionToken};
use object_store::{ObjectStore, path::Path};

use crate::DatasetError;

/// Requested versions for one dataset: what to load and what to save as.
///
/// Both halves are independently resolvable. A `None` load resolves to the
/// latest token on storage; a `None` save generates a fresh token on first
/// use.
#[derive(Debug, Clone, Default)]
pub struct Version {
    pub load: Option<VersionToken>,
    pub save: Option<VersionToken>,
}

impl Version {
    pub fn new(load: Option<VersionToken>, save: Option<VersionToken>) -> Self {
        Version { load, save }
    }
}

/// Path resolution strategy for versioned artifacts.
///
/// The save token is resolved at most once per instance: every save a
/// dataset performs within one run lands under the same snapshot.
#[derive(Debug)]
pub struct VersionedPath {
    location: String,
    version: Version,
    save_token: OnceLock<VersionToken>,
}

impl VersionedPath {
    pub fn new(location: impl Into<String>, version: Version) -> Self {
        VersionedPath {
            location: location.into(),
            version,
            save_token: OnceLock::new(),
        }
    }

    /// The snapshot directory this strategy resolves under.
    pub fn location(&self) -> Path {
        Path::from(self.location.as_str())
    }

    /// The token all saves of this instance share.
    pub fn save_token(&self) -> &VersionToken {
        self.save_token.get_or_init(|| {
            self.version
                .save
                .clone()
                .unwrap_or_else(VersionToken::generate)
        })
    }

    /// The concrete path a save writes to.
    pub fn resolve_save(&self) -> Path {
        self.path_for(self.save_token().clone())
    }

    /// The concrete path a load reads from.
    ///
    /// An explicit load version wins; otherwise the greatest token present
    /// on storage. Fails with [`DatasetError::NoVersions`] when the
    /// location holds no snapshots.
    pub async fn resolve_load(
        &self,
        store: &dyn ObjectStore,
        name: &DatasetName,
    ) -> Result<Path, DatasetError> {
        if let Some(token) = &self.version.load {
            return Ok(self.path_for(token.clone()));
        }

        let latest = self.latest_token(store, name).await?;
        match latest {
            Some(token) => Ok(self.path_for(token)),
            None => Err(DatasetError::NoVersions {
                name: name.clone(),
                location: self.location(),
            }),
        }
    }

    /// Verifies that a load issued now would read back the path just saved.
    ///
    /// A mismatch means the versioned lineage is inconsistent, e.g. a
    /// pinned older load version or clock skew between writers. Always
    /// fatal.
    pub async fn check_save_consistency(
        &self,
        store: &dyn ObjectStore,
        name: &DatasetName,
        save_path: &Path,
    ) -> Result<(), DatasetError> {
        let load_path = self.resolve_load(store, name).await?;
        if load_path != *save_path {
            return Err(DatasetError::PathConsistency {
                name: name.clone(),
                save_path: save_path.clone(),
                load_path,
            });
        }
        Ok(())
    }

    fn path_for(&self, token: VersionToken) -> Path {
        let basename = self.location.rsplit('/').next().unwrap_or(&self.location);
        Path::from(format!("{}/{}/{}", self.location, token, basename))
    }

    /// Enumerates snapshot tokens at the location and returns the greatest.
    async fn latest_token(
        &self,
        store: &dyn ObjectStore,
        name: &DatasetName,
    ) -> Result<Option<VersionToken>, DatasetError> {
        let listing = store
            .list_with_delimiter(Some(&self.location()))
            .await
            .map_err(|source| DatasetError::Storage {
                name: name.clone(),
                source,
            })?;

        Ok(listing
            .common_prefixes
            .iter()
            .filter_map(|prefix| prefix.filename())
            .filter_map(|segment| segment.parse::<VersionToken>().ok())
            .max())
    }
}

//! Award bundle persistence.
//!
//! One bundle is one atomic unit: save writes the whole bundle or nothing.
//! Concurrency is optimistic: every save checks the bundle's version token
//! against the stored one and bumps it, so a stale writer gets a conflict
//! instead of silently clobbering newer state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::award::bundle::AwardBundle;
use crate::award::types::AwardId;
use crate::error::RepositoryError;

#[async_trait]
pub trait AwardRepository: Send + Sync {
    /// Allocate the next award id.
    async fn next_award_id(&self) -> Result<AwardId, RepositoryError>;

    /// Persist a brand-new bundle. Fails if the id already exists.
    async fn create(&self, bundle: &AwardBundle) -> Result<(), RepositoryError>;

    /// Load one bundle by award id.
    async fn load(&self, id: AwardId) -> Result<AwardBundle, RepositoryError>;

    /// Save a mutated bundle, checking and bumping its version token.
    /// Returns the new version on success.
    async fn save(&self, bundle: &AwardBundle) -> Result<u64, RepositoryError>;

    /// Load every stored bundle, in id order.
    async fn load_all(&self) -> Result<Vec<AwardBundle>, RepositoryError>;
}

/// In-memory repository used by tests and the worklist helpers.
#[derive(Default)]
pub struct InMemoryRepository {
    awards: Mutex<HashMap<AwardId, AwardBundle>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AwardRepository for InMemoryRepository {
    async fn next_award_id(&self) -> Result<AwardId, RepositoryError> {
        let awards = self.awards.lock().await;
        Ok(awards.keys().max().copied().unwrap_or(0) + 1)
    }

    async fn create(&self, bundle: &AwardBundle) -> Result<(), RepositoryError> {
        let mut awards = self.awards.lock().await;
        let id = bundle.award.id;
        if awards.contains_key(&id) {
            return Err(RepositoryError::Storage(format!(
                "award {id} already exists"
            )));
        }
        awards.insert(id, bundle.clone());
        Ok(())
    }

    async fn load(&self, id: AwardId) -> Result<AwardBundle, RepositoryError> {
        let awards = self.awards.lock().await;
        awards.get(&id).cloned().ok_or(RepositoryError::NotFound(id))
    }

    async fn save(&self, bundle: &AwardBundle) -> Result<u64, RepositoryError> {
        let mut awards = self.awards.lock().await;
        let id = bundle.award.id;
        let stored = awards.get(&id).ok_or(RepositoryError::NotFound(id))?;
        if stored.version != bundle.version {
            return Err(RepositoryError::Conflict(id));
        }
        let mut updated = bundle.clone();
        updated.version += 1;
        let version = updated.version;
        awards.insert(id, updated);
        Ok(version)
    }

    async fn load_all(&self) -> Result<Vec<AwardBundle>, RepositoryError> {
        let awards = self.awards.lock().await;
        let mut all: Vec<AwardBundle> = awards.values().cloned().collect();
        all.sort_by_key(|b| b.award.id);
        Ok(all)
    }
}

/// File-backed repository: one JSON file per award under a data directory.
///
/// Saves go through a temp file and rename, so a crash mid-write never
/// leaves a truncated bundle behind. A process-wide mutex serializes the
/// check-and-bump against concurrent tasks in the same process.
pub struct JsonFileRepository {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    pub async fn new(data_dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await?;
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn bundle_path(&self, id: AwardId) -> PathBuf {
        self.data_dir.join(format!("award-{id}.json"))
    }

    async fn read_bundle(&self, path: &Path) -> Result<AwardBundle, RepositoryError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_bundle(&self, bundle: &AwardBundle) -> Result<(), RepositoryError> {
        let path = self.bundle_path(bundle.award.id);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(bundle)?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl AwardRepository for JsonFileRepository {
    async fn next_award_id(&self) -> Result<AwardId, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut max_id = 0;
        let mut entries = fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name
                .strip_prefix("award-")
                .and_then(|s| s.strip_suffix(".json"))
                .and_then(|s| s.parse::<AwardId>().ok())
            {
                max_id = max_id.max(id);
            }
        }
        Ok(max_id + 1)
    }

    async fn create(&self, bundle: &AwardBundle) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let path = self.bundle_path(bundle.award.id);
        if fs::try_exists(&path).await? {
            return Err(RepositoryError::Storage(format!(
                "award {} already exists",
                bundle.award.id
            )));
        }
        self.write_bundle(bundle).await?;
        tracing::debug!(award.id = bundle.award.id, path = %path.display(), "award created");
        Ok(())
    }

    async fn load(&self, id: AwardId) -> Result<AwardBundle, RepositoryError> {
        let path = self.bundle_path(id);
        if !fs::try_exists(&path).await? {
            return Err(RepositoryError::NotFound(id));
        }
        self.read_bundle(&path).await
    }

    async fn save(&self, bundle: &AwardBundle) -> Result<u64, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let id = bundle.award.id;
        let path = self.bundle_path(id);
        if !fs::try_exists(&path).await? {
            return Err(RepositoryError::NotFound(id));
        }
        let stored = self.read_bundle(&path).await?;
        if stored.version != bundle.version {
            tracing::warn!(
                award.id = id,
                stored = stored.version,
                ours = bundle.version,
                "version mismatch on save"
            );
            return Err(RepositoryError::Conflict(id));
        }
        let mut updated = bundle.clone();
        updated.version += 1;
        self.write_bundle(&updated).await?;
        Ok(updated.version)
    }

    async fn load_all(&self) -> Result<Vec<AwardBundle>, RepositoryError> {
        let mut bundles = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            bundles.push(self.read_bundle(&path).await?);
        }
        bundles.sort_by_key(|b| b.award.id);
        Ok(bundles)
    }
}

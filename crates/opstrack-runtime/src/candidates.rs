//! Candidate directory: the closed vocabulary of projects and work types.
//!
//! Providers hand out owned snapshots; a resolution call never sees the pool
//! change underneath it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use opstrack_core::{Error, Result};
use opstrack_resolve::CandidateEntity;

/// Source of active candidate entities.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    async fn list_active_projects(&self) -> Result<Vec<CandidateEntity>>;
    async fn list_active_work_type_categories(&self) -> Result<Vec<CandidateEntity>>;

    /// Both pools from one snapshot: `(projects, work_types)`.
    async fn list_active(&self) -> Result<(Vec<CandidateEntity>, Vec<CandidateEntity>)> {
        tokio::try_join!(
            self.list_active_projects(),
            self.list_active_work_type_categories()
        )
    }
}

/// Fixed in-memory pools.
#[derive(Debug, Clone, Default)]
pub struct StaticCandidates {
    pub projects: Vec<CandidateEntity>,
    pub work_types: Vec<CandidateEntity>,
}

impl StaticCandidates {
    pub fn new(projects: Vec<CandidateEntity>, work_types: Vec<CandidateEntity>) -> Self {
        Self {
            projects,
            work_types,
        }
    }
}

#[async_trait]
impl CandidateProvider for StaticCandidates {
    async fn list_active_projects(&self) -> Result<Vec<CandidateEntity>> {
        Ok(self.projects.clone())
    }

    async fn list_active_work_type_categories(&self) -> Result<Vec<CandidateEntity>> {
        Ok(self.work_types.clone())
    }
}

#[derive(Debug, Deserialize)]
struct CandidateRecord {
    #[serde(flatten)]
    entity: CandidateEntity,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateFile {
    #[serde(default)]
    projects: Vec<CandidateRecord>,
    #[serde(default)]
    work_types: Vec<CandidateRecord>,
}

impl CandidateFile {
    fn active(records: Vec<CandidateRecord>) -> Vec<CandidateEntity> {
        records
            .into_iter()
            .filter(|r| r.active)
            .map(|r| r.entity)
            .collect()
    }
}

/// Reads `candidates.json` (`{"projects": [...], "workTypes": [...]}`).
///
/// A missing file is an empty directory; a malformed one is an error.
pub struct JsonCandidateProvider {
    path: PathBuf,
}

impl JsonCandidateProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<CandidateFile> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Candidate file {} not found; pools are empty", self.path.display());
                return Ok(CandidateFile::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map_err(|e| Error::Candidates(format!("{}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl CandidateProvider for JsonCandidateProvider {
    async fn list_active_projects(&self) -> Result<Vec<CandidateEntity>> {
        Ok(CandidateFile::active(self.read().await?.projects))
    }

    async fn list_active_work_type_categories(&self) -> Result<Vec<CandidateEntity>> {
        Ok(CandidateFile::active(self.read().await?.work_types))
    }

    async fn list_active(&self) -> Result<(Vec<CandidateEntity>, Vec<CandidateEntity>)> {
        let file = self.read().await?;
        Ok((
            CandidateFile::active(file.projects),
            CandidateFile::active(file.work_types),
        ))
    }
}

struct Slot {
    pool: Arc<Vec<CandidateEntity>>,
    loaded_at: Instant,
}

#[derive(Default)]
struct CacheInner {
    projects: Option<Slot>,
    work_types: Option<Slot>,
}

/// TTL snapshot cache over another provider.
///
/// Each pool is cached separately. A zero TTL passes every call through.
pub struct CachedCandidateProvider {
    inner: Arc<dyn CandidateProvider>,
    ttl: Duration,
    cache: Mutex<CacheInner>,
}

impl CachedCandidateProvider {
    pub fn new(inner: Arc<dyn CandidateProvider>, ttl: Duration) -> Self {
        info!("Candidate cache TTL: {}s", ttl.as_secs());
        Self {
            inner,
            ttl,
            cache: Mutex::new(CacheInner::default()),
        }
    }

    /// Drop both cached pools; the next call reloads.
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock();
        cache.projects = None;
        cache.work_types = None;
        debug!("Candidate cache invalidated");
    }

    fn fresh(&self, slot: &Option<Slot>) -> Option<Vec<CandidateEntity>> {
        slot.as_ref()
            .filter(|s| s.loaded_at.elapsed() < self.ttl)
            .map(|s| s.pool.as_ref().clone())
    }

    fn store(slot: &mut Option<Slot>, pool: &[CandidateEntity]) {
        *slot = Some(Slot {
            pool: Arc::new(pool.to_vec()),
            loaded_at: Instant::now(),
        });
    }
}

#[async_trait]
impl CandidateProvider for CachedCandidateProvider {
    async fn list_active_projects(&self) -> Result<Vec<CandidateEntity>> {
        if self.ttl.is_zero() {
            return self.inner.list_active_projects().await;
        }
        let cached = {
            let cache = self.cache.lock();
            self.fresh(&cache.projects)
        };
        if let Some(pool) = cached {
            return Ok(pool);
        }

        let pool = self.inner.list_active_projects().await?;
        Self::store(&mut self.cache.lock().projects, &pool);
        Ok(pool)
    }

    async fn list_active_work_type_categories(&self) -> Result<Vec<CandidateEntity>> {
        if self.ttl.is_zero() {
            return self.inner.list_active_work_type_categories().await;
        }
        let cached = {
            let cache = self.cache.lock();
            self.fresh(&cache.work_types)
        };
        if let Some(pool) = cached {
            return Ok(pool);
        }

        let pool = self.inner.list_active_work_type_categories().await?;
        Self::store(&mut self.cache.lock().work_types, &pool);
        Ok(pool)
    }

    async fn list_active(&self) -> Result<(Vec<CandidateEntity>, Vec<CandidateEntity>)> {
        if self.ttl.is_zero() {
            return self.inner.list_active().await;
        }
        let cached = {
            let cache = self.cache.lock();
            self.fresh(&cache.projects).zip(self.fresh(&cache.work_types))
        };
        if let Some(pools) = cached {
            return Ok(pools);
        }

        // Reload both together so the pools come from the same source state
        let (projects, work_types) = self.inner.list_active().await?;
        {
            let mut cache = self.cache.lock();
            Self::store(&mut cache.projects, &projects);
            Self::store(&mut cache.work_types, &work_types);
        }
        Ok((projects, work_types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FILE: &str = r#"{
        "projects": [
            {"id": "p-1", "code": "888888-160", "name": "OQC Infra"},
            {"id": "p-2", "code": "MES-2024", "name": "MES Upgrade", "active": false}
        ],
        "workTypes": [
            {"id": "wt-1", "code": "DESIGN", "name": "Design", "localizedName": "설계"}
        ]
    }"#;

    #[tokio::test]
    async fn test_json_provider_filters_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        std::fs::write(&path, FILE).unwrap();

        let provider = JsonCandidateProvider::new(&path);
        let projects = provider.list_active_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].code, "888888-160");

        let work_types = provider.list_active_work_type_categories().await.unwrap();
        assert_eq!(work_types[0].localized_name.as_deref(), Some("설계"));
    }

    #[tokio::test]
    async fn test_json_provider_snapshot_reads_both_pools() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        std::fs::write(&path, FILE).unwrap();

        let (projects, work_types) = JsonCandidateProvider::new(&path).list_active().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "p-1");
        assert_eq!(work_types.len(), 1);
        assert_eq!(work_types[0].id, "wt-1");
    }

    #[tokio::test]
    async fn test_json_provider_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonCandidateProvider::new(dir.path().join("nope.json"));
        assert!(provider.list_active_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_provider_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        std::fs::write(&path, "{\"projects\": [").unwrap();
        let err = JsonCandidateProvider::new(&path)
            .list_active_projects()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Candidates(_)));
    }

    struct Counting {
        calls: AtomicUsize,
        snapshots: AtomicUsize,
    }

    impl Counting {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                snapshots: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CandidateProvider for Counting {
        async fn list_active_projects(&self) -> Result<Vec<CandidateEntity>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![CandidateEntity::new(format!("p-{}", n), "C", "Name")])
        }

        async fn list_active_work_type_categories(&self) -> Result<Vec<CandidateEntity>> {
            Ok(Vec::new())
        }

        async fn list_active(&self) -> Result<(Vec<CandidateEntity>, Vec<CandidateEntity>)> {
            let n = self.snapshots.fetch_add(1, Ordering::SeqCst);
            Ok((
                vec![CandidateEntity::new(format!("p-{}", n), "C", "Name")],
                vec![CandidateEntity::new(format!("wt-{}", n), "W", "Work")],
            ))
        }
    }

    #[tokio::test]
    async fn test_cache_reuses_until_invalidated() {
        let counting = Arc::new(Counting::new());
        let cached = CachedCandidateProvider::new(counting.clone(), Duration::from_secs(300));

        assert_eq!(cached.list_active_projects().await.unwrap()[0].id, "p-0");
        assert_eq!(cached.list_active_projects().await.unwrap()[0].id, "p-0");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        cached.invalidate();
        assert_eq!(cached.list_active_projects().await.unwrap()[0].id, "p-1");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_passes_through() {
        let counting = Arc::new(Counting::new());
        let cached = CachedCandidateProvider::new(counting.clone(), Duration::ZERO);
        cached.list_active_projects().await.unwrap();
        cached.list_active_projects().await.unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_snapshot_loads_both_pools_once() {
        let counting = Arc::new(Counting::new());
        let cached = CachedCandidateProvider::new(counting.clone(), Duration::from_secs(300));

        let (projects, work_types) = cached.list_active().await.unwrap();
        assert_eq!(projects[0].id, "p-0");
        assert_eq!(work_types[0].id, "wt-0");
        assert_eq!(counting.snapshots.load(Ordering::SeqCst), 1);

        // Both slots were filled from the one snapshot
        let (projects, _) = cached.list_active().await.unwrap();
        assert_eq!(projects[0].id, "p-0");
        assert_eq!(cached.list_active_work_type_categories().await.unwrap()[0].id, "wt-0");
        assert_eq!(counting.snapshots.load(Ordering::SeqCst), 1);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);

        cached.invalidate();
        let (projects, work_types) = cached.list_active().await.unwrap();
        assert_eq!(projects[0].id, "p-1");
        assert_eq!(work_types[0].id, "wt-1");
    }
}

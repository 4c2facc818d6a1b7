//! Persistent source-text → translation cache.
//!
//! The whole mapping is held in memory behind one async mutex and written
//! through to a JSON file after every new entry. The file is replaced via
//! write-to-temp + rename while the mutex is held, so concurrent writers
//! are serialized and a crash mid-write never leaves a truncated file.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{RecipeError, RecipeResult};

#[derive(Debug)]
pub struct TranslationCache {
    entries: Mutex<HashMap<String, String>>,
    path: Option<PathBuf>,
}

impl TranslationCache {
    /// A cache with no backing file.
    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            path: None,
        }
    }

    /// Load the cache from `path`.
    ///
    /// A missing file starts an empty cache. An unreadable or malformed file
    /// is logged and also treated as empty; it is overwritten by the next
    /// store.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(entries) => {
                    info!(path = %path.display(), entries = entries.len(), "Loaded translation cache");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Translation cache is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No translation cache file yet");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Translation cache unreadable, starting empty");
                HashMap::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn lookup(&self, source: &str) -> Option<String> {
        self.entries.lock().await.get(source).cloned()
    }

    /// Split `sources` into cached translations and texts still to be
    /// translated, under a single lock acquisition.
    ///
    /// Novel texts are returned once each, in first-seen order.
    pub async fn partition<'a, I>(&self, sources: I) -> (HashMap<String, String>, Vec<String>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entries = self.entries.lock().await;
        let mut hits = HashMap::new();
        let mut novel: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for source in sources {
            if !seen.insert(source) {
                continue;
            }
            match entries.get(source) {
                Some(translated) => {
                    hits.insert(source.to_string(), translated.clone());
                }
                None => novel.push(source.to_string()),
            }
        }

        (hits, novel)
    }

    /// Record a translation.
    ///
    /// Returns `Ok(false)` without touching disk when the identical entry
    /// already exists. A differing value replaces the old one.
    pub async fn store(&self, source: &str, translated: &str) -> RecipeResult<bool> {
        let mut entries = self.entries.lock().await;

        if entries.get(source).is_some_and(|existing| existing == translated) {
            return Ok(false);
        }
        entries.insert(source.to_string(), translated.to_string());

        if let Some(path) = &self.path {
            persist(path, &entries).await?;
        }

        Ok(true)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

async fn persist(path: &Path, entries: &HashMap<String, String>) -> RecipeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let body = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");

    tokio::fs::write(&tmp, body).await.map_err(|e| {
        RecipeError::Cache(format!("Failed to write {}: {}", tmp.display(), e))
    })?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        RecipeError::Cache(format!("Failed to replace {}: {}", path.display(), e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_store_then_lookup() {
        let cache = TranslationCache::in_memory();
        assert_eq!(cache.lookup("소금").await, None);

        assert!(cache.store("소금", "salt").await.unwrap());
        assert_eq!(cache.lookup("소금").await.as_deref(), Some("salt"));
    }

    #[tokio::test]
    async fn test_store_is_idempotent() {
        let cache = TranslationCache::in_memory();
        assert!(cache.store("설탕", "sugar").await.unwrap());
        assert!(!cache.store("설탕", "sugar").await.unwrap());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_partition_dedups_and_splits() {
        let cache = TranslationCache::in_memory();
        cache.store("간장", "soy sauce").await.unwrap();

        let (hits, novel) = cache
            .partition(["간장", "마늘", "마늘", "양파", "간장"])
            .await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits["간장"], "soy sauce");
        assert_eq!(novel, vec!["마늘".to_string(), "양파".to_string()]);
    }

    #[tokio::test]
    async fn test_partition_large_batch_keeps_first_seen_order() {
        let cache = TranslationCache::in_memory();
        cache.store("재료 0", "ingredient 0").await.unwrap();

        let texts: Vec<String> = (0..20_000).map(|i| format!("재료 {}", i % 500)).collect();
        let (hits, novel) = cache.partition(texts.iter().map(String::as_str)).await;

        assert_eq!(hits.len(), 1);
        assert_eq!(novel.len(), 499);
        assert_eq!(novel[0], "재료 1");
        assert_eq!(novel[498], "재료 499");
    }

    #[tokio::test]
    async fn test_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("translation_cache.json");

        let cache = TranslationCache::load(&path).await;
        assert!(cache.is_empty().await);
        cache.store("두부", "tofu").await.unwrap();
        cache.store("버섯", "mushroom").await.unwrap();

        let reloaded = TranslationCache::load(&path).await;
        assert_eq!(reloaded.len().await, 2);
        assert_eq!(reloaded.lookup("두부").await.as_deref(), Some("tofu"));
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translation_cache.json");
        tokio::fs::write(&path, b"{\"truncated\": ").await.unwrap();

        let cache = TranslationCache::load(&path).await;
        assert!(cache.is_empty().await);

        // the next store repairs the file
        cache.store("국", "soup").await.unwrap();
        let reloaded = TranslationCache::load(&path).await;
        assert_eq!(reloaded.lookup("국").await.as_deref(), Some("soup"));
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translation_cache.json");
        let cache = Arc::new(TranslationCache::load(&path).await);

        let mut handles = Vec::new();
        for i in 0..32 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .store(&format!("재료 {}", i), &format!("ingredient {}", i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let raw = tokio::fs::read(&path).await.unwrap();
        let on_disk: HashMap<String, String> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(on_disk.len(), 32);
        assert_eq!(on_disk["재료 7"], "ingredient 7");
    }
}

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Durable get/set of JSON values under string keys.
pub trait KeyValueStore {
  /// `Ok(None)` when nothing has been stored under `key` yet.
  fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;
  fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl KeyValueStore for FileStore {
  fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let path = self.path_for(key);
    let content = match std::fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    if content.trim().is_empty() {
      return Ok(None);
    }
    let value = serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(value))
  }

  fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
    std::fs::create_dir_all(&self.dir).with_context(|| format!("Failed to create {}", self.dir.display()))?;
    let path = self.path_for(key);
    let content = serde_json::to_string(value).context("Failed to serialize value")?;
    // Write-then-rename so a crash mid-write never leaves a truncated file.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
  }
}

/// In-process store used by tests. Clones share the same map, which lets tests "restart"
/// by loading a second list from a clone.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  entries: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, String>>>,
  read_only: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl MemoryStore {
  pub fn raw(&self, key: &str) -> Option<String> {
    self.entries.lock().ok().and_then(|map| map.get(key).cloned())
  }

  /// Every later `set` on this store or its clones fails.
  pub fn fail_writes(&self) {
    self.read_only.store(true, std::sync::atomic::Ordering::SeqCst);
  }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
  fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let Some(raw) = self.raw(key) else { return Ok(None) };
    Ok(Some(serde_json::from_str(&raw).context("Failed to parse stored value")?))
  }

  fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
    if self.read_only.load(std::sync::atomic::Ordering::SeqCst) {
      anyhow::bail!("memory store is read-only");
    }
    let raw = serde_json::to_string(value).context("Failed to serialize value")?;
    let mut map = self.entries.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
    map.insert(key.to_string(), raw);
    Ok(())
  }
}

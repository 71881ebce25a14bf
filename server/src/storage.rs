use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{bail, Context};

/// Durable string-keyed store holding JSON blobs.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> anyhow::Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            bail!("Invalid storage key: {key:?}");
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    // Written to a sibling file, then renamed into place
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn values(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock is poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tvk-fan-of-month-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn file_store_round_trip() {
        let dir = temp_dir("round-trip");
        let store = FileStore::open(&dir).unwrap();

        assert_eq!(store.get("fan_of_month.previous_winner").unwrap(), None);
        store.set("fan_of_month.previous_winner", "{}").unwrap();
        assert_eq!(
            store.get("fan_of_month.previous_winner").unwrap().as_deref(),
            Some("{}")
        );
        assert!(dir.join("fan_of_month.previous_winner.json").exists());
        assert!(!dir.join("fan_of_month.previous_winner.json.tmp").exists());

        store.remove("fan_of_month.previous_winner").unwrap();
        store.remove("fan_of_month.previous_winner").unwrap();
        assert_eq!(store.get("fan_of_month.previous_winner").unwrap(), None);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = temp_dir("reopen");
        FileStore::open(&dir).unwrap().set("key", "value").unwrap();
        let reopened = FileStore::open(&dir).unwrap();
        assert_eq!(reopened.get("key").unwrap().as_deref(), Some("value"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = temp_dir("keys");
        let store = FileStore::open(&dir).unwrap();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
        assert!(store.remove("").is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::default();
        store.set("key", "1").unwrap();
        store.set("key", "2").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("2"));
        store.remove("key").unwrap();
        assert_eq!(store.get("key").unwrap(), None);
    }
}

use crate::errors::AppletflowError;
#[cfg(test)]
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Arc;

/// Key -> JSON document store. One `{key}.json` file per key. Tests use an in-process map.
#[derive(Clone, Debug)]
pub enum LocalStore {
    File { dir: PathBuf },

    #[cfg(test)]
    Memory(Arc<DashMap<String, String>>),
}

impl LocalStore {
    pub fn file(dir: impl Into<PathBuf>) -> Result<Self, AppletflowError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(LocalStore::File { dir })
    }

    #[cfg(test)]
    pub fn memory() -> Self {
        LocalStore::Memory(Arc::new(DashMap::new()))
    }

    /// Absent and unreadable documents both read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get_raw(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::error!("Failed to read {} from local store: {}", key, e);
                return None;
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| {
                log::warn!("Discarding corrupt {} in local store: {}", key, e);
            })
            .ok()
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppletflowError> {
        let raw = serde_json::to_string(value)?;

        self.set_raw(key, &raw)
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>, AppletflowError> {
        match self {
            LocalStore::File { .. } => match fs::read_to_string(self.path(key)) {
                Ok(raw) => Ok(Some(raw)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            },
            #[cfg(test)]
            LocalStore::Memory(map) => Ok(map.get(key).map(|raw| raw.value().clone())),
        }
    }

    pub fn set_raw(&self, key: &str, raw: &str) -> Result<(), AppletflowError> {
        match self {
            LocalStore::File { .. } => {
                let path = self.path(key);
                let tmp_path = path.with_extension("json.tmp");

                fs::write(&tmp_path, raw)?;
                fs::rename(&tmp_path, &path)?;
            }
            #[cfg(test)]
            LocalStore::Memory(map) => {
                map.insert(key.to_string(), raw.to_string());
            }
        }

        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), AppletflowError> {
        match self {
            LocalStore::File { .. } => match fs::remove_file(self.path(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            #[cfg(test)]
            LocalStore::Memory(map) => {
                map.remove(key);
                Ok(())
            }
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        match self {
            LocalStore::File { dir } => dir.join(format!("{}.json", key)),
            #[cfg(test)]
            LocalStore::Memory(_) => PathBuf::from(key),
        }
    }
}

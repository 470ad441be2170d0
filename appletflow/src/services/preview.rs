use crate::constants::DEFAULT_PREVIEW_PATH;
use crate::errors::AppletflowError;
use crate::models::project::{content_type_for, ProjectFile};
use crate::services::aws::s3::{download_from_s3, upload_to_s3};
use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

const ID_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: String,
    pub content_type: String,
}

impl From<&ProjectFile> for StoredFile {
    fn from(file: &ProjectFile) -> Self {
        StoredFile {
            content: file.content.clone(),
            content_type: file.resolved_content_type(),
        }
    }
}

pub struct S3Storage {
    pub client: Arc<aws_sdk_s3::Client>,
    pub bucket: String,
    pub public_base_url: Option<String>,
}

impl S3Storage {
    fn key(id: &str, path: &str) -> String {
        format!("{}/{}", id, path)
    }
}

pub enum PreviewStorage {
    Memory(DashMap<String, HashMap<String, StoredFile>>),
    S3(S3Storage),
}

/// Id-addressed file sets served back to the preview frame.
/// No eviction and no access control: any holder of an id can read or overwrite it.
pub struct PreviewStore {
    storage: PreviewStorage,
    server_url: String,
}

impl PreviewStore {
    pub fn new(storage: PreviewStorage, server_url: impl Into<String>) -> Self {
        PreviewStore {
            storage,
            server_url: server_url.into(),
        }
    }

    #[cfg(test)]
    pub fn memory(server_url: impl Into<String>) -> Self {
        Self::new(PreviewStorage::Memory(DashMap::new()), server_url)
    }

    /// Merges `files` into the set under `id`, last write wins per name.
    pub async fn put(&self, id: &str, files: &[ProjectFile]) -> Result<(), AppletflowError> {
        match &self.storage {
            PreviewStorage::Memory(sets) => {
                let mut set = sets.entry(id.to_string()).or_default();

                for file in files {
                    set.insert(file.name.clone(), StoredFile::from(file));
                }
            }
            PreviewStorage::S3(s3) => {
                for file in files {
                    upload_to_s3(
                        &s3.client,
                        file.content.as_bytes().to_vec(),
                        &s3.bucket,
                        &S3Storage::key(id, &file.name),
                        &file.resolved_content_type(),
                    )
                    .await?;
                }
            }
        }

        log::info!("stored {} preview file(s) under {}", files.len(), id);

        Ok(())
    }

    pub async fn get(&self, id: &str, path: Option<&str>) -> Result<StoredFile, AppletflowError> {
        let path = path.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PREVIEW_PATH);
        let not_found = || AppletflowError::NotFound(format!("preview file {}/{}", id, path));

        match &self.storage {
            PreviewStorage::Memory(sets) => sets
                .get(id)
                .and_then(|set| set.get(path).cloned())
                .ok_or_else(not_found),
            PreviewStorage::S3(s3) => {
                let (bytes, content_type) = download_from_s3(&s3.client, &s3.bucket, &S3Storage::key(id, path))
                    .await?
                    .ok_or_else(not_found)?;

                Ok(StoredFile {
                    content: String::from_utf8_lossy(&bytes).into_owned(),
                    content_type: content_type.unwrap_or_else(|| content_type_for(path).to_string()),
                })
            }
        }
    }

    /// Where the preview frame should load `id` from.
    pub fn url(&self, id: &str) -> String {
        match &self.storage {
            PreviewStorage::S3(S3Storage {
                public_base_url: Some(base),
                ..
            }) => format!("{}/{}", base.trim_end_matches('/'), S3Storage::key(id, DEFAULT_PREVIEW_PATH)),
            _ => format!(
                "{}/preview/{}/{}",
                self.server_url.trim_end_matches('/'),
                id,
                DEFAULT_PREVIEW_PATH
            ),
        }
    }

    /// `{millis base36}-{6 random base36 chars}`.
    pub fn mint_id() -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let mut rng = rand::rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();

        format!("{}-{}", to_base36(millis), suffix)
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8_lossy(&digits).into_owned()
}

use crate::error::RelayError;
use crate::slug::{file_name_from_url, slugify};
use crate::store::KvStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const VIDEOS_PREFIX: &str = "videos";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkEntry {
    pub slug: String,
    pub origin_url: String,
}

/// Owns the slug -> origin URL mapping kept under `["videos", slug]`.
#[derive(Clone)]
pub struct LinkRegistry {
    store: Arc<dyn KvStore>,
}

impl LinkRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Validate input, derive the slug and store the mapping.
    ///
    /// A blank name falls back to the file name at the end of the origin URL.
    pub async fn register(&self, name: &str, origin_url: &str) -> Result<LinkEntry, RelayError> {
        let origin_url = origin_url.trim();
        if !is_origin_url(origin_url) {
            return Err(RelayError::InvalidInput("Invalid video URL".into()));
        }

        let slug = if name.trim().is_empty() {
            slugify(file_name_from_url(origin_url))
        } else {
            slugify(name)
        };
        if slug.is_empty() {
            return Err(RelayError::InvalidInput("Invalid video name".into()));
        }

        self.create(&slug, origin_url).await?;
        Ok(LinkEntry {
            slug,
            origin_url: origin_url.to_string(),
        })
    }

    /// Store `origin_url` under `slug`, replacing any previous mapping.
    pub async fn create(&self, slug: &str, origin_url: &str) -> Result<(), RelayError> {
        self.store
            .set(&[VIDEOS_PREFIX, slug], origin_url.to_string())
            .await?;
        info!(slug, "Link created");
        Ok(())
    }

    pub async fn resolve(&self, slug: &str) -> Result<String, RelayError> {
        match self.store.get(&[VIDEOS_PREFIX, slug]).await? {
            Some(url) => Ok(url),
            None => {
                debug!(slug, "Link not found");
                Err(RelayError::NotFound)
            }
        }
    }

    pub async fn delete(&self, slug: &str) -> Result<(), RelayError> {
        if self.store.delete(&[VIDEOS_PREFIX, slug]).await? {
            info!(slug, "Link deleted");
            Ok(())
        } else {
            Err(RelayError::NotFound)
        }
    }

    pub async fn list_all(&self) -> Result<Vec<LinkEntry>, RelayError> {
        let entries = self.store.list(&[VIDEOS_PREFIX]).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, origin_url)| match key.as_slice() {
                [_, slug] => Some(LinkEntry {
                    slug: slug.clone(),
                    origin_url,
                }),
                _ => None,
            })
            .collect())
    }
}

/// Prefix check only; the origin is trusted to be a real HTTP(S) URL.
pub fn is_origin_url(url: &str) -> bool {
    url.starts_with("http")
}

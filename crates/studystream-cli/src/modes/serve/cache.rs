//! Response cache.

use super::*;

/// Cache for rendered feed responses.
pub struct Cache {
    cache: HashMap<String, CacheEntry>,
    duration: studyfeed::Duration,
}

impl Cache {
    /// Create a cache whose entries live for `duration`.
    pub fn new(duration: studyfeed::Duration) -> Self {
        Self {
            cache: HashMap::new(),
            duration,
        }
    }

    /// Get the cached body for a uri, producing and storing it on a
    /// miss or an expired entry.
    pub async fn get(
        &mut self,
        // Key for the cache.
        uri: impl AsRef<str>,
        // Future to create the entry if not present.
        create: impl Future<Output = Result<String, ApiError>>,
    ) -> Result<String, ApiError> {
        let now = studyfeed::DateTime::now();

        // Check and use cache.
        if let Some(entry) = self.cache.get(uri.as_ref()) {
            if entry.creation.clone() + self.duration.clone() > now {
                tracing::debug!("Using entry from cache.");
                return Ok(entry.body.clone());
            }
        }

        // Create and store.
        let body = create.await?;
        self.cache.insert(
            uri.as_ref().to_string(),
            CacheEntry {
                creation: now,
                body: body.clone(),
            },
        );
        Ok(body)
    }
}

/// A single cached response.
struct CacheEntry {
    creation: studyfeed::DateTime,
    body: String,
}

//! Name → external id lookup with a read-through cache.
//!
//! The cache lives as long as the `CachedLookup` value; successful lookups are
//! appended and never evicted or overwritten. Misses are not cached.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::retry::{RetryError, RetryPolicy, with_retry};

use super::{NamedResource, RemoteError, ResourceDirectory, ResourceKind};

#[async_trait]
pub trait NameLookup: Send + Sync {
    async fn lookup(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Option<String>, RetryError<RemoteError>>;
}

pub struct CachedLookup<D> {
    directory: D,
    policy: RetryPolicy,
    cache: RwLock<HashMap<(ResourceKind, String), String>>,
}

impl<D: ResourceDirectory> CachedLookup<D> {
    pub fn new(directory: D, policy: RetryPolicy) -> Self {
        CachedLookup {
            directory,
            policy,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub async fn cached(&self, kind: ResourceKind, name: &str) -> Option<String> {
        self.cache.read().await.get(&cache_key(kind, name)).cloned()
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn remember(&self, kind: ResourceKind, name: &str, id: &str) {
        self.cache
            .write()
            .await
            .entry(cache_key(kind, name))
            .or_insert_with(|| id.to_string());
    }
}

#[async_trait]
impl<D: ResourceDirectory> NameLookup for CachedLookup<D> {
    async fn lookup(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Option<String>, RetryError<RemoteError>> {
        if let Some(id) = self.cached(kind, name).await {
            return Ok(Some(id));
        }

        let label = format!("find {} '{}'", kind.as_str(), name);
        let exact = with_retry(|| self.directory.find_by_name(kind, name), &label, &self.policy).await?;
        if let Some(id) = exact {
            self.remember(kind, name, &id).await;
            return Ok(Some(id));
        }

        let label = format!("list {}s", kind.as_str());
        let all = with_retry(|| self.directory.list(kind), &label, &self.policy).await?;
        match fuzzy_match(name, &all) {
            Some(found) => {
                tracing::info!(
                    kind = kind.as_str(),
                    requested = name,
                    matched = %found.name,
                    "resolved by partial name match"
                );
                let id = found.id.clone();
                self.remember(kind, name, &id).await;
                Ok(Some(id))
            }
            None => {
                tracing::warn!(kind = kind.as_str(), requested = name, candidates = all.len(), "no match");
                Ok(None)
            }
        }
    }
}

fn cache_key(kind: ResourceKind, name: &str) -> (ResourceKind, String) {
    (kind, name.trim().to_string())
}

/// Best match for `name`: exact, then case-insensitive equality, then the first
/// case-insensitive substring match in either direction.
pub fn fuzzy_match<'a>(name: &str, candidates: &'a [NamedResource]) -> Option<&'a NamedResource> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    candidates
        .iter()
        .find(|c| c.name == name)
        .or_else(|| candidates.iter().find(|c| c.name.to_lowercase() == wanted))
        .or_else(|| {
            candidates.iter().find(|c| {
                let have = c.name.to_lowercase();
                !have.is_empty() && (have.contains(&wanted) || wanted.contains(&have))
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(names: &[&str]) -> Vec<NamedResource> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| NamedResource {
                id: format!("id-{i}"),
                name: n.to_string(),
            })
            .collect()
    }

    #[test]
    fn exact_beats_case_insensitive() {
        let all = resources(&["placed order", "Placed Order"]);
        assert_eq!(fuzzy_match("Placed Order", &all).unwrap().id, "id-1");
    }

    #[test]
    fn substring_in_either_direction() {
        let all = resources(&["Viewed Product Page", "Started Checkout"]);
        assert_eq!(fuzzy_match("viewed product", &all).unwrap().id, "id-0");
        assert_eq!(fuzzy_match("Started Checkout (web)", &all).unwrap().id, "id-1");
    }

    #[test]
    fn blank_name_never_matches() {
        let all = resources(&["Anything"]);
        assert!(fuzzy_match("  ", &all).is_none());
    }
}

//! Persistence contract for name → route records.
//!
//! Two backends implement [`RouteStore`]:
//! - [`crate::dynamo::DynamoStore`] - DynamoDB table, used in production
//! - [`MemoryStore`] - process-local map for tests and local runs
//!
//! Names passed in are expected to be normalized already. Absence is `Ok(None)`
//! from `get`; only transport and write failures are errors.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::model::Route;

/// What `del` does to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    #[default]
    Hard,
    /// Keep the record and stamp `deleted_at`. The name becomes claimable again.
    Soft,
}

impl std::str::FromStr for DeleteMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hard" => Ok(DeleteMode::Hard),
            "soft" => Ok(DeleteMode::Soft),
            other => Err(Error::Configuration(format!(
                "DELETE_MODE must be hard or soft, got {other:?}"
            ))),
        }
    }
}

#[async_trait]
pub trait RouteStore: Send + Sync {
    /// The live route under `name`, or `None`.
    async fn get(&self, name: &str) -> Result<Option<Route>>;

    /// Create or overwrite the record for `name`.
    async fn put(&self, name: &str, route: &Route) -> Result<()>;

    /// Create-only write. `Ok(false)` means a live record already holds `name`
    /// and nothing was written.
    async fn insert(&self, name: &str, route: &Route) -> Result<bool>;

    /// Remove `name`. Removing an absent name succeeds.
    async fn del(&self, name: &str) -> Result<()>;

    /// Every live route. No ordering, not a point-in-time snapshot.
    async fn get_all(&self) -> Result<HashMap<String, Route>>;
}

/// `get` that turns absence into [`Error::NotFound`].
pub async fn lookup(store: &dyn RouteStore, name: &str) -> Result<Route> {
    store
        .get(name)
        .await?
        .ok_or_else(|| Error::NotFound(name.to_string()))
}

/// Thread-safe in-memory store. Every read goes to the map; there is no
/// separate cache to fall out of date.
#[derive(Debug, Default)]
pub struct MemoryStore {
    routes: DashMap<String, Route>,
    delete_mode: DeleteMode,
}

impl MemoryStore {
    pub fn new(delete_mode: DeleteMode) -> Self {
        Self {
            routes: DashMap::new(),
            delete_mode,
        }
    }

    /// Raw record count, soft-deleted ones included.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl RouteStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Option<Route>> {
        Ok(self
            .routes
            .get(name)
            .map(|r| r.value().clone())
            .filter(Route::is_live))
    }

    async fn put(&self, name: &str, route: &Route) -> Result<()> {
        self.routes.insert(name.to_string(), route.clone());
        Ok(())
    }

    async fn insert(&self, name: &str, route: &Route) -> Result<bool> {
        // The entry guard holds the shard lock, so check and write are one step.
        match self.routes.entry(name.to_string()) {
            Entry::Occupied(o) if o.get().is_live() => Ok(false),
            Entry::Occupied(mut o) => {
                o.insert(route.clone());
                Ok(true)
            }
            Entry::Vacant(v) => {
                v.insert(route.clone());
                Ok(true)
            }
        }
    }

    async fn del(&self, name: &str) -> Result<()> {
        match self.delete_mode {
            DeleteMode::Hard => {
                self.routes.remove(name);
            }
            DeleteMode::Soft => {
                if let Some(mut r) = self.routes.get_mut(name) {
                    if r.deleted_at.is_none() {
                        r.deleted_at = Some(Utc::now());
                    }
                }
            }
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<HashMap<String, Route>> {
        Ok(self
            .routes
            .iter()
            .filter(|r| r.value().is_live())
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(url: &str) -> Route {
        Route::new(url, "tester", Utc::now())
    }

    #[tokio::test]
    async fn get_distinguishes_absent() {
        let s = MemoryStore::default();
        assert_eq!(s.get("nope").await.unwrap(), None);
        match lookup(&s, "nope").await {
            Err(Error::NotFound(n)) => assert_eq!(n, "nope"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn put_overwrites_insert_does_not() {
        let s = MemoryStore::default();
        assert!(s.insert("wiki", &route("https://a.example")).await.unwrap());
        assert!(!s.insert("wiki", &route("https://b.example")).await.unwrap());
        assert_eq!(s.get("wiki").await.unwrap().unwrap().url, "https://a.example");

        s.put("wiki", &route("https://c.example")).await.unwrap();
        assert_eq!(s.get("wiki").await.unwrap().unwrap().url, "https://c.example");
    }

    #[tokio::test]
    async fn hard_delete_is_idempotent() {
        let s = MemoryStore::new(DeleteMode::Hard);
        s.put("x", &route("https://x.example")).await.unwrap();
        s.del("x").await.unwrap();
        s.del("x").await.unwrap();
        s.del("never-there").await.unwrap();
        assert!(s.is_empty());
    }

    #[tokio::test]
    async fn soft_delete_hides_and_frees_the_name() {
        let s = MemoryStore::new(DeleteMode::Soft);
        s.put("x", &route("https://x.example")).await.unwrap();
        s.del("x").await.unwrap();

        assert_eq!(s.len(), 1);
        assert_eq!(s.get("x").await.unwrap(), None);
        assert!(s.get_all().await.unwrap().is_empty());

        assert!(s.insert("x", &route("https://y.example")).await.unwrap());
        assert_eq!(s.get("x").await.unwrap().unwrap().url, "https://y.example");
    }

    #[tokio::test]
    async fn get_all_returns_live_records() {
        let s = MemoryStore::new(DeleteMode::Soft);
        s.put("a", &route("https://a.example")).await.unwrap();
        s.put("b", &route("https://b.example")).await.unwrap();
        s.del("b").await.unwrap();
        let all = s.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["a"].url, "https://a.example");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_have_one_winner() {
        let s = std::sync::Arc::new(MemoryStore::default());
        let mut tasks = Vec::new();
        for i in 0..16 {
            let s = s.clone();
            tasks.push(tokio::spawn(async move {
                s.insert("contested", &route(&format!("https://{i}.example")))
                    .await
                    .unwrap()
            }));
        }
        let mut wins = 0;
        for t in tasks {
            if t.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[test]
    fn delete_mode_parses() {
        assert_eq!("SOFT".parse::<DeleteMode>().unwrap(), DeleteMode::Soft);
        assert_eq!("hard".parse::<DeleteMode>().unwrap(), DeleteMode::Hard);
        assert!("archive".parse::<DeleteMode>().is_err());
    }
}

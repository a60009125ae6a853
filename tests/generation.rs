//! End-to-end behavior of the name generator against in-memory stores.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use golinks::{Error, MemoryStore, NameGenerator, Route, RouteStore, WordLists};

const URL: &str = "https://google.com";

fn tiny() -> WordLists {
    WordLists::new(["small", "large"], ["cat", "dog"]).unwrap()
}

async fn run(g: &NameGenerator, store: &dyn RouteStore, n: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let name = g
            .generate_link(store, &format!("uid-{i}"), URL)
            .await
            .unwrap_or_else(|e| panic!("unable to generate link #{}: {e}", i + 1));
        out.push(name);
    }
    out
}

fn taken(url: &str) -> Route {
    Route::new(url, "someone-else", Utc::now())
}

#[tokio::test]
async fn same_seed_same_sequence() {
    let a = run(&NameGenerator::seeded(tiny(), 42), &MemoryStore::default(), 16).await;
    let b = run(&NameGenerator::seeded(tiny(), 42), &MemoryStore::default(), 16).await;
    assert_eq!(a, b);

    let c = run(
        &NameGenerator::seeded(WordLists::builtin(), 9),
        &MemoryStore::default(),
        25,
    )
    .await;
    let d = run(
        &NameGenerator::seeded(WordLists::builtin(), 9),
        &MemoryStore::default(),
        25,
    )
    .await;
    assert_eq!(c, d);
}

#[tokio::test]
async fn small_word_space_walks_every_tier() {
    let store = MemoryStore::default();
    let g = NameGenerator::seeded(tiny(), 42);

    let mut names = Vec::new();
    for i in 0..16 {
        let uid = format!("uid-{i}");
        let name = g.generate_link(&store, &uid, URL).await.unwrap();

        // Claimed before the call returns.
        let rt = store.get(&name).await.unwrap().expect("claimed name is stored");
        assert!(rt.generated);
        assert_eq!(rt.uid, uid);
        names.push(name);
    }

    let tier0: HashSet<&str> = names[..4].iter().map(String::as_str).collect();
    assert_eq!(
        tier0,
        HashSet::from(["large dog", "small cat", "large cat", "small dog"])
    );

    // Call 5 escalates instead of colliding or falling back.
    assert_eq!(names[4].split(' ').count(), 3, "{}", names[4]);
    let tier1: HashSet<&str> = names[4..12].iter().map(String::as_str).collect();
    assert_eq!(tier1.len(), 8);
    for n in &tier1 {
        let words: Vec<&str> = n.split(' ').collect();
        assert_eq!(words.len(), 3);
        assert!(["small", "large"].contains(&words[0]));
        assert!(["small", "large"].contains(&words[1]));
        assert!(["cat", "dog"].contains(&words[2]));
    }

    for n in &names[12..] {
        let num = n
            .strip_prefix("generated-")
            .unwrap_or_else(|| panic!("expected fallback, got {n}"));
        num.parse::<u64>().unwrap();
    }

    let distinct: HashSet<&String> = names.iter().collect();
    assert_eq!(distinct.len(), names.len());
}

#[tokio::test]
async fn fallback_skips_claimed_numbers() {
    let store = MemoryStore::default();
    let words = WordLists::new(["small"], ["cat"]).unwrap();
    store.put("small cat", &taken("https://a.example")).await.unwrap();
    store.put("small small cat", &taken("https://b.example")).await.unwrap();
    for n in 0..16 {
        store
            .put(&format!("generated-{n}"), &taken("https://c.example"))
            .await
            .unwrap();
    }

    let g = NameGenerator::seeded(words, 5);
    let name = g.generate_link(&store, "me", URL).await.unwrap();
    let n: u64 = name.strip_prefix("generated-").unwrap().parse().unwrap();
    assert!(n >= 16, "{name} was already claimed");
    assert_eq!(store.get(&name).await.unwrap().unwrap().uid, "me");

    // Pre-existing records are untouched.
    assert_eq!(store.get("generated-3").await.unwrap().unwrap().uid, "someone-else");
}

#[tokio::test]
async fn fallback_names_never_repeat() {
    let store = MemoryStore::default();
    let g = NameGenerator::seeded(WordLists::new(["tiny"], ["ant"]).unwrap(), 11);
    let names = run(&g, &store, 60).await;
    let distinct: HashSet<&String> = names.iter().collect();
    assert_eq!(distinct.len(), 60);
    assert_eq!(store.get_all().await.unwrap().len(), 60);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_generation_claims_distinct_names() {
    let store = Arc::new(MemoryStore::default());
    let g = Arc::new(NameGenerator::seeded(tiny(), 1));

    let mut tasks = Vec::new();
    for i in 0..24 {
        let store = store.clone();
        let g = g.clone();
        tasks.push(tokio::spawn(async move {
            g.generate_link(store.as_ref(), &format!("w{i}"), URL)
                .await
                .unwrap()
        }));
    }

    let mut names = HashSet::new();
    for t in tasks {
        assert!(names.insert(t.await.unwrap()), "duplicate name returned");
    }
    let stored = store.get_all().await.unwrap();
    assert_eq!(stored.len(), 24);
    assert!(names.iter().all(|n| stored.contains_key(n)));
}

/// A store whose reads never see existing records, as if every pre-check
/// raced with another writer. Only the conditional insert tells the truth.
struct StaleReads(MemoryStore);

#[async_trait]
impl RouteStore for StaleReads {
    async fn get(&self, _name: &str) -> golinks::Result<Option<Route>> {
        Ok(None)
    }
    async fn put(&self, name: &str, route: &Route) -> golinks::Result<()> {
        self.0.put(name, route).await
    }
    async fn insert(&self, name: &str, route: &Route) -> golinks::Result<bool> {
        self.0.insert(name, route).await
    }
    async fn del(&self, name: &str) -> golinks::Result<()> {
        self.0.del(name).await
    }
    async fn get_all(&self) -> golinks::Result<HashMap<String, Route>> {
        self.0.get_all().await
    }
}

#[tokio::test]
async fn lost_insert_race_is_a_collision() {
    let store = StaleReads(MemoryStore::default());
    for n in ["small cat", "small dog", "large cat"] {
        store.put(n, &taken("https://theirs.example")).await.unwrap();
    }

    let g = NameGenerator::seeded(tiny(), 8);
    let name = g.generate_link(&store, "mine", URL).await.unwrap();
    assert_eq!(name, "large dog");

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 4);
    for n in ["small cat", "small dog", "large cat"] {
        assert_eq!(all[n].url, "https://theirs.example", "{n} was overwritten");
    }
}

struct Unreachable;

#[async_trait]
impl RouteStore for Unreachable {
    async fn get(&self, _name: &str) -> golinks::Result<Option<Route>> {
        Err(Error::StoreUnavailable("connection refused".into()))
    }
    async fn put(&self, _name: &str, _route: &Route) -> golinks::Result<()> {
        Err(Error::StoreUnavailable("connection refused".into()))
    }
    async fn insert(&self, _name: &str, _route: &Route) -> golinks::Result<bool> {
        Err(Error::StoreUnavailable("connection refused".into()))
    }
    async fn del(&self, _name: &str) -> golinks::Result<()> {
        Err(Error::StoreUnavailable("connection refused".into()))
    }
    async fn get_all(&self) -> golinks::Result<HashMap<String, Route>> {
        Err(Error::StoreUnavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn store_failures_propagate() {
    let g = NameGenerator::seeded(tiny(), 2);
    let err = g.generate_link(&Unreachable, "u", URL).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn empty_word_lists_are_a_configuration_error() {
    let store = MemoryStore::default();
    let g = NameGenerator::seeded(WordLists::new(Vec::<&str>::new(), Vec::<&str>::new()).unwrap(), 2);
    let err = g.generate_link(&store, "u", URL).await.unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{err:?}");
    assert!(store.is_empty());
}

#[tokio::test]
async fn longest_allowed_words_still_reach_the_fallback() {
    let adj = "a".repeat(32);
    let noun = "n".repeat(34);
    let g = NameGenerator::seeded(WordLists::new([adj.as_str()], [noun.as_str()]).unwrap(), 4);
    let store = MemoryStore::default();

    let names = run(&g, &store, 4).await;
    assert_eq!(names[0], format!("{adj} {noun}"));
    assert_eq!(names[1], format!("{adj} {adj} {noun}"));
    assert!(names[2..].iter().all(|n| n.starts_with("generated-")), "{names:?}");
}

#[test]
fn overlong_words_are_refused_up_front() {
    let adj = "a".repeat(40);
    let noun = "n".repeat(40);
    let err = WordLists::new([adj.as_str()], [noun.as_str()]).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{err:?}");
}

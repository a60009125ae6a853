//! Memorable, collision-free link names.
//!
//! Candidates escalate through word tiers and then a numeric fallback:
//!
//! ```text
//! tier 0   "<adj> <noun>"            A * N names
//! tier 1   "<adj> <adj> <noun>"      A * A * N names
//! fallback "generated-<n>"           n uniform in a span that doubles per miss
//! ```
//!
//! A word tier starts at a uniformly random index of its combination space
//! and probes consecutive indices, at most `attempts_per_tier` of them. A tier
//! smaller than that bound is therefore explored completely before escalating.
//! Only that first candidate is uniform: later probes are linear, so a free
//! name right after a run of claimed ones is picked more often than others.
//!
//! Every candidate is claimed with a create-only store write. Losing that write
//! to a concurrent claimer counts as a collision, never as an error.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::model::Route;
use crate::names::normalize;
use crate::store::RouteStore;
use crate::words::{WordLists, MAX_ADJECTIVES};

pub const DEFAULT_ATTEMPTS_PER_TIER: u32 = 16;

const FALLBACK_START_SPAN: u64 = 16;

enum Claim {
    Claimed,
    Taken,
}

pub struct NameGenerator<R = StdRng> {
    words: WordLists,
    rng: Mutex<R>,
    attempts_per_tier: u32,
}

impl NameGenerator<StdRng> {
    /// Same seed, same call order, same store contents: same names.
    pub fn seeded(words: WordLists, seed: u64) -> Self {
        Self::new(words, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(words: WordLists) -> Self {
        Self::new(words, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> NameGenerator<R> {
    pub fn new(words: WordLists, rng: R) -> Self {
        Self {
            words,
            rng: Mutex::new(rng),
            attempts_per_tier: DEFAULT_ATTEMPTS_PER_TIER,
        }
    }

    pub fn with_attempts_per_tier(mut self, attempts: u32) -> Self {
        self.attempts_per_tier = attempts.max(1);
        self
    }

    pub fn words(&self) -> &WordLists {
        &self.words
    }

    // The lock covers one draw and is released before any store call.
    fn draw(&self, below: u64) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..below)
    }

    /// Pick a free name, claim it for `uid` pointing at `url`, and return it.
    ///
    /// The returned name exists in `store` with `generated = true` by the time
    /// this resolves.
    pub async fn generate_link(
        &self,
        store: &dyn RouteStore,
        uid: &str,
        url: &str,
    ) -> Result<String> {
        if self.words.is_degenerate() {
            return Err(Error::Configuration(format!(
                "word lists must be non-empty (adjectives: {}, nouns: {})",
                self.words.adjectives().len(),
                self.words.nouns().len()
            )));
        }

        for adjs in 1..=MAX_ADJECTIVES {
            let tier = adjs - 1;
            let space = self.words.space(adjs);
            let probes = space.min(u64::from(self.attempts_per_tier));
            let start = self.draw(space);

            for i in 0..probes {
                let index = ((u128::from(start) + u128::from(i)) % u128::from(space)) as u64;
                let candidate = normalize(&self.words.compose(index, adjs)).map_err(|e| {
                    Error::Configuration(format!("word combination rejected: {e}"))
                })?;

                if let Claim::Claimed = self.claim(store, &candidate, uid, url).await? {
                    tracing::info!(link = %candidate, tier, "claimed generated name");
                    return Ok(candidate);
                }
                tracing::debug!(link = %candidate, tier, "name taken");
            }
            tracing::debug!(tier, probes, "word tier exhausted, escalating");
        }

        let mut span = FALLBACK_START_SPAN;
        loop {
            let candidate = format!("generated-{}", self.draw(span));
            if let Claim::Claimed = self.claim(store, &candidate, uid, url).await? {
                tracing::info!(link = %candidate, "claimed fallback name");
                return Ok(candidate);
            }
            tracing::debug!(link = %candidate, span, "fallback name taken");
            span = span.saturating_mul(2);
        }
    }

    async fn claim(
        &self,
        store: &dyn RouteStore,
        name: &str,
        uid: &str,
        url: &str,
    ) -> Result<Claim> {
        // Cheap read first; the conditional insert below is what decides.
        if store.get(name).await?.is_some() {
            return Ok(Claim::Taken);
        }

        let route = Route::generated(url, uid, Utc::now());
        if store.insert(name, &route).await? {
            Ok(Claim::Claimed)
        } else {
            tracing::debug!(link = name, "lost claim race");
            Ok(Claim::Taken)
        }
    }
}

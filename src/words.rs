use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::names::MAX_NAME_LEN;

/// The largest word tier has this many adjectives.
pub const MAX_ADJECTIVES: u32 = 2;

const BUILTIN_ADJECTIVES: &str = include_str!("../words/adjectives.txt");
const BUILTIN_NOUNS: &str = include_str!("../words/nouns.txt");

/// Adjective and noun vocabularies for generated names.
///
/// Words are lowercased, deduplicated in order, and checked so any
/// combination of them joined by spaces is already a normalized name, no
/// longer than `MAX_NAME_LEN`. Empty lists are accepted here; generation
/// refuses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordLists {
    adjectives: Vec<String>,
    nouns: Vec<String>,
}

impl WordLists {
    pub fn new<A, N>(adjectives: A, nouns: N) -> Result<Self>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let words = Self {
            adjectives: clean("adjective", adjectives)?,
            nouns: clean("noun", nouns)?,
        };
        let longest = words.longest_name();
        if longest > MAX_NAME_LEN {
            return Err(Error::Configuration(format!(
                "words too long: a {MAX_ADJECTIVES}-adjective name can reach {longest} characters, max is {MAX_NAME_LEN}"
            )));
        }
        Ok(words)
    }

    pub fn builtin() -> Self {
        Self {
            adjectives: parse_list(BUILTIN_ADJECTIVES),
            nouns: parse_list(BUILTIN_NOUNS),
        }
    }

    /// Load lists from files, falling back to the built-in list for a missing path.
    pub fn load(adjectives: Option<&Path>, nouns: Option<&Path>) -> Result<Self> {
        let read = |p: Option<&Path>, builtin: &str| -> Result<Vec<String>> {
            match p {
                Some(p) => std::fs::read_to_string(p)
                    .map(|s| parse_list(&s))
                    .map_err(|e| Error::Configuration(format!("{}: {e}", p.display()))),
                None => Ok(parse_list(builtin)),
            }
        };
        Self::new(
            read(adjectives, BUILTIN_ADJECTIVES)?,
            read(nouns, BUILTIN_NOUNS)?,
        )
    }

    pub fn adjectives(&self) -> &[String] {
        &self.adjectives
    }

    pub fn nouns(&self) -> &[String] {
        &self.nouns
    }

    /// Length in characters of the longest name `compose` can produce.
    fn longest_name(&self) -> usize {
        let max = |list: &[String]| list.iter().map(|w| w.chars().count()).max().unwrap_or(0);
        let adjs = MAX_ADJECTIVES as usize;
        max(self.adjectives.as_slice()) * adjs + max(self.nouns.as_slice()) + adjs
    }

    pub fn is_degenerate(&self) -> bool {
        self.adjectives.is_empty() || self.nouns.is_empty()
    }

    /// Number of names with `adjs` adjectives and one noun. Saturates.
    pub fn space(&self, adjs: u32) -> u64 {
        let a = self.adjectives.len() as u64;
        let n = self.nouns.len() as u64;
        a.checked_pow(adjs)
            .and_then(|p| p.checked_mul(n))
            .unwrap_or(u64::MAX)
    }

    /// Decode `index` (mixed radix, noun is the lowest digit) into
    /// `"<adj> .. <adj> <noun>"`. `index` must be below `space(adjs)` and the
    /// lists must be non-empty.
    pub fn compose(&self, index: u64, adjs: u32) -> String {
        let a = self.adjectives.len() as u64;
        let n = self.nouns.len() as u64;

        let noun = &self.nouns[(index % n) as usize];
        let mut rest = index / n;
        let mut picked = Vec::with_capacity(adjs as usize + 1);
        for _ in 0..adjs {
            picked.push(self.adjectives[(rest % a) as usize].as_str());
            rest /= a;
        }
        picked.reverse();
        picked.push(noun);
        picked.join(" ")
    }
}

fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}

fn clean<I>(kind: &str, words: I) -> Result<Vec<String>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for w in words {
        let w = w.as_ref().trim().to_lowercase();
        if w.is_empty() {
            return Err(Error::Configuration(format!("blank {kind} in word list")));
        }
        if let Some(c) = w
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '%'))
        {
            return Err(Error::Configuration(format!(
                "{kind} {w:?} contains invalid character {c:?}"
            )));
        }
        if seen.insert(w.clone()) {
            out.push(w);
        }
    }
    Ok(out)
}

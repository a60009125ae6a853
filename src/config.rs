//! Cold-start configuration from environment variables.
//!
//! Env:
//!   STORE_BACKEND        : dynamodb (default) | memory
//!   TABLE_NAME           : DynamoDB table, required for dynamodb
//!   TABLE_REGION         : region of the table if it differs from the Lambda's
//!   PUBLIC_DOMAIN        : host used in short URLs, e.g. go.example.com
//!   ADMIN_ENABLED        : true | 1 mounts /admin/
//!   DELETE_MODE          : hard (default) | soft
//!   GENERATOR_ATTEMPTS   : probes per word tier, default 16
//!   GENERATOR_SEED       : fixed u64 seed for reproducible names
//!   ADJECTIVES_FILE      : word list override, one word per line
//!   NOUNS_FILE           : word list override, one word per line
//!   APP_VERSION          : reported by /version

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::generator::DEFAULT_ATTEMPTS_PER_TIER;
use crate::store::DeleteMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    DynamoDb,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub table: String,
    pub table_region: Option<String>,
    pub domain: String,
    pub admin: bool,
    pub delete_mode: DeleteMode,
    pub attempts_per_tier: u32,
    pub seed: Option<u64>,
    pub adjectives_file: Option<PathBuf>,
    pub nouns_file: Option<PathBuf>,
    pub version: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("STORE_BACKEND").as_deref().map(str::to_ascii_lowercase) {
            None => Backend::DynamoDb,
            Some(b) if b == "dynamodb" => Backend::DynamoDb,
            Some(b) if b == "memory" => Backend::Memory,
            Some(b) => {
                return Err(Error::Configuration(format!(
                    "STORE_BACKEND must be dynamodb or memory, got {b:?}"
                )))
            }
        };

        let table = match (backend, get("TABLE_NAME")) {
            (_, Some(t)) => t,
            (Backend::Memory, None) => String::new(),
            (Backend::DynamoDb, None) => {
                return Err(Error::Configuration("TABLE_NAME is not set".into()))
            }
        };

        let delete_mode = get("DELETE_MODE")
            .map(|s| s.parse::<DeleteMode>())
            .transpose()?
            .unwrap_or_default();

        let attempts_per_tier = match get("GENERATOR_ATTEMPTS") {
            None => DEFAULT_ATTEMPTS_PER_TIER,
            Some(s) => match s.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Error::Configuration(format!(
                        "GENERATOR_ATTEMPTS must be a positive integer, got {s:?}"
                    )))
                }
            },
        };

        let seed = get("GENERATOR_SEED")
            .map(|s| {
                s.parse::<u64>().map_err(|_| {
                    Error::Configuration(format!("GENERATOR_SEED must be a u64, got {s:?}"))
                })
            })
            .transpose()?;

        Ok(Self {
            backend,
            table,
            table_region: get("TABLE_REGION"),
            domain: get("PUBLIC_DOMAIN").unwrap_or_else(|| "localhost".to_string()),
            admin: get("ADMIN_ENABLED")
                .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
                .unwrap_or(false),
            delete_mode,
            attempts_per_tier,
            seed,
            adjectives_file: get("ADJECTIVES_FILE").map(PathBuf::from),
            nouns_file: get("NOUNS_FILE").map(PathBuf::from),
            version: get("APP_VERSION").unwrap_or_else(|| "none".to_string()),
        })
    }
}

//! Go-links: short memorable names that redirect to URLs.
//!
//! - `names`: canonical form of a name and the reserved segments it must avoid
//! - `store`: the name → route persistence contract, plus an in-memory backend
//! - `dynamo`: DynamoDB backend
//! - `generator`: word-combination names with a numeric fallback
//! - `handler`: Lambda HTTP surface

mod admin;
mod api;
pub mod config;
pub mod dynamo;
pub mod error;
pub mod generator;
pub mod handler;
pub mod model;
pub mod names;
pub mod store;
pub mod util;
pub mod words;

pub use error::{Error, NameError, Result};
pub use generator::NameGenerator;
pub use model::Route;
pub use store::{lookup, DeleteMode, MemoryStore, RouteStore};
pub use words::WordLists;

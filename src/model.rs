use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The value part of a go-link.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Route {
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub generated: bool,
}

impl Route {
    pub fn new(url: impl Into<String>, uid: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            created_at: now,
            modified_at: now,
            deleted_at: None,
            uid: uid.into(),
            generated: false,
        }
    }

    pub fn generated(url: impl Into<String>, uid: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            generated: true,
            ..Self::new(url, uid, now)
        }
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Edit in place: new target, bumped `modified_at`, everything else kept.
    pub fn edited(&self, url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            modified_at: now,
            ..self.clone()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpsertReq {
    pub url: String,
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpsertResp {
    pub ok: bool,
    pub name: String,
    pub short_url: String,
    pub route: Route,
}

//! DynamoDB-backed [`RouteStore`].
//!
//! Table layout:
//!   PK: name (S)
//!   Attributes:
//!     url (S), created_at (S, RFC 3339), modified_at (S, RFC 3339),
//!     deleted_at (S, RFC 3339, only on soft-deleted items),
//!     uid (S), generated (BOOL)
//!
//! IAM: GetItem, PutItem, UpdateItem, DeleteItem, Scan on the table.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::error::ProvideErrorMetadata; // for .code()
use chrono::{DateTime, Utc};
use ddb::types::AttributeValue as Av;

use crate::error::{Error, Result};
use crate::model::Route;
use crate::store::{DeleteMode, RouteStore};

const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailedException";

#[derive(Clone)]
pub struct DynamoStore {
    ddb: ddb::Client,
    table: String,
    delete_mode: DeleteMode,
}

impl DynamoStore {
    pub fn new(ddb: ddb::Client, table: impl Into<String>, delete_mode: DeleteMode) -> Self {
        Self {
            ddb,
            table: table.into(),
            delete_mode,
        }
    }

    /// Client from the default AWS chain, optionally pinned to the table's region
    /// (which may differ from the Lambda's).
    pub async fn connect(
        table: impl Into<String>,
        region: Option<String>,
        delete_mode: DeleteMode,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let conf = loader.load().await;
        Self::new(ddb::Client::new(&conf), table, delete_mode)
    }
}

fn map_ddb_err<E: std::fmt::Debug + ProvideErrorMetadata>(op: &str, e: E) -> Error {
    tracing::error!(
        "ddb {op} err: code={:?} msg={:?}",
        e.code(),
        e.message()
    );
    Error::StoreUnavailable(format!("ddb {op}: {e:?}"))
}

pub(crate) fn route_to_item(name: &str, rt: &Route) -> HashMap<String, Av> {
    let mut item = HashMap::new();
    item.insert("name".into(), Av::S(name.to_string()));
    item.insert("url".into(), Av::S(rt.url.clone()));
    item.insert("created_at".into(), Av::S(rt.created_at.to_rfc3339()));
    item.insert("modified_at".into(), Av::S(rt.modified_at.to_rfc3339()));
    if let Some(d) = rt.deleted_at {
        item.insert("deleted_at".into(), Av::S(d.to_rfc3339()));
    }
    item.insert("uid".into(), Av::S(rt.uid.clone()));
    item.insert("generated".into(), Av::Bool(rt.generated));
    item
}

fn time_attr(item: &HashMap<String, Av>, key: &str) -> Option<DateTime<Utc>> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

pub(crate) fn item_to_route(item: &HashMap<String, Av>) -> Result<(String, Route)> {
    let name = item
        .get("name")
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| Error::StoreUnavailable("item without a name".into()))?;
    let url = item
        .get("url")
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| Error::StoreUnavailable(format!("item {name:?} has no url")))?;
    let created_at = time_attr(item, "created_at").unwrap_or_default();
    let modified_at = time_attr(item, "modified_at").unwrap_or(created_at);

    let rt = Route {
        url,
        created_at,
        modified_at,
        deleted_at: time_attr(item, "deleted_at"),
        uid: item
            .get("uid")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default(),
        generated: item
            .get("generated")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
    };
    Ok((name, rt))
}

#[async_trait]
impl RouteStore for DynamoStore {
    async fn get(&self, name: &str) -> Result<Option<Route>> {
        let r = self
            .ddb
            .get_item()
            .table_name(&self.table)
            .key("name", Av::S(name.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_ddb_err("get", e))?;

        let Some(item) = r.item else {
            return Ok(None);
        };
        let (_, rt) = item_to_route(&item)?;
        Ok(Some(rt).filter(Route::is_live))
    }

    async fn put(&self, name: &str, route: &Route) -> Result<()> {
        self.ddb
            .put_item()
            .table_name(&self.table)
            .set_item(Some(route_to_item(name, route)))
            .send()
            .await
            .map_err(|e| map_ddb_err("put", e))?;
        Ok(())
    }

    async fn insert(&self, name: &str, route: &Route) -> Result<bool> {
        let r = self
            .ddb
            .put_item()
            .table_name(&self.table)
            .set_item(Some(route_to_item(name, route)))
            .condition_expression("attribute_not_exists(#n) OR attribute_exists(#d)")
            .expression_attribute_names("#n", "name")
            .expression_attribute_names("#d", "deleted_at")
            .send()
            .await;

        match r {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.code() == Some(CONDITIONAL_CHECK_FAILED) {
                    return Ok(false);
                }
                Err(map_ddb_err("insert", e))
            }
        }
    }

    async fn del(&self, name: &str) -> Result<()> {
        match self.delete_mode {
            DeleteMode::Hard => {
                self.ddb
                    .delete_item()
                    .table_name(&self.table)
                    .key("name", Av::S(name.to_string()))
                    .send()
                    .await
                    .map_err(|e| map_ddb_err("delete", e))?;
                Ok(())
            }
            DeleteMode::Soft => {
                // Without the condition UpdateItem would create a stub item.
                let r = self
                    .ddb
                    .update_item()
                    .table_name(&self.table)
                    .key("name", Av::S(name.to_string()))
                    .update_expression("SET #d = :d")
                    .condition_expression("attribute_exists(#n) AND attribute_not_exists(#d)")
                    .expression_attribute_names("#n", "name")
                    .expression_attribute_names("#d", "deleted_at")
                    .expression_attribute_values(":d", Av::S(Utc::now().to_rfc3339()))
                    .send()
                    .await;
                match r {
                    Ok(_) => Ok(()),
                    Err(e) if e.code() == Some(CONDITIONAL_CHECK_FAILED) => Ok(()),
                    Err(e) => Err(map_ddb_err("soft delete", e)),
                }
            }
        }
    }

    async fn get_all(&self) -> Result<HashMap<String, Route>> {
        let mut out = HashMap::new();
        let mut start: Option<HashMap<String, Av>> = None;

        loop {
            let resp = self
                .ddb
                .scan()
                .table_name(&self.table)
                .set_exclusive_start_key(start.take())
                .send()
                .await
                .map_err(|e| map_ddb_err("scan", e))?;

            for item in resp.items() {
                let (name, rt) = item_to_route(item)?;
                if rt.is_live() {
                    out.insert(name, rt);
                }
            }

            match resp.last_evaluated_key() {
                Some(lek) if !lek.is_empty() => start = Some(lek.clone()),
                _ => break,
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_round_trip_keeps_soft_delete_marker() {
        let now = Utc::now();
        let mut rt = Route::generated("https://example.com", "u-7", now);
        rt.deleted_at = Some(now);
        let item = route_to_item("small cat", &rt);
        assert_eq!(item["generated"], Av::Bool(true));

        let (name, back) = item_to_route(&item).unwrap();
        assert_eq!(name, "small cat");
        assert_eq!(back.url, rt.url);
        assert_eq!(back.uid, "u-7");
        assert!(back.generated);
        assert!(!back.is_live());
    }

    #[test]
    fn item_without_url_is_rejected() {
        let item = HashMap::from([("name".to_string(), Av::S("x".into()))]);
        assert!(matches!(
            item_to_route(&item),
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[test]
    fn legacy_items_default_missing_fields() {
        let item = HashMap::from([
            ("name".to_string(), Av::S("wiki".into())),
            ("url".to_string(), Av::S("https://wiki.example".into())),
            (
                "created_at".to_string(),
                Av::S("2024-01-02T03:04:05+00:00".into()),
            ),
        ]);
        let (_, rt) = item_to_route(&item).unwrap();
        assert_eq!(rt.modified_at, rt.created_at);
        assert_eq!(rt.uid, "");
        assert!(!rt.generated);
        assert!(rt.is_live());
    }
}

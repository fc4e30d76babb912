pub mod mongo;

use crate::filter::FilterPredicate;
use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::{self, Bson};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

pub use mongo::MongoStore;

/// Opaque subscriber key as stored in `_id`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Bson);

impl SubscriberId {
    #[must_use]
    pub const fn as_bson(&self) -> &Bson {
        &self.0
    }
}

impl From<Bson> for SubscriberId {
    fn from(value: Bson) -> Self {
        Self(value)
    }
}

impl From<&str> for SubscriberId {
    fn from(value: &str) -> Self {
        Self(Bson::String(value.to_string()))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Bson::String(id) => f.write_str(id),
            Bson::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            other => write!(f, "{other}"),
        }
    }
}

/// Projection of a subscriber document, the only fields the cleanup reads
///
/// Everything but `_id` is kept as raw BSON: the subscribers worth cleaning up
/// are the ones with a numeric `customId` or no date in `createTime`.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscriber {
    #[serde(rename = "_id")]
    pub id: SubscriberId,
    #[serde(default)]
    pub name: Option<Bson>,
    #[serde(default, rename = "customId")]
    pub custom_id: Option<Bson>,
    #[serde(default, rename = "createTime")]
    pub create_time: Option<Bson>,
}

impl Subscriber {
    /// Fields kept by the subscriber query, in `MongoDB` projection form
    #[must_use]
    pub fn projection() -> bson::Document {
        bson::doc! { "_id": 1, "name": 1, "customId": 1, "createTime": 1 }
    }

    /// One-line JSON record printed for every eligible subscriber
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "_id": self.id.to_string(),
            "name": self.name.clone().map(Bson::into_relaxed_extjson),
            "customId": self.custom_id.clone().map(Bson::into_relaxed_extjson),
            "createTime": self.create_time.as_ref().map(|created| match created {
                Bson::DateTime(dt) => dt
                    .try_to_rfc3339_string()
                    .map_or_else(|_| created.clone().into_relaxed_extjson(), Value::String),
                other => other.clone().into_relaxed_extjson(),
            }),
        })
        .to_string()
    }
}

/// Read side of the cleanup: the subscriber and provisioning-record collections
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Fetch every subscriber matching the predicate
    async fn find_subscribers(&self, filter: &FilterPredicate) -> Result<Vec<Subscriber>>;

    /// Number of provisioning records referencing the subscriber
    async fn count_provisioning_records(&self, id: &SubscriberId) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};

    #[test]
    fn test_subscriber_id_display() {
        assert_eq!(SubscriberId::from("8d1b4c2e").to_string(), "8d1b4c2e");

        let oid = ObjectId::parse_str("5b0e8b7e9d1a4c0012345678").unwrap();
        assert_eq!(
            SubscriberId::from(Bson::ObjectId(oid)).to_string(),
            "5b0e8b7e9d1a4c0012345678"
        );

        assert_eq!(SubscriberId::from(Bson::Int32(42)).to_string(), "42");
    }

    #[test]
    fn test_subscriber_from_document() {
        let created = bson::DateTime::from_millis(1_527_811_200_000);
        let sub: Subscriber = bson::from_document(doc! {
            "_id": "s1",
            "name": "Jane",
            "customId": "acme:1",
            "createTime": created,
            "orgId": "A",
            "locations": [{ "devices": ["cpe-1"] }],
        })
        .unwrap();

        assert_eq!(sub.id, SubscriberId::from("s1"));
        assert_eq!(sub.name, Some(Bson::String("Jane".into())));
        assert_eq!(sub.custom_id, Some(Bson::String("acme:1".into())));
        assert_eq!(sub.create_time, Some(Bson::DateTime(created)));
    }

    #[test]
    fn test_subscriber_missing_optional_fields() {
        let sub: Subscriber = bson::from_document(doc! { "_id": "s2" }).unwrap();
        assert!(sub.name.is_none());
        assert!(sub.custom_id.is_none());
        assert!(sub.create_time.is_none());
    }

    #[test]
    fn test_subscriber_to_json() {
        let sub: Subscriber = bson::from_document(doc! {
            "_id": "s1",
            "name": "Jane",
            "customId": "acme:1",
            "createTime": bson::DateTime::from_millis(1_527_811_200_000),
        })
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&sub.to_json()).unwrap();
        assert_eq!(value["_id"], "s1");
        assert_eq!(value["name"], "Jane");
        assert_eq!(value["customId"], "acme:1");
        assert!(
            value["createTime"]
                .as_str()
                .unwrap()
                .starts_with("2018-06-01T00:00:00")
        );
    }

    #[test]
    fn test_subscriber_non_string_fields() {
        let sub: Subscriber = bson::from_document(doc! {
            "_id": "s3",
            "name": Bson::Null,
            "customId": 12345_i32,
            "createTime": "2018-06-01",
        })
        .unwrap();

        assert_eq!(sub.custom_id, Some(Bson::Int32(12345)));

        let value: serde_json::Value = serde_json::from_str(&sub.to_json()).unwrap();
        assert_eq!(value["_id"], "s3");
        assert!(value["name"].is_null());
        assert_eq!(value["customId"], 12345);
        assert_eq!(value["createTime"], "2018-06-01");
    }
}

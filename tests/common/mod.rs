#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::{self, Document, doc};
use std::{env, path::PathBuf, process::Command};
use subclean::{
    filter::FilterPredicate,
    store::{Subscriber, SubscriberId, SubscriberStore},
};

pub const MONGO_URL: &str = "mongodb://localhost:27017";

pub fn skip_if_no_mongo() -> bool {
    env::var("SKIP_MONGO_TESTS").is_ok()
}

pub fn mongo_url() -> String {
    env::var("SUBCLEAN_TEST_MONGO_URL").unwrap_or_else(|_| MONGO_URL.to_string())
}

/// Store keeping raw documents in memory and filtering them with the predicate
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub subscribers: Vec<Document>,
    pub provisioning: Vec<Document>,
}

impl MemoryStore {
    pub fn new(subscribers: Vec<Document>) -> Self {
        Self {
            subscribers,
            provisioning: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_provisioning_record(mut self, subscriber_id: &str) -> Self {
        self.provisioning.push(doc! {
            "subscriberId": subscriber_id,
            "deviceId": format!("cpe-{subscriber_id}"),
        });
        self
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn find_subscribers(&self, filter: &FilterPredicate) -> Result<Vec<Subscriber>> {
        self.subscribers
            .iter()
            .filter(|document| filter.matches(document))
            .map(|document| -> Result<Subscriber> { Ok(bson::from_document(document.clone())?) })
            .collect()
    }

    async fn count_provisioning_records(&self, id: &SubscriberId) -> Result<u64> {
        let count = self
            .provisioning
            .iter()
            .filter(|record| record.get("subscriberId") == Some(id.as_bson()))
            .count();
        Ok(u64::try_from(count)?)
    }
}

pub fn created(rfc3339: &str) -> bson::DateTime {
    bson::DateTime::parse_rfc3339_str(rfc3339).unwrap()
}

pub fn subscriber(id: &str, org_id: &str, custom_id: &str) -> Document {
    doc! {
        "_id": id,
        "name": format!("Subscriber {id}"),
        "customId": custom_id,
        "orgId": org_id,
        "createTime": created("2018-01-15T10:00:00Z"),
        "locations": [{ "name": "home", "devices": [format!("cpe-{id}")] }],
    }
}

pub fn subclean_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_subclean"))
}

/// Command for the binary with no `SUBCLEAN_*` variables leaking in
pub fn subclean_command() -> Command {
    let mut command = Command::new(subclean_binary_path());
    for (key, _) in env::vars().filter(|(key, _)| key.starts_with("SUBCLEAN_")) {
        command.env_remove(key);
    }
    command
}

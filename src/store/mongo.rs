use super::{Subscriber, SubscriberId, SubscriberStore};
use crate::{error::CleanupError, filter::FilterPredicate, metrics::OPERATION_DURATION};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{Document, doc},
    options::ClientOptions,
};
use std::time::Instant;
use tracing::debug;

/// `MongoDB` backed store, one client with the two collection handles
#[derive(Debug, Clone)]
pub struct MongoStore {
    subscribers: Collection<Subscriber>,
    provisioning: Collection<Document>,
}

impl MongoStore {
    /// Connect and verify the server answers a `ping`
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::Connect`] if the URL is invalid or the server
    /// cannot be reached
    pub async fn connect(
        url: &str,
        db_name: &str,
        subscribers: &str,
        provisioning: &str,
    ) -> Result<Self, CleanupError> {
        let timer = Instant::now();

        let mut options = ClientOptions::parse(url)
            .await
            .map_err(CleanupError::Connect)?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options).map_err(CleanupError::Connect)?;
        let database = client.database(db_name);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(CleanupError::Connect)?;

        OPERATION_DURATION
            .with_label_values(&["connect"])
            .observe(timer.elapsed().as_secs_f64());

        debug!(database = db_name, subscribers, provisioning, "connected to MongoDB");

        Ok(Self {
            subscribers: database.collection(subscribers),
            provisioning: database.collection(provisioning),
        })
    }
}

#[async_trait]
impl SubscriberStore for MongoStore {
    async fn find_subscribers(&self, filter: &FilterPredicate) -> Result<Vec<Subscriber>> {
        let timer = Instant::now();

        let subscribers: Vec<Subscriber> = self
            .subscribers
            .find(filter.to_document())
            .projection(Subscriber::projection())
            .await
            .with_context(|| format!("find on {}", self.subscribers.name()))?
            .try_collect()
            .await
            .with_context(|| format!("reading cursor of {}", self.subscribers.name()))?;

        OPERATION_DURATION
            .with_label_values(&["find"])
            .observe(timer.elapsed().as_secs_f64());

        Ok(subscribers)
    }

    async fn count_provisioning_records(&self, id: &SubscriberId) -> Result<u64> {
        let timer = Instant::now();

        let count = self
            .provisioning
            .count_documents(doc! { "subscriberId": id.as_bson().clone() })
            .await
            .with_context(|| format!("count on {}", self.provisioning.name()))?;

        OPERATION_DURATION
            .with_label_values(&["count"])
            .observe(timer.elapsed().as_secs_f64());

        Ok(count)
    }
}

//! Subscriber deletion through the ACS subscriber-management API

use crate::{error::CleanupError, metrics::OPERATION_DURATION, store::SubscriberId};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Instant;
use tracing::debug;

/// Value of the `appid` header sent with every delete
pub const APP_ID: &str = "Cleanup";

/// How the service answered a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// HTTP 200
    Deleted,
    /// Any other HTTP status
    Rejected(u16),
}

/// Write side of the cleanup
#[async_trait]
pub trait SubscriberDeleter: Send + Sync {
    /// Issue one delete for the subscriber
    ///
    /// Transport failures are errors, any HTTP answer is an outcome.
    async fn delete(&self, id: &SubscriberId) -> Result<DeleteOutcome>;
}

#[derive(Debug, Clone)]
pub struct AcsClient {
    base: Url,
    client: reqwest::Client,
}

impl AcsClient {
    /// # Errors
    ///
    /// Returns [`CleanupError::HttpClient`] if the HTTP client cannot be built
    pub fn new(base: Url) -> Result<Self, CleanupError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CleanupError::HttpClient)?;

        Ok(Self { base, client })
    }

    /// `<base>/cc/subscriber/<id>`, the id percent-encoded as one path segment
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path
    pub fn subscriber_url(&self, id: &SubscriberId) -> Result<Url> {
        let id = id.to_string();
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("ACS URL cannot be a base: {}", self.base))?
            .pop_if_empty()
            .extend(["cc", "subscriber", id.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl SubscriberDeleter for AcsClient {
    async fn delete(&self, id: &SubscriberId) -> Result<DeleteOutcome> {
        let url = self.subscriber_url(id)?;
        debug!(%url, appid = APP_ID, "Subscriber delete");

        let timer = Instant::now();
        let response = self
            .client
            .delete(url.clone())
            .header("appid", APP_ID)
            .send()
            .await
            .with_context(|| format!("DELETE {url}"))?;

        OPERATION_DURATION
            .with_label_values(&["delete"])
            .observe(timer.elapsed().as_secs_f64());

        let status = response.status();
        if status == StatusCode::OK {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Rejected(status.as_u16()))
        }
    }
}

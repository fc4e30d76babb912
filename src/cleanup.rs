//! The filter-and-confirmation pipeline
//!
//! One query selects the candidates, then every candidate runs its own
//! pipeline (provisioning check, report, optional delete). The pipelines are
//! polled together on the calling task and the summary is returned only once
//! all of them completed.

use crate::{
    acs::{DeleteOutcome, SubscriberDeleter},
    error::CleanupError,
    filter::FilterPredicate,
    metrics::{SUBSCRIBERS_FETCHED, SUBSCRIBERS_TOTAL},
    store::{Subscriber, SubscriberStore},
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use tracing::{debug, info, warn};

/// Result of one subscriber pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Has provisioning records, not eligible
    Retained { records: u64 },
    /// Eligible, deletion disabled
    Listed,
    Deleted,
    /// Delete answered with a status other than 200
    Rejected { status: u16 },
    /// Provisioning lookup failed, no decision was reached
    CheckFailed,
    /// Delete request failed before an answer arrived
    DeleteFailed,
}

impl Outcome {
    /// Metric label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Retained { .. } => "retained",
            Self::Listed => "listed",
            Self::Deleted => "deleted",
            Self::Rejected { .. } => "rejected",
            Self::CheckFailed => "check_failed",
            Self::DeleteFailed => "delete_failed",
        }
    }

    /// Eligible subscribers, whatever happened to the delete
    #[must_use]
    pub const fn is_processed(&self) -> bool {
        matches!(
            self,
            Self::Listed | Self::Deleted | Self::Rejected { .. } | Self::DeleteFailed
        )
    }
}

/// Counters of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidates returned by the query
    pub examined: usize,
    /// Candidates that reached the delete decision
    pub processed: usize,
    pub deleted: usize,
    /// Excluded because of provisioning records
    pub retained: usize,
    /// Lookups or deletes that did not go through
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: Outcome) {
        if outcome.is_processed() {
            self.processed += 1;
        }

        match outcome {
            Outcome::Deleted => self.deleted += 1,
            Outcome::Retained { .. } => self.retained += 1,
            Outcome::Rejected { .. } | Outcome::CheckFailed | Outcome::DeleteFailed => {
                self.failed += 1;
            }
            Outcome::Listed => {}
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} subscriber(s) processed, {} deleted",
            self.processed, self.deleted
        )
    }
}

/// Run the cleanup
///
/// `deleter` is `None` for a dry run: eligible subscribers are reported and
/// no delete request is ever made. With `non_pr` set, subscribers with at
/// least one provisioning record are skipped.
///
/// # Errors
///
/// Returns [`CleanupError::Query`] if the subscriber query fails. Failures of
/// single subscribers are counted in the summary instead.
pub async fn run(
    store: &dyn SubscriberStore,
    deleter: Option<&dyn SubscriberDeleter>,
    filter: &FilterPredicate,
    non_pr: bool,
) -> Result<RunSummary, CleanupError> {
    info!(query = %filter.to_document(), "Query subscribers");

    let subscribers = store
        .find_subscribers(filter)
        .await
        .map_err(CleanupError::Query)?;

    let mut summary = RunSummary {
        examined: subscribers.len(),
        ..RunSummary::default()
    };
    SUBSCRIBERS_FETCHED.inc_by(u64::try_from(summary.examined).unwrap_or(u64::MAX));
    debug!("Scanned {} subscribers", summary.examined);

    let mut pipelines: FuturesUnordered<_> = subscribers
        .into_iter()
        .map(|subscriber| process(subscriber, store, deleter, non_pr))
        .collect();

    while let Some(outcome) = pipelines.next().await {
        SUBSCRIBERS_TOTAL.with_label_values(&[outcome.label()]).inc();
        summary.record(outcome);
        debug!("Subscribers left: {}", pipelines.len());
    }

    Ok(summary)
}

async fn process(
    subscriber: Subscriber,
    store: &dyn SubscriberStore,
    deleter: Option<&dyn SubscriberDeleter>,
    non_pr: bool,
) -> Outcome {
    let id = &subscriber.id;

    if non_pr {
        match store.count_provisioning_records(id).await {
            Ok(0) => debug!(subscriber = %id, "Subscriber has no provisioning record"),
            Ok(records) => {
                debug!(subscriber = %id, records, "Subscriber has provisioning record");
                return Outcome::Retained { records };
            }
            Err(e) => {
                warn!(subscriber = %id, "Provisioning record lookup failed: {e:#}");
                return Outcome::CheckFailed;
            }
        }
    }

    println!("{}", subscriber.to_json());

    let Some(deleter) = deleter else {
        return Outcome::Listed;
    };

    match deleter.delete(id).await {
        Ok(DeleteOutcome::Deleted) => {
            println!("Deleted {id}");
            Outcome::Deleted
        }
        Ok(DeleteOutcome::Rejected(status)) => {
            warn!(subscriber = %id, status, "Subscriber not deleted");
            Outcome::Rejected { status }
        }
        Err(e) => {
            warn!(subscriber = %id, "Subscriber delete failed: {e:#}");
            Outcome::DeleteFailed
        }
    }
}

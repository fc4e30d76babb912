use super::Action;
use crate::{
    acs::{AcsClient, SubscriberDeleter},
    cleanup::{self, RunSummary},
    config::{Settings, redact_url},
    filter::CustomIdRule,
    metrics::{LAST_RUN_SUCCESS, LAST_RUN_TIMESTAMP, LAST_RUNTIME_MS, write_textfile},
    store::MongoStore,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Execute the action's business logic by delegating to the appropriate module
pub async fn execute(action: Action) -> anyhow::Result<()> {
    match action {
        Action::Cleanup { settings } => run_cleanup(settings).await,
    }
}

fn log_settings(settings: &Settings) {
    let filter = &settings.filter;
    let rule = filter.custom_id_rule();

    info!("Using MongoDB - {}", redact_url(&settings.mongo_url));
    info!("Database name - {}", settings.db_name);
    info!("Organization ID - {}", filter.org_id());
    info!("Delete subscriber - {}", settings.delete_enabled());
    info!(
        "ACS URL - {}",
        settings
            .acs_url
            .as_ref()
            .map_or_else(|| "none".to_string(), ToString::to_string)
    );
    info!(
        "Rule: Subscriber created before the last date - {}",
        filter
            .cutoff()
            .as_ref()
            .map_or_else(|| "none".to_string(), DateTime::to_rfc3339)
    );
    info!(
        "Rule: Subscriber customId pattern - {}",
        rule.map_or("none", CustomIdRule::pattern)
    );
    info!(
        "Rule: Subscriber pattern is for {} customId",
        rule.map(CustomIdRule::polarity).unwrap_or_default()
    );
    info!("Rule: Subscriber has no device - {}", filter.no_devices());
    info!(
        "Rule: Subscriber has no provisioning record - {}",
        settings.non_pr
    );
}

fn report(summary: &RunSummary) {
    println!("--------------------------------------------------");
    println!("{summary}");

    info!(
        examined = summary.examined,
        processed = summary.processed,
        deleted = summary.deleted,
        retained = summary.retained,
        failed = summary.failed,
        "Cleanup finished"
    );
}

async fn run_cleanup(settings: Settings) -> anyhow::Result<()> {
    log_settings(&settings);

    let start = Utc::now();
    let result = cleanup_once(&settings).await;

    let end = Utc::now();
    LAST_RUN_TIMESTAMP.set(end.timestamp());
    LAST_RUNTIME_MS.set(end.signed_duration_since(start).num_milliseconds());
    LAST_RUN_SUCCESS.set(i64::from(result.is_ok()));

    // a failed run is exported too, before the error reaches the caller
    if let Some(path) = &settings.metrics_file
        && let Err(e) = write_textfile(path).await
    {
        warn!("Failed to write metrics to {}: {e:#}", path.display());
    }

    report(&result?);

    Ok(())
}

async fn cleanup_once(settings: &Settings) -> anyhow::Result<RunSummary> {
    let store = MongoStore::connect(
        &settings.mongo_url,
        &settings.db_name,
        &settings.subscribers_collection,
        &settings.provisioning_collection,
    )
    .await?;

    // only built when deleting, a dry run never talks to ACS
    let acs = settings.acs_url.clone().map(AcsClient::new).transpose()?;
    let deleter = acs.as_ref().map(|acs| acs as &dyn SubscriberDeleter);

    Ok(cleanup::run(&store, deleter, &settings.filter, settings.non_pr).await?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::{error::CleanupError, filter::FilterPredicate};

    #[tokio::test]
    async fn test_failed_run_writes_metrics() {
        let path = std::env::temp_dir().join(format!("subclean-failed-{}.prom", std::process::id()));
        let settings = Settings {
            mongo_url: "postgres://localhost/sxa".into(),
            db_name: "sxa".into(),
            subscribers_collection: "sxa-subscribers".into(),
            provisioning_collection: "sxacc-provisioning-records".into(),
            acs_url: None,
            filter: FilterPredicate::new("A"),
            non_pr: false,
            metrics_file: Some(path.clone()),
        };

        let err = run_cleanup(settings).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CleanupError>(),
            Some(CleanupError::Connect(_))
        ));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("subclean_last_run_success 0"));
        assert!(content.contains("subclean_last_run_timestamp_seconds"));

        std::fs::remove_file(&path).unwrap();
    }
}

use crate::{
    cli::actions::Action,
    config::{
        ACS_URL_NONE, DEFAULT_DB_NAME, DEFAULT_PROVISIONING_COLLECTION,
        DEFAULT_SUBSCRIBERS_COLLECTION, Polarity, Settings, parse_cutoff,
    },
    error::CleanupError,
    filter::{CustomIdRule, FilterPredicate},
};
use anyhow::Result;
use clap::ArgMatches;
use reqwest::Url;
use std::path::PathBuf;

fn config_error(message: impl Into<String>) -> CleanupError {
    CleanupError::Config(message.into())
}

fn string_or(matches: &ArgMatches, id: &str, default: &str) -> String {
    matches
        .get_one::<String>(id)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Parse `--acs-url`, `none` means no ACS
fn parse_acs_url(value: Option<&str>) -> Result<Option<Url>, CleanupError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty() && *v != ACS_URL_NONE) else {
        return Ok(None);
    };

    let url = Url::parse(value).map_err(|e| config_error(format!("Invalid ACS URL {value}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(config_error(format!(
            "Invalid ACS URL {value}: expected http(s)://<host>[:port]"
        )));
    }

    Ok(Some(url))
}

/// Build the selection rules from the rule flags
fn extract_filter(matches: &ArgMatches, org_id: &str) -> Result<FilterPredicate, CleanupError> {
    let mut filter = FilterPredicate::new(org_id);

    if let Some(last_date) = matches.get_one::<String>("last-date") {
        filter = filter.created_before(parse_cutoff(last_date).map_err(config_error)?);
    }

    if let Some(pattern) = matches.get_one::<String>("pattern") {
        let polarity = matches
            .get_one::<String>("polarity")
            .map(|p| p.parse::<Polarity>())
            .transpose()
            .map_err(config_error)?
            .unwrap_or_default();

        let rule = CustomIdRule::new(pattern, polarity)
            .map_err(|e| config_error(format!("Invalid pattern {pattern}: {e}")))?;
        filter = filter.custom_id(rule);
    }

    Ok(filter.without_devices(matches.get_flag("non-device")))
}

/// Convert `ArgMatches` into typed Action enum with validation
///
/// Every configuration problem is reported here, before any connection is
/// attempted.
///
/// # Errors
///
/// Returns [`CleanupError::Config`] if a required value is missing or a
/// value cannot be parsed
pub fn dispatch(matches: &ArgMatches) -> Result<Action> {
    let mongo_url = matches
        .get_one::<String>("mongo-url")
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| config_error("Missing Mongo URL"))?
        .clone();

    // matched literally against `orgId`, only a blank value is refused
    let org_id = matches
        .get_one::<String>("org-id")
        .map(String::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| config_error("Missing Organization ID"))?;

    let acs_url = parse_acs_url(matches.get_one::<String>("acs-url").map(String::as_str))?;

    // deleting needs somewhere to send the requests to
    let acs_url = if matches.get_flag("delete") {
        Some(acs_url.ok_or_else(|| config_error("Missing ACS URL"))?)
    } else {
        None
    };

    let filter = extract_filter(matches, org_id)?;

    Ok(Action::Cleanup {
        settings: Settings {
            mongo_url,
            db_name: string_or(matches, "db-name", DEFAULT_DB_NAME),
            subscribers_collection: string_or(
                matches,
                "subscribers-collection",
                DEFAULT_SUBSCRIBERS_COLLECTION,
            ),
            provisioning_collection: string_or(
                matches,
                "provisioning-collection",
                DEFAULT_PROVISIONING_COLLECTION,
            ),
            acs_url,
            filter,
            non_pr: matches.get_flag("non-pr"),
            metrics_file: matches.get_one::<String>("metrics-file").map(PathBuf::from),
        },
    })
}

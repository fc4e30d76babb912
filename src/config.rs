use crate::filter::FilterPredicate;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Url;
use std::{fmt, path::PathBuf, str::FromStr};

pub const DEFAULT_DB_NAME: &str = "sxa";
pub const DEFAULT_SUBSCRIBERS_COLLECTION: &str = "sxa-subscribers";
pub const DEFAULT_PROVISIONING_COLLECTION: &str = "sxacc-provisioning-records";

/// Placeholder accepted for `--acs-url` meaning "no ACS configured"
pub const ACS_URL_NONE: &str = "none";

/// Everything a cleanup run needs, validated and typed
#[derive(Debug, Clone)]
pub struct Settings {
    pub mongo_url: String,
    pub db_name: String,
    pub subscribers_collection: String,
    pub provisioning_collection: String,
    /// `Some` only when deletion is enabled
    pub acs_url: Option<Url>,
    pub filter: FilterPredicate,
    pub non_pr: bool,
    pub metrics_file: Option<PathBuf>,
}

impl Settings {
    #[must_use]
    pub const fn delete_enabled(&self) -> bool {
        self.acs_url.is_some()
    }
}

/// What the `--pattern` describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Pattern describes well-formed custom ids; select the ones not containing it
    #[default]
    Valid,
    /// Pattern describes broken custom ids; select the ones matching it entirely
    Invalid,
}

impl FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            _ => Err(format!("Invalid polarity: {s}")),
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Parse the `--last-date` cutoff
///
/// Accepts RFC 3339 (`2018-06-01T00:00:00Z`), a date-time without offset
/// (taken as UTC) or a bare date (midnight UTC).
///
/// # Errors
///
/// Returns an error if the value is none of the accepted forms
pub fn parse_cutoff(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("Invalid last date (expected ISO 8601): {value}"))
}

/// Hide credentials in a connection URL before it is logged
#[must_use]
pub fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_string();
    };
    let rest = url.get(scheme_end..).unwrap_or_default();
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest.get(..authority_end).and_then(|authority| authority.rfind('@')) {
        Some(at) => format!(
            "{}***{}",
            url.get(..scheme_end).unwrap_or_default(),
            rest.get(at..).unwrap_or_default()
        ),
        None => url.to_string(),
    }
}

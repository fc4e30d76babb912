//! Subscriber selection rules
//!
//! A [`FilterPredicate`] is built once from the command line and rendered into
//! the `MongoDB` filter sent with the subscriber query. The same rules can be
//! evaluated locally against a raw document with [`FilterPredicate::matches`].

use crate::config::Polarity;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, Bson, Document, doc};
use regex::Regex;

/// Custom id pattern together with its polarity
#[derive(Debug, Clone)]
pub struct CustomIdRule {
    pattern: String,
    polarity: Polarity,
    matcher: Regex,
}

impl CustomIdRule {
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression
    pub fn new(pattern: &str, polarity: Polarity) -> Result<Self, regex::Error> {
        let matcher = match polarity {
            Polarity::Valid => Regex::new(pattern)?,
            Polarity::Invalid => Regex::new(&format!("^{pattern}$"))?,
        };

        Ok(Self {
            pattern: pattern.to_string(),
            polarity,
            matcher,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Regular expression sent to the database
    ///
    /// `Valid` becomes a tempered negative lookahead: every character must
    /// not start a match of the pattern.
    #[must_use]
    pub fn query_pattern(&self) -> String {
        match self.polarity {
            Polarity::Valid => format!("^((?!{}).)*$", self.pattern),
            Polarity::Invalid => format!("^{}$", self.pattern),
        }
    }

    /// Whether a custom id is selected by this rule
    #[must_use]
    pub fn matches(&self, custom_id: &str) -> bool {
        match self.polarity {
            // `.` in the query pattern stops at newlines, and a match starting
            // at the very end is never probed by the lookahead.
            Polarity::Valid => {
                !custom_id.contains('\n')
                    && self
                        .matcher
                        .find(custom_id)
                        .is_none_or(|m| m.start() >= custom_id.len())
            }
            Polarity::Invalid => self.matcher.is_match(custom_id),
        }
    }
}

/// Conjunction of the subscriber selection rules
#[derive(Debug, Clone)]
pub struct FilterPredicate {
    org_id: String,
    created_before: Option<DateTime<Utc>>,
    custom_id: Option<CustomIdRule>,
    no_devices: bool,
}

impl FilterPredicate {
    #[must_use]
    pub fn new(org_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            created_before: None,
            custom_id: None,
            no_devices: false,
        }
    }

    /// Only subscribers created strictly before `cutoff`
    #[must_use]
    pub const fn created_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.created_before = Some(cutoff);
        self
    }

    #[must_use]
    pub fn custom_id(mut self, rule: CustomIdRule) -> Self {
        self.custom_id = Some(rule);
        self
    }

    /// Only subscribers with a missing or empty device list
    #[must_use]
    pub const fn without_devices(mut self, enabled: bool) -> Self {
        self.no_devices = enabled;
        self
    }

    #[must_use]
    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    #[must_use]
    pub const fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.created_before
    }

    #[must_use]
    pub const fn custom_id_rule(&self) -> Option<&CustomIdRule> {
        self.custom_id.as_ref()
    }

    #[must_use]
    pub const fn no_devices(&self) -> bool {
        self.no_devices
    }

    /// Render the predicate as a `MongoDB` query filter
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut filter = doc! { "orgId": self.org_id.as_str() };

        if let Some(cutoff) = self.created_before {
            filter.insert(
                "createTime",
                doc! { "$lt": bson::DateTime::from_millis(cutoff.timestamp_millis()) },
            );
        }

        if let Some(rule) = &self.custom_id {
            filter.insert(
                "customId",
                Bson::RegularExpression(bson::Regex {
                    pattern: rule.query_pattern(),
                    options: String::new(),
                }),
            );
        }

        if self.no_devices {
            filter.insert(
                "$or",
                vec![
                    doc! { "locations.devices": { "$exists": false } },
                    doc! { "locations.devices": { "$size": 0 } },
                ],
            );
        }

        filter
    }

    /// Evaluate the predicate against a raw subscriber document
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        if document.get_str("orgId").ok() != Some(self.org_id.as_str()) {
            return false;
        }

        if let Some(cutoff) = self.created_before
            && !document
                .get_datetime("createTime")
                .is_ok_and(|created| created.timestamp_millis() < cutoff.timestamp_millis())
        {
            return false;
        }

        if let Some(rule) = &self.custom_id
            && !document
                .get_str("customId")
                .is_ok_and(|custom_id| rule.matches(custom_id))
        {
            return false;
        }

        !self.no_devices || has_no_devices(document)
    }
}

// `locations` may be a single sub-document or an array of them, like the
// dotted path `locations.devices` resolves on the server.
fn has_no_devices(document: &Document) -> bool {
    match document.get("locations") {
        Some(Bson::Document(location)) => location.get("devices").is_none_or(is_empty_array),
        Some(Bson::Array(locations)) => {
            let mut devices = locations
                .iter()
                .filter_map(Bson::as_document)
                .filter_map(|location| location.get("devices"))
                .peekable();
            devices.peek().is_none() || devices.any(is_empty_array)
        }
        _ => true,
    }
}

fn is_empty_array(value: &Bson) -> bool {
    matches!(value, Bson::Array(items) if items.is_empty())
}

mod run;

use crate::config::Settings;

/// Action enum representing each possible command
#[derive(Debug)]
pub enum Action {
    Cleanup { settings: Settings },
}

impl Action {
    /// Execute the action
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails to execute
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::filter::FilterPredicate;

    #[test]
    fn test_action_debug() {
        let action = Action::Cleanup {
            settings: Settings {
                mongo_url: "mongodb://localhost:27017".into(),
                db_name: "sxa".into(),
                subscribers_collection: "sxa-subscribers".into(),
                provisioning_collection: "sxacc-provisioning-records".into(),
                acs_url: None,
                filter: FilterPredicate::new("A"),
                non_pr: false,
                metrics_file: None,
            },
        };

        let debug_str = format!("{action:?}");
        assert!(debug_str.contains("Cleanup"));
        assert!(debug_str.contains("sxa-subscribers"));
    }
}

use crate::config::{
    ACS_URL_NONE, DEFAULT_DB_NAME, DEFAULT_PROVISIONING_COLLECTION,
    DEFAULT_SUBSCRIBERS_COLLECTION,
};
use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

/// Pure clap command definitions with zero business logic
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("mongo-url")
                .env("SUBCLEAN_MONGO_URL")
                .help("MongoDB connection URL, e.g. mongodb://localhost:27017")
                .long("mongo-url")
                .short('m')
                .value_name("URL")
                .required(true),
        )
        .arg(
            Arg::new("db-name")
                .default_value(DEFAULT_DB_NAME)
                .env("SUBCLEAN_DB_NAME")
                .help("Database name")
                .long("db-name")
                .short('d')
                .value_name("NAME"),
        )
        .arg(
            Arg::new("delete")
                .action(ArgAction::SetTrue)
                .env("SUBCLEAN_DELETE")
                .help("Delete the matching subscribers through ACS")
                .long("delete")
                .long_help(
                    "Delete the matching subscribers through ACS.\n\
                    Without this flag the run only lists the subscribers that would be deleted.\n\
                    Requires --acs-url.",
                )
                .short('e'),
        )
        .arg(
            Arg::new("acs-url")
                .default_value(ACS_URL_NONE)
                .env("SUBCLEAN_ACS_URL")
                .help("ACS URL, e.g. http://gcs:8081")
                .long("acs-url")
                .short('a')
                .value_name("URL"),
        )
        .arg(
            Arg::new("org-id")
                .env("SUBCLEAN_ORG_ID")
                .help("Organization ID")
                .long("org-id")
                .short('o')
                .value_name("ID")
                .required(true),
        )
        .arg(
            Arg::new("last-date")
                .env("SUBCLEAN_LAST_DATE")
                .help("Rule: the subscriber was created before this date (ISO 8601), e.g. 2018-06-01T00:00:00Z")
                .long("last-date")
                .short('t')
                .value_name("DATE"),
        )
        .arg(
            Arg::new("pattern")
                .env("SUBCLEAN_PATTERN")
                .help("Rule: regular expression for the customId of the subscriber, e.g. .*:.*")
                .long("pattern")
                .long_help(
                    "Rule: regular expression for the customId of the subscriber, e.g. .*:.*\n\n\
                    With --polarity valid (default) the pattern describes well-formed ids and\n\
                    subscribers whose customId does not contain it are selected.\n\
                    With --polarity invalid the pattern describes broken ids and subscribers\n\
                    whose whole customId matches it are selected.",
                )
                .short('p')
                .value_name("PATTERN"),
        )
        .arg(
            Arg::new("polarity")
                .default_value("valid")
                .env("SUBCLEAN_POLARITY")
                .help("Whether --pattern describes valid or invalid customIds")
                .long("polarity")
                .short('l')
                .value_name("POLARITY")
                .value_parser(["valid", "invalid"]),
        )
        .arg(
            Arg::new("non-device")
                .action(ArgAction::SetTrue)
                .env("SUBCLEAN_NON_DEVICE")
                .help("Rule: the subscriber has no device")
                .long("non-device")
                .short('n'),
        )
        .arg(
            Arg::new("non-pr")
                .action(ArgAction::SetTrue)
                .env("SUBCLEAN_NON_PR")
                .help("Rule: the subscriber has no provisioning record")
                .long("non-pr")
                .short('r'),
        )
        .arg(
            Arg::new("subscribers-collection")
                .default_value(DEFAULT_SUBSCRIBERS_COLLECTION)
                .env("SUBCLEAN_SUBSCRIBERS_COLLECTION")
                .help("Collection holding the subscribers")
                .long("subscribers-collection")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("provisioning-collection")
                .default_value(DEFAULT_PROVISIONING_COLLECTION)
                .env("SUBCLEAN_PROVISIONING_COLLECTION")
                .help("Collection holding the provisioning records")
                .long("provisioning-collection")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("metrics-file")
                .env("SUBCLEAN_METRICS_FILE")
                .help("Write prometheus metrics to this file when the run ends")
                .long("metrics-file")
                .long_help(
                    "Write prometheus metrics in text format to this file when the run ends,\n\
                    for the node-exporter textfile collector.\n\n\
                    Example: /var/lib/node_exporter/textfile/subclean.prom",
                )
                .value_name("PATH"),
        )
        .arg(
            Arg::new("debug")
                .action(ArgAction::SetTrue)
                .env("SUBCLEAN_DEBUG")
                .help("Print debug logs")
                .long("debug"),
        )
}

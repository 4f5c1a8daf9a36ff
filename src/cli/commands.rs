use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::attack;
use crate::config::SuiteConfig;
use crate::fixtures;
use crate::tags::{FilteredNode, TagFilter};

/// Command-line interface for the BFD high volume load test
#[derive(Parser)]
#[command(name = "bfd-high-volume")]
#[command(about = "High volume FHIR load test for BFD", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load fixtures and run the load test
    Run(RunArgs),
    /// Print the groups and tasks a tag selection would run
    ListTasks(TagArgs),
}

/// Task selection by tag
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TagArgs {
    /// Space separated tags; only tasks carrying at least one of them run
    #[arg(long = "locust-tags", env = "BFD_LOCUST_TAGS")]
    pub tags: Option<String>,

    /// Space separated tags; tasks carrying any of them never run
    #[arg(long = "locust-exclude-tags", env = "BFD_LOCUST_EXCLUDE_TAGS")]
    pub exclude_tags: Option<String>,
}

impl TagArgs {
    pub fn filter(&self) -> TagFilter {
        TagFilter::from_strs(
            self.tags.as_deref().unwrap_or_default(),
            self.exclude_tags.as_deref().unwrap_or_default(),
        )
    }
}

/// Flags for `run`. Anything left unset keeps the config file's value.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// YAML file with suite settings
    #[arg(short, long, env = "BFD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the BFD server, e.g. https://test.bfd.cms.gov
    #[arg(long, env = "BFD_HOST")]
    pub host: Option<String>,

    /// Number of concurrent users
    #[arg(short, long, env = "BFD_USERS")]
    pub users: Option<usize>,

    /// Users started per second
    #[arg(short = 'r', long, env = "BFD_HATCH_RATE")]
    pub hatch_rate: Option<f32>,

    /// Stop after this many seconds
    #[arg(short = 't', long, env = "BFD_RUN_TIME")]
    pub run_time: Option<u64>,

    /// Write an HTML report here when the run ends
    #[arg(long, env = "BFD_REPORT_FILE")]
    pub report_file: Option<PathBuf>,

    /// Postgres URI to sample fixture data from
    #[arg(long, env = "BFD_DATABASE_URI", conflicts_with = "fixture_file")]
    pub database_uri: Option<String>,

    /// JSON or YAML file holding fixture data
    #[arg(long, env = "BFD_FIXTURE_FILE")]
    pub fixture_file: Option<PathBuf>,

    /// Percentage of each table to sample (0, 100]; 100 reads whole tables
    #[arg(long, env = "BFD_TABLE_SAMPLE_PERCENT")]
    pub table_sample_percent: Option<f32>,

    /// Maximum rows per fixture list; 0 means no limit
    #[arg(long, env = "BFD_DATA_LIMIT")]
    pub data_limit: Option<i64>,

    /// PEM file with the client certificate and private key
    #[arg(long, env = "BFD_CLIENT_CERT")]
    pub client_cert: Option<PathBuf>,

    /// Verify the server's TLS certificate (`--verify-tls false` to turn off)
    #[arg(long, env = "BFD_VERIFY_TLS", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub verify_tls: Option<bool>,

    /// Per-request timeout in seconds
    #[arg(long, env = "BFD_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Date for `_lastUpdated=gt<date>` searches
    #[arg(long, env = "BFD_LAST_UPDATED")]
    pub last_updated: Option<String>,

    /// Retire a task once its fixture data runs out instead of recycling it;
    /// the run ends when every task has
    #[arg(long, env = "BFD_END_ON_NO_DATA", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub end_on_no_data: Option<bool>,

    #[command(flatten)]
    pub tags: TagArgs,
}

impl RunArgs {
    /// Layer the flags over the config file (or the defaults).
    pub fn resolve(&self) -> anyhow::Result<SuiteConfig> {
        let mut config = match &self.config {
            Some(path) => SuiteConfig::from_file(path)?,
            None => SuiteConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = Some(host.clone());
        }
        if let Some(users) = self.users {
            config.users = users;
        }
        if let Some(rate) = self.hatch_rate {
            config.hatch_rate = rate;
        }
        if let Some(secs) = self.run_time {
            config.run_time = Some(secs);
        }
        if let Some(report) = &self.report_file {
            config.report_file = Some(report.clone());
        }
        // a data source on the command line replaces the file's, whichever kind it was
        if let Some(uri) = &self.database_uri {
            config.database_uri = Some(uri.clone());
            config.fixture_file = None;
        }
        if let Some(path) = &self.fixture_file {
            config.fixture_file = Some(path.clone());
            config.database_uri = None;
        }
        if let Some(pct) = self.table_sample_percent {
            config.table_sample_percent = Some(pct);
        }
        if let Some(limit) = self.data_limit {
            config.data_limit = Some(limit);
        }
        if let Some(cert) = &self.client_cert {
            config.client_cert = Some(cert.clone());
        }
        if let Some(verify) = self.verify_tls {
            config.verify_tls = verify;
        }
        if let Some(secs) = self.request_timeout {
            config.request_timeout_secs = secs;
        }
        if let Some(date) = &self.last_updated {
            config.last_updated = date.clone();
        }
        if let Some(end) = self.end_on_no_data {
            config.end_on_no_data = end;
        }
        if let Some(tags) = &self.tags.tags {
            config.tags = tags.clone();
        }
        if let Some(tags) = &self.tags.exclude_tags {
            config.exclude_tags = tags.clone();
        }
        Ok(config)
    }
}

/// Execute the parsed command.
///
/// # Errors
///
/// Returns an error if:
/// - the configuration is incomplete or invalid
/// - the tag selection matches no task
/// - fixture data cannot be loaded
/// - goose fails to start or run the attack
pub async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let config = args.resolve()?;
            config.validate()?;
            let selected = attack::select_tasks(&config.tag_filter())?;
            let fixtures = fixtures::load(&config).await?;
            attack::run(&config, &selected, fixtures).await
        }
        Commands::ListTasks(args) => {
            let selected = attack::select_tasks(&args.filter())?;
            write_task_list(&mut io::stdout().lock(), &selected)?;
            Ok(())
        }
    }
}

/// One line per group followed by its tasks, indented.
pub fn write_task_list<W: Write>(out: &mut W, selected: &[FilteredNode<'_>]) -> io::Result<()> {
    for node in selected {
        if let FilteredNode::Group { group, .. } = node {
            writeln!(out, "{} [{}]", group.name, group.tags.join(" "))?;
        }
        for task in node.tasks() {
            writeln!(out, "  {:<60} {}", task.name, task.request_name)?;
        }
    }
    Ok(())
}

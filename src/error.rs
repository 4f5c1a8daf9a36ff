use std::fmt;

use crate::fixtures::FixtureKind;

/// Errors raised while handing fixture data to a request template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureError {
    /// The user's private copy of a fixture list has no items left.
    ///
    /// Only returned when the pool is configured to stop on exhaustion, or
    /// when the master list itself is empty.
    Exhausted(FixtureKind),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::Exhausted(kind) => {
                write!(f, "no {kind} fixture data left for this user")
            }
        }
    }
}

impl std::error::Error for FixtureError {}

/// Errors raised while resolving the suite configuration.
///
/// Returned by [`crate::config::SuiteConfig::validate`] before any fixture
/// is loaded or any request is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No target host was given on the command line, env, or config file.
    MissingHost,
    /// Neither `database_uri` nor `fixture_file` is set.
    NoDataSource,
    /// Both `database_uri` and `fixture_file` are set.
    ConflictingDataSources,
    /// `table_sample_percent` outside of `(0, 100]`.
    InvalidSamplePercent(f32),
    /// `users` was zero.
    NoUsers,
    /// `hatch_rate` was zero, negative or not a number.
    InvalidHatchRate(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingHost => write!(
                f,
                "no target host configured (use --host, BFD_HOST or `host:` in the config file)"
            ),
            ConfigError::NoDataSource => write!(
                f,
                "no fixture source configured: set either --database-uri or --fixture-file"
            ),
            ConfigError::ConflictingDataSources => write!(
                f,
                "--database-uri and --fixture-file are mutually exclusive"
            ),
            ConfigError::InvalidSamplePercent(pct) => write!(
                f,
                "table sample percent must be in (0, 100], got {pct}"
            ),
            ConfigError::NoUsers => write!(f, "at least one user is required"),
            ConfigError::InvalidHatchRate(rate) => {
                write!(f, "hatch rate must be greater than zero, got {rate}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_names_the_data_type() {
        let err = FixtureError::Exhausted(FixtureKind::HashedMbis);
        assert_eq!(err.to_string(), "no hashed_mbis fixture data left for this user");
    }

    #[test]
    fn test_config_error_messages() {
        assert!(ConfigError::MissingHost.to_string().contains("--host"));
        assert!(ConfigError::InvalidSamplePercent(120.0)
            .to_string()
            .contains("120"));
    }
}

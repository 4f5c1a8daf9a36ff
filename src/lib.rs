//! # bfd-high-volume
//!
//! A high volume load test for the BFD FHIR server, driven by
//! [goose](https://docs.rs/goose).
//!
//! ## Overview
//!
//! The suite hammers the read paths BFD consumers use most:
//! ExplanationOfBenefit, Coverage and Patient searches, in both the v1 (STU3)
//! and v2 (R4) APIs. Each request is built from real identifiers sampled from
//! the BFD database (or read from a fixture file), so the server does real
//! work for every call.
//!
//! ## Architecture
//!
//! - **[`config`]** - layered suite configuration (defaults, YAML, flags/env)
//! - **[`fixtures`]** - fixture sources and per-user shuffled pools
//! - **[`tasks`]** - the catalogue of request templates, grouped and tagged
//! - **[`tags`]** - include/exclude tag filtering over the catalogue
//! - **[`request`]** - request descriptions and URL/Bundle helpers
//! - **[`user`]** - per virtual user session data
//! - **[`attack`]** - wiring the filtered catalogue into goose scenarios
//! - **[`cli`]** - the `run` and `list-tasks` commands
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Run flow
//!
//! ```text
//! cli::run_cli
//!   ├─ RunArgs::resolve        defaults < YAML < flags/env
//!   ├─ SuiteConfig::validate
//!   ├─ attack::select_tasks    tag filter over tasks::CATALOG
//!   ├─ fixtures::load          database or file, sampled
//!   └─ attack::run             one goose Scenario per group
//!        on_start    UserData::new  (shuffled private pools)
//!        per task    template -> GET -> optional next page
//! ```
//!
//! ## Selecting tasks
//!
//! Every task carries its own name and `v1` or `v2` as tags, and inherits its
//! group's tag (`eob`, `coverage`, `patient`):
//!
//! ```bash
//! # all v2 Patient searches
//! bfd-high-volume run --locust-tags patient --locust-exclude-tags v1 ...
//! ```

pub mod attack;
pub mod cli;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod logging;
pub mod request;
pub mod tags;
pub mod tasks;
pub mod user;

pub use config::SuiteConfig;
pub use error::{ConfigError, FixtureError};
pub use fixtures::{Fixtures, FixturePool};
pub use request::{create_url_path, next_page_url, RequestSpec};
pub use tags::{filter_tasks, TagFilter};
pub use tasks::{TaskDef, TaskGroup, TaskNode, CATALOG};
pub use user::{UserData, UserSettings};

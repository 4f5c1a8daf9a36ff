//! # CLI Module
//!
//! Command-line entry points for the load test.
//!
//! ## Commands
//!
//! ### `run`
//!
//! Load fixtures and run the selected tasks against a BFD server:
//!
//! ```bash
//! bfd-high-volume run \
//!     --host https://test.bfd.cms.gov \
//!     --database-uri postgres://bfd@db.local/fhirdb \
//!     --client-cert /etc/bfd/test-client.pem \
//!     --users 100 --hatch-rate 10 --run-time 600 \
//!     --locust-tags "eob patient" --locust-exclude-tags v1
//! ```
//!
//! Every flag can also come from a `BFD_*` environment variable
//! (`BFD_HOST`, `BFD_USERS`, `BFD_LOCUST_TAGS`, ...) or from the YAML file
//! given with `--config`; flags win over both.
//!
//! ### `list-tasks`
//!
//! Show what a tag selection would run without sending anything:
//!
//! ```bash
//! bfd-high-volume list-tasks --locust-tags coverage
//! ```

mod commands;


pub use commands::{run_cli, write_task_list, Cli, Commands, RunArgs, TagArgs};

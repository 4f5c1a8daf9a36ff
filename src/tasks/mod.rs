//! # Task Catalogue
//!
//! The request templates the suite can run, grouped by FHIR resource.
//!
//! ## Structure
//!
//! ```text
//! CATALOG
//! ├── eob       (tag: eob)       ExplanationOfBenefit, v1 + v2
//! ├── coverage  (tag: coverage)  Coverage, v1 + v2
//! └── patient   (tag: patient)   Patient, v1 + v2
//! ```
//!
//! Each task is tagged with its own name and with `v1` or `v2`; the group tag
//! is inherited by every task in the group (see [`crate::tags`]).
//!
//! A task's `template` pops whatever fixture data it needs from the user's
//! [`UserData`] and returns the [`RequestSpec`] to send. Templates are plain
//! functions, so the catalogue can be checked without a server.

mod coverage;
mod eob;
mod patient;

use std::fmt;

use crate::error::FixtureError;
use crate::request::RequestSpec;
use crate::user::UserData;

pub use coverage::COVERAGE_TASKS;
pub use eob::EOB_TASKS;
pub use patient::PATIENT_TASKS;

pub const EOB_TAG: &str = "eob";
pub const COVERAGE_TAG: &str = "coverage";
pub const PATIENT_TAG: &str = "patient";

/// Builds a request from the user's fixture data.
pub type RequestTemplate = fn(&mut UserData) -> Result<RequestSpec, FixtureError>;

/// One request scenario.
#[derive(Clone, Copy)]
pub struct TaskDef {
    /// Unique identifier; also one of the task's tags
    pub name: &'static str,
    /// Name requests are aggregated under in the goose report
    pub request_name: &'static str,
    /// One-line description
    pub summary: &'static str,
    pub tags: &'static [&'static str],
    pub template: RequestTemplate,
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDef")
            .field("name", &self.name)
            .field("request_name", &self.request_name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl TaskDef {
    pub fn build_request(&self, data: &mut UserData) -> Result<RequestSpec, FixtureError> {
        (self.template)(data)
    }
}

/// A named group of tasks (or nested groups) sharing tags.
#[derive(Debug, Clone, Copy)]
pub struct TaskGroup {
    pub name: &'static str,
    /// Inherited by every descendant task
    pub tags: &'static [&'static str],
    pub children: &'static [TaskNode],
}

#[derive(Debug, Clone, Copy)]
pub enum TaskNode {
    Task(TaskDef),
    Group(TaskGroup),
}

/// Every group the suite knows about, in registration order.
pub static CATALOG: &[TaskNode] = &[
    TaskNode::Group(TaskGroup {
        name: EOB_TAG,
        tags: &[EOB_TAG],
        children: EOB_TASKS,
    }),
    TaskNode::Group(TaskGroup {
        name: COVERAGE_TAG,
        tags: &[COVERAGE_TAG],
        children: COVERAGE_TASKS,
    }),
    TaskNode::Group(TaskGroup {
        name: PATIENT_TAG,
        tags: &[PATIENT_TAG],
        children: PATIENT_TASKS,
    }),
];

/// Look a task up by name anywhere in `nodes`.
pub fn find_task<'a>(nodes: &'a [TaskNode], name: &str) -> Option<&'a TaskDef> {
    nodes.iter().find_map(|node| match node {
        TaskNode::Task(task) if task.name == name => Some(task),
        TaskNode::Task(_) => None,
        TaskNode::Group(group) => find_task(group.children, name),
    })
}

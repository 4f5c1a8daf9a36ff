//! # Tag Filtering
//!
//! Select which tasks run from `--locust-tags` / `--locust-exclude-tags`.
//!
//! Tags are plain labels. A group's tags apply to every task beneath it, so
//! `--locust-tags eob` selects every ExplanationOfBenefit task and
//! `--locust-tags eob --locust-exclude-tags v1` narrows that to the v2 ones.
//!
//! ## Rules
//!
//! For a task with effective tags `T` (its own plus all ancestors'):
//!
//! - include set non-empty: `T ∩ include` must be non-empty
//! - exclude set non-empty: `T ∩ exclude` must be empty
//! - both empty: every task passes
//!
//! A group survives when at least one task below it survives.

use std::collections::BTreeSet;

use crate::tasks::{TaskDef, TaskGroup, TaskNode};

/// A set of tag labels.
pub type TagSet = BTreeSet<String>;

/// Parse a space-separated tag list (`"eob v2"`) into a [`TagSet`].
pub fn parse_tags(raw: &str) -> TagSet {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Include/exclude tag selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub include: TagSet,
    pub exclude: TagSet,
}

impl TagFilter {
    pub fn new(include: TagSet, exclude: TagSet) -> Self {
        Self { include, exclude }
    }

    /// Build from the raw space-separated CLI strings.
    pub fn from_strs(include: &str, exclude: &str) -> Self {
        Self::new(parse_tags(include), parse_tags(exclude))
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Whether a task carrying `tags` should run.
    pub fn accepts<'t, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'t str> + Clone,
    {
        if !self.include.is_empty() && !tags.clone().into_iter().any(|t| self.include.contains(t)) {
            return false;
        }
        if !self.exclude.is_empty() && tags.into_iter().any(|t| self.exclude.contains(t)) {
            return false;
        }
        true
    }
}

/// The pruned task tree that remains after filtering.
#[derive(Debug, Clone)]
pub enum FilteredNode<'a> {
    Task(&'a TaskDef),
    Group {
        group: &'a TaskGroup,
        children: Vec<FilteredNode<'a>>,
    },
}

impl<'a> FilteredNode<'a> {
    /// Retained tasks beneath (or at) this node, in catalogue order.
    pub fn tasks(&self) -> Vec<&'a TaskDef> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks(&self, out: &mut Vec<&'a TaskDef>) {
        match self {
            FilteredNode::Task(task) => out.push(*task),
            FilteredNode::Group { children, .. } => {
                for child in children {
                    child.collect_tasks(out);
                }
            }
        }
    }

    /// Name of the task or group.
    pub fn name(&self) -> &'static str {
        match self {
            FilteredNode::Task(task) => task.name,
            FilteredNode::Group { group, .. } => group.name,
        }
    }
}

/// Recursively drop every task (and every emptied group) the filter rejects.
pub fn filter_tasks<'a>(nodes: &'a [TaskNode], filter: &TagFilter) -> Vec<FilteredNode<'a>> {
    filter_with_inherited(nodes, filter, &[])
}

fn filter_with_inherited<'a>(
    nodes: &'a [TaskNode],
    filter: &TagFilter,
    inherited: &[&'static str],
) -> Vec<FilteredNode<'a>> {
    let mut kept = Vec::new();
    for node in nodes {
        match node {
            TaskNode::Task(task) => {
                let effective = inherited.iter().chain(task.tags.iter()).copied();
                if filter.accepts(effective) {
                    kept.push(FilteredNode::Task(task));
                }
            }
            TaskNode::Group(group) => {
                let mut scope = inherited.to_vec();
                scope.extend_from_slice(group.tags);
                let children = filter_with_inherited(group.children, filter, &scope);
                if !children.is_empty() {
                    kept.push(FilteredNode::Group { group, children });
                }
            }
        }
    }
    kept
}

/// Tags named by the filter that no task or group in `nodes` carries.
///
/// Usually a typo on the command line; the caller decides whether to warn.
pub fn unknown_tags(filter: &TagFilter, nodes: &[TaskNode]) -> Vec<String> {
    let mut known = BTreeSet::new();
    collect_known(nodes, &mut known);
    filter
        .include
        .iter()
        .chain(filter.exclude.iter())
        .filter(|t| !known.contains(t.as_str()))
        .cloned()
        .collect()
}

fn collect_known(nodes: &[TaskNode], known: &mut BTreeSet<&'static str>) {
    for node in nodes {
        match node {
            TaskNode::Task(task) => known.extend(task.tags.iter().copied()),
            TaskNode::Group(group) => {
                known.extend(group.tags.iter().copied());
                collect_known(group.children, known);
            }
        }
    }
}

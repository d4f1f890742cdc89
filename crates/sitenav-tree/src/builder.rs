//! Flat record list to hierarchy conversion.
//!
//! [`TreeBuilder`] groups records under their parents by fixed-point
//! iteration: each pass settles every record whose parent is the virtual root
//! or already settled, and defers the rest. Records whose parent never
//! settles are excluded instead of failing the build.
//!
//! # Termination
//!
//! A pass either settles or excludes at least one record, or the loop stops.
//! Well-formed input needs at most `depth + 1` passes.

use std::collections::{HashMap, HashSet};

use sitenav_source::{NodeId, NodeRecord};

use crate::node::TreeNode;

/// Why a record was left out of the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Parent id is not present anywhere in the input.
    MissingParent,
    /// Parent exists but never settled (cycle, or chain above a missing parent).
    Unreachable,
    /// Id already used by an earlier record.
    Duplicate,
}

impl ExclusionReason {
    /// Short lowercase label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingParent => "missing parent",
            Self::Unreachable => "unreachable",
            Self::Duplicate => "duplicate",
        }
    }
}

/// Record excluded from the hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct Exclusion {
    /// The excluded record.
    pub record: NodeRecord,
    /// Exclusion reason.
    pub reason: ExclusionReason,
}

/// Record whose place in the hierarchy is settled.
#[derive(Clone, Debug, PartialEq)]
pub struct SettledEntry {
    /// Source record.
    pub record: NodeRecord,
    /// Position in the input, used to break sort ties.
    pub index: usize,
    /// Child ids, ordered by sort key then input position.
    pub kids: Vec<NodeId>,
}

/// Output of a tree build.
#[derive(Debug, Default)]
pub struct TreeBuild {
    /// Settled records keyed by id.
    pub settled: HashMap<NodeId, SettledEntry>,
    /// Children of the virtual root, in sibling order.
    pub root_kids: Vec<NodeId>,
    /// Nodes with computed links in depth-first pre-order.
    pub nodes: Vec<TreeNode>,
    /// Records left out of the hierarchy.
    pub excluded: Vec<Exclusion>,
    /// Number of classification passes run.
    pub passes: usize,
}

/// Builds a navigation hierarchy from flat records.
#[derive(Clone, Debug)]
pub struct TreeBuilder {
    home_segment: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new("home")
    }
}

impl TreeBuilder {
    /// Create a builder.
    ///
    /// # Arguments
    ///
    /// * `home_segment` - URL segment whose link collapses to `""`
    #[must_use]
    pub fn new(home_segment: impl Into<String>) -> Self {
        Self {
            home_segment: home_segment.into(),
        }
    }

    /// Build the hierarchy.
    ///
    /// Never fails: unresolvable records end up in [`TreeBuild::excluded`].
    #[must_use]
    pub fn build(&self, records: Vec<NodeRecord>) -> TreeBuild {
        let record_count = records.len();
        let mut build = TreeBuild::default();

        let mut known: HashSet<NodeId> = HashSet::with_capacity(records.len());
        let mut remaining: Vec<(usize, NodeRecord)> = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            if known.insert(record.id) {
                remaining.push((index, record));
            } else {
                exclude(&mut build.excluded, record, ExclusionReason::Duplicate);
            }
        }

        while !remaining.is_empty() {
            build.passes += 1;
            let before = remaining.len();
            let mut deferred = Vec::new();

            for (index, record) in remaining {
                let parent_id = record.parent_id;
                if record.is_top_level() {
                    build.root_kids.push(record.id);
                    settle(&mut build.settled, index, record);
                } else if !known.contains(&parent_id) {
                    exclude(&mut build.excluded, record, ExclusionReason::MissingParent);
                } else if let Some(parent) = build.settled.get_mut(&parent_id) {
                    parent.kids.push(record.id);
                    settle(&mut build.settled, index, record);
                } else {
                    deferred.push((index, record));
                }
            }

            if deferred.len() == before {
                for (_, record) in deferred {
                    exclude(&mut build.excluded, record, ExclusionReason::Unreachable);
                }
                break;
            }
            remaining = deferred;
        }

        order_kids(&mut build);
        build.nodes = self.linearize(&build);

        tracing::debug!(
            records = record_count,
            nodes = build.nodes.len(),
            excluded = build.excluded.len(),
            passes = build.passes,
            "Built navigation tree"
        );

        build
    }

    /// Walk settled records depth-first from the virtual root, computing links.
    fn linearize(&self, build: &TreeBuild) -> Vec<TreeNode> {
        let mut nodes = Vec::with_capacity(build.settled.len());
        let mut stack: Vec<(NodeId, String)> = build
            .root_kids
            .iter()
            .rev()
            .map(|&id| (id, String::new()))
            .collect();

        while let Some((id, parent_link)) = stack.pop() {
            let Some(entry) = build.settled.get(&id) else {
                continue;
            };
            let link = compose_link(&parent_link, &entry.record.url_segment, &self.home_segment);
            for &kid in entry.kids.iter().rev() {
                stack.push((kid, link.clone()));
            }
            nodes.push(TreeNode::new(entry.record.clone(), entry.kids.clone(), link));
        }

        nodes
    }
}

fn settle(settled: &mut HashMap<NodeId, SettledEntry>, index: usize, record: NodeRecord) {
    settled.insert(
        record.id,
        SettledEntry {
            record,
            index,
            kids: Vec::new(),
        },
    );
}

fn exclude(excluded: &mut Vec<Exclusion>, record: NodeRecord, reason: ExclusionReason) {
    tracing::warn!(
        id = record.id,
        parent_id = record.parent_id,
        reason = reason.as_str(),
        "Excluding record from navigation tree"
    );
    excluded.push(Exclusion { record, reason });
}

/// Sort every kids list by sort key, then input position.
fn order_kids(build: &mut TreeBuild) {
    let order: HashMap<NodeId, (i64, usize)> = build
        .settled
        .iter()
        .map(|(&id, entry)| (id, (entry.record.sort, entry.index)))
        .collect();

    build.root_kids.sort_by_key(|id| order.get(id).copied());
    for entry in build.settled.values_mut() {
        entry.kids.sort_by_key(|id| order.get(id).copied());
    }
}

/// Join a parent link and a URL segment.
///
/// A child of a node with an empty link gets the bare segment. A leading
/// `/` is trimmed, and a link equal to `home_segment` becomes `""`.
#[must_use]
pub fn compose_link(parent_link: &str, segment: &str, home_segment: &str) -> String {
    let joined = if parent_link.is_empty() {
        segment.to_owned()
    } else {
        format!("{parent_link}/{segment}")
    };
    let link = joined.trim_start_matches('/');
    if link == home_segment {
        String::new()
    } else {
        link.to_owned()
    }
}

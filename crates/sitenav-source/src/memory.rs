//! In-memory node source with viewer and stage filtering.
//!
//! [`MemorySource`] holds every node of a site together with its draft and
//! published versions and the viewer groups allowed to see restricted nodes.
//! Each query answers for one [`Viewer`] on one [`Stage`], so the rows it
//! returns satisfy the filtering contract of [`NodeSource`].

use crate::record::{CanViewType, NodeId, NodeRecord};
use crate::source::{NodeSource, SourceError};

/// Group identifier.
pub type GroupId = u64;

/// The member a tree is built for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Viewer {
    /// Logged-in member, `None` for anonymous visitors.
    pub member_id: Option<u64>,
    /// Groups the member belongs to.
    pub groups: Vec<GroupId>,
    /// Admins see every restricted node, provided they belong to a group.
    pub is_admin: bool,
}

impl Viewer {
    /// Anonymous visitor.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Logged-in member without groups.
    #[must_use]
    pub fn member(member_id: u64) -> Self {
        Self {
            member_id: Some(member_id),
            ..Self::default()
        }
    }

    /// Set group membership.
    #[must_use]
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }

    /// Grant admin rights.
    #[must_use]
    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// True for logged-in members.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.member_id.is_some()
    }
}

/// Content stage rows are read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    /// Draft versions of every node.
    Draft,
    /// Published versions only.
    #[default]
    Live,
}

#[derive(Clone, Debug)]
struct StoredNode {
    draft: NodeRecord,
    live: Option<NodeRecord>,
    viewer_groups: Vec<GroupId>,
}

impl StoredNode {
    fn on_stage(&self, stage: Stage) -> Option<&NodeRecord> {
        match stage {
            Stage::Draft => Some(&self.draft),
            Stage::Live => self.live.as_ref(),
        }
    }
}

/// Node source backed by an in-memory table.
///
/// # Example
///
/// ```
/// use sitenav_source::{MemorySource, NodeRecord, NodeSource, Viewer};
///
/// let source = MemorySource::new()
///     .with_node(NodeRecord::new(1, 0, "home"))
///     .with_node(NodeRecord::new(2, 1, "about"))
///     .for_viewer(Viewer::anonymous());
///
/// assert_eq!(source.public_nodes().unwrap().len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    nodes: Vec<StoredNode>,
    viewer: Viewer,
    stage: Stage,
}

impl MemorySource {
    /// Create an empty source for an anonymous viewer on the live stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load published records from a JSON array of rows.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] with kind `InvalidRecord` if the JSON does not
    /// decode into records.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let records: Vec<NodeRecord> = serde_json::from_str(json)
            .map_err(|e| SourceError::invalid_record(e).with_backend("Memory"))?;
        Ok(records
            .into_iter()
            .fold(Self::new(), MemorySource::with_node))
    }

    /// Add a published node. Draft and live versions are identical.
    #[must_use]
    pub fn with_node(mut self, record: NodeRecord) -> Self {
        match self.position(record.id) {
            Some(i) => {
                self.nodes[i].draft = record.clone();
                self.nodes[i].live = Some(record);
            }
            None => self.nodes.push(StoredNode {
                draft: record.clone(),
                live: Some(record),
                viewer_groups: Vec::new(),
            }),
        }
        self
    }

    /// Add or replace the draft version of a node without publishing it.
    #[must_use]
    pub fn with_draft(mut self, record: NodeRecord) -> Self {
        match self.position(record.id) {
            Some(i) => self.nodes[i].draft = record,
            None => self.nodes.push(StoredNode {
                draft: record,
                live: None,
                viewer_groups: Vec::new(),
            }),
        }
        self
    }

    /// Restrict an `OnlyTheseUsers` node to the given viewer groups.
    ///
    /// Unknown ids are ignored.
    #[must_use]
    pub fn with_viewer_groups(
        mut self,
        id: NodeId,
        groups: impl IntoIterator<Item = GroupId>,
    ) -> Self {
        if let Some(i) = self.position(id) {
            self.nodes[i].viewer_groups = groups.into_iter().collect();
        }
        self
    }

    /// Answer queries for the given viewer.
    #[must_use]
    pub fn for_viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = viewer;
        self
    }

    /// Answer queries from the given stage.
    #[must_use]
    pub fn on_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|node| node.draft.id == id)
    }

    /// Rows on the active stage that pass `keep`, ordered by parent then sort.
    fn select(&self, keep: impl Fn(&StoredNode, &NodeRecord) -> bool) -> Vec<NodeRecord> {
        let mut rows: Vec<NodeRecord> = self
            .nodes
            .iter()
            .filter_map(|node| node.on_stage(self.stage).map(|record| (node, record)))
            .filter(|&(node, record)| keep(node, record))
            .map(|(_, record)| record.clone())
            .collect();
        rows.sort_by_key(|record| (record.parent_id, record.sort));
        rows
    }
}

impl NodeSource for MemorySource {
    fn public_nodes(&self) -> Result<Vec<NodeRecord>, SourceError> {
        let logged_in = self.viewer.is_logged_in();
        let rows = self.select(|_, record| match record.can_view_type {
            CanViewType::OnlyTheseUsers => false,
            CanViewType::LoggedInUsers => logged_in,
            CanViewType::Anyone | CanViewType::Inherit => true,
        });
        tracing::debug!(count = rows.len(), stage = ?self.stage, "Selected public nodes");
        Ok(rows)
    }

    fn private_nodes(&self) -> Result<Vec<NodeRecord>, SourceError> {
        if !self.viewer.is_logged_in() || self.viewer.groups.is_empty() {
            return Ok(Vec::new());
        }

        let viewer = &self.viewer;
        let rows = self.select(|node, record| {
            record.can_view_type == CanViewType::OnlyTheseUsers
                && (viewer.is_admin
                    || node.viewer_groups.iter().any(|g| viewer.groups.contains(g)))
        });
        tracing::debug!(count = rows.len(), stage = ?self.stage, "Selected private nodes");
        Ok(rows)
    }
}

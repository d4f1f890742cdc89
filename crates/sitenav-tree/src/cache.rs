//! Request-scoped node cache.
//!
//! [`NodeCache`] owns every [`TreeNode`] of one request. The tree is built
//! from the [`NodeSource`] on first lookup, not on construction, since many
//! requests never touch navigation.
//!
//! # Build States
//!
//! - *Pending*: nothing fetched yet; the next lookup builds.
//! - *Built*: lookups are map reads.
//! - *Failed*: the fetch failed; lookups report absence and the source is
//!   not queried again.
//!
//! # Thread Safety
//!
//! State sits behind an `RwLock`, and builds are serialized with a
//! double-checked `Mutex`, so a cache can be shared through `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use sitenav_config::Config;
use sitenav_source::{NodeId, NodeRecord, NodeSource, ROOT_ID};

use crate::builder::{Exclusion, TreeBuilder, compose_link};
use crate::error::NavError;
use crate::node::{NodeRef, TreeNode};

/// Configuration for [`NodeCache`].
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// URL segment whose link collapses to `""`.
    pub home_segment: String,
    /// Record prepended to every build, for sites whose pages hang below a
    /// site node that the source does not return.
    pub site_root: Option<NodeRecord>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            home_segment: "home".to_owned(),
            site_root: None,
        }
    }
}

impl From<&Config> for CacheConfig {
    fn from(config: &Config) -> Self {
        let site_root = config.site_root.as_ref().map(|root| {
            NodeRecord::new(root.id, ROOT_ID, root.url_segment.clone())
                .with_title(root.title.clone())
                .with_class("Site")
                .with_can_view_type(root.can_view_type)
        });
        Self {
            home_segment: config.tree.home_segment.clone(),
            site_root,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuildStatus {
    Pending,
    Built,
    Failed,
}

#[derive(Debug)]
struct CacheState {
    status: BuildStatus,
    nodes: HashMap<NodeId, Arc<TreeNode>>,
    root_kids: Vec<NodeId>,
    excluded: Vec<Exclusion>,
}

/// Lazily built id → node map for one request.
pub struct NodeCache {
    source: Arc<dyn NodeSource>,
    config: CacheConfig,
    current: Option<NodeId>,
    /// Serializes builds.
    build_lock: Mutex<()>,
    state: RwLock<CacheState>,
}

impl NodeCache {
    /// Create an unbuilt cache.
    ///
    /// # Arguments
    ///
    /// * `source` - Row source queried on first lookup
    /// * `config` - Cache configuration
    #[must_use]
    pub fn new(source: Arc<dyn NodeSource>, config: CacheConfig) -> Self {
        Self {
            source,
            config,
            current: None,
            build_lock: Mutex::new(()),
            state: RwLock::new(CacheState {
                status: BuildStatus::Pending,
                nodes: HashMap::new(),
                root_kids: Vec::new(),
                excluded: Vec::new(),
            }),
        }
    }

    /// Set the id of the page handling this request.
    #[must_use]
    pub fn with_current(mut self, id: NodeId) -> Self {
        self.current = Some(id);
        self
    }

    /// Id of the current page, if any.
    #[must_use]
    pub fn current_id(&self) -> Option<NodeId> {
        self.current
    }

    /// Node of the current page, if any.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    #[must_use]
    pub fn current(&self) -> Option<NodeRef<'_>> {
        self.current.and_then(|id| self.get(id))
    }

    /// Build the tree if it has not been built yet.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Source`] if this call ran the build and the fetch
    /// failed, or [`NavError::Unavailable`] if an earlier build failed.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn load(&self) -> Result<(), NavError> {
        // Fast path: already settled
        match self.status() {
            BuildStatus::Built => return Ok(()),
            BuildStatus::Failed => return Err(NavError::Unavailable),
            BuildStatus::Pending => {}
        }

        let _guard = self.build_lock.lock().unwrap();

        // Double-check after acquiring lock
        match self.status() {
            BuildStatus::Built => return Ok(()),
            BuildStatus::Failed => return Err(NavError::Unavailable),
            BuildStatus::Pending => {}
        }

        let records = match self.fetch_records() {
            Ok(records) => records,
            Err(e) => {
                let temporary = matches!(&e, NavError::Source(source) if source.is_temporary());
                tracing::error!(error = %e, temporary, "Failed to fetch navigation records");
                self.state.write().unwrap().status = BuildStatus::Failed;
                return Err(e);
            }
        };

        let build = TreeBuilder::new(self.config.home_segment.clone()).build(records);
        let built: HashMap<NodeId, Arc<TreeNode>> = build
            .nodes
            .into_iter()
            .map(|node| (node.id(), Arc::new(node)))
            .collect();

        let mut state = self.state.write().unwrap();
        state.nodes = built;
        state.root_kids = build.root_kids;
        state.excluded = build.excluded;
        state.status = BuildStatus::Built;

        Ok(())
    }

    /// Look up a node, building the tree on first use.
    ///
    /// Returns `None` for unknown ids and after a failed build.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.try_get(id).ok().flatten()
    }

    /// Look up a node, surfacing build failures.
    ///
    /// # Errors
    ///
    /// Returns the build error, see [`load`](Self::load).
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn try_get(&self, id: NodeId) -> Result<Option<NodeRef<'_>>, NavError> {
        self.load()?;
        Ok(self.lookup(id))
    }

    /// Return the node for `record.id`, registering one built from `record`
    /// if the cache has none.
    ///
    /// Builds the tree first if it is still pending, but never rebuilds. A
    /// failed build does not stop the record from being registered. The link
    /// is composed from the parent when the parent is cached, otherwise from
    /// the bare URL segment.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn ensure(&self, record: NodeRecord) -> NodeRef<'_> {
        if self.load().is_err() {
            tracing::debug!(id = record.id, "Registering node without a built tree");
        }

        let mut state = self.state.write().unwrap();
        if let Some(node) = state.nodes.get(&record.id) {
            return NodeRef::new(self, Arc::clone(node));
        }

        let parent_link = state
            .nodes
            .get(&record.parent_id)
            .map_or("", |parent| parent.link());
        let link = compose_link(parent_link, &record.url_segment, &self.config.home_segment);
        let id = record.id;
        let node = Arc::new(TreeNode::new(record, Vec::new(), link));
        state.nodes.insert(id, Arc::clone(&node));
        tracing::debug!(id, "Registered node outside tree build");

        NodeRef::new(self, node)
    }

    /// Visible children of the virtual root, ordered by sort key.
    ///
    /// Empty if the build failed.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    #[must_use]
    pub fn root_children(&self) -> Vec<NodeRef<'_>> {
        if self.load().is_err() {
            return Vec::new();
        }
        let root_kids = self.state.read().unwrap().root_kids.clone();
        root_kids
            .into_iter()
            .filter_map(|id| self.lookup(id))
            .filter(|node| node.show_in_menus())
            .collect()
    }

    /// True if the current page or one of its ancestors has URL segment
    /// `segment`.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Cycle`] if the current page's chain loops.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn in_section(&self, segment: &str) -> Result<bool, NavError> {
        let Some(current) = self.current() else {
            return Ok(false);
        };
        if current.url_segment() == segment {
            return Ok(true);
        }
        for ancestor in current.ancestors() {
            if ancestor?.url_segment() == segment {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Records left out of the last build.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    #[must_use]
    pub fn excluded(&self) -> Vec<Exclusion> {
        self.state.read().unwrap().excluded.clone()
    }

    /// Number of cached nodes. Does not trigger a build.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().unwrap().nodes.len()
    }

    /// True if no node is cached. Does not trigger a build.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn status(&self) -> BuildStatus {
        self.state.read().unwrap().status
    }

    fn lookup(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let node = Arc::clone(self.state.read().unwrap().nodes.get(&id)?);
        Some(NodeRef::new(self, node))
    }

    /// Site root first, then public, private and additional rows.
    fn fetch_records(&self) -> Result<Vec<NodeRecord>, NavError> {
        let mut records = Vec::new();
        if let Some(site_root) = &self.config.site_root {
            records.push(site_root.clone());
        }
        records.extend(self.source.public_nodes()?);
        records.extend(self.source.private_nodes()?);
        records.extend(self.source.additional_nodes()?);
        Ok(records)
    }
}

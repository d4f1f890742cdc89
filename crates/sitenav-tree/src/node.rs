//! Materialized tree nodes and the navigation API.
//!
//! [`TreeNode`] holds a record plus its computed link and ordered child ids.
//! Nodes never reference each other directly. [`NodeRef`] pairs a node with
//! the [`NodeCache`] that owns it, and every relationship (parent, children,
//! ancestors) is resolved through that cache by id.
//!
//! # Malformed Hierarchies
//!
//! Nodes registered with [`NodeCache::ensure`] can point at each other in a
//! cycle. Every upward walk is bounded by the number of cached nodes and
//! reports [`NavError::Cycle`] instead of looping.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use sitenav_source::{NodeId, NodeRecord, ROOT_ID};

use crate::cache::NodeCache;
use crate::error::NavError;

/// A node of the built hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    record: NodeRecord,
    kids: Vec<NodeId>,
    link: String,
}

impl TreeNode {
    pub(crate) fn new(record: NodeRecord, kids: Vec<NodeId>, link: String) -> Self {
        Self { record, kids, link }
    }

    /// Node identifier.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.record.id
    }

    /// Parent identifier, [`ROOT_ID`] for top-level nodes.
    #[must_use]
    pub fn parent_id(&self) -> NodeId {
        self.record.parent_id
    }

    /// Underlying record.
    #[must_use]
    pub fn record(&self) -> &NodeRecord {
        &self.record
    }

    /// Child ids in sibling order, hidden children included.
    #[must_use]
    pub fn kids(&self) -> &[NodeId] {
        &self.kids
    }

    /// Full path from the root, without leading slash. `""` for home.
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.record.title
    }

    /// Menu title, falling back to the title when blank.
    #[must_use]
    pub fn menu_title(&self) -> &str {
        self.record.resolved_menu_title()
    }

    #[must_use]
    pub fn url_segment(&self) -> &str {
        &self.record.url_segment
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.record.class_name
    }

    #[must_use]
    pub fn sort(&self) -> i64 {
        self.record.sort
    }

    #[must_use]
    pub fn show_in_menus(&self) -> bool {
        self.record.show_in_menus
    }
}

/// How a node relates to the current page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkingMode {
    /// The node is the current page.
    Current,
    /// The current page lies below the node.
    Section,
    /// Unrelated to the current page.
    Link,
}

impl LinkingMode {
    /// Lowercase name used by templates.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Section => "section",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for LinkingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable snapshot of a node for renderers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub id: NodeId,
    pub title: String,
    pub menu_title: String,
    pub url_segment: String,
    pub link: String,
    pub linking_mode: LinkingMode,
    pub show_in_menus: bool,
}

/// A node together with the cache it lives in.
///
/// Dereferences to [`TreeNode`] for field access.
#[derive(Clone)]
pub struct NodeRef<'c> {
    cache: &'c NodeCache,
    node: Arc<TreeNode>,
}

impl<'c> NodeRef<'c> {
    pub(crate) fn new(cache: &'c NodeCache, node: Arc<TreeNode>) -> Self {
        Self { cache, node }
    }

    /// Parent node, or `None` for top-level nodes and unresolvable parents.
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'c>> {
        if self.parent_id() == ROOT_ID {
            return None;
        }
        self.cache.get(self.parent_id())
    }

    /// Ancestors from the immediate parent upward.
    ///
    /// Each call returns a fresh iterator.
    #[must_use]
    pub fn ancestors(&self) -> Ancestors<'c> {
        Ancestors {
            cache: self.cache,
            origin: self.id(),
            next: self.parent_id(),
            steps: 0,
            done: false,
        }
    }

    /// Children shown in menus, ordered by sort key.
    #[must_use]
    pub fn children(&self) -> Vec<NodeRef<'c>> {
        let mut children: Vec<NodeRef<'c>> = self
            .kids()
            .iter()
            .filter_map(|&id| self.cache.get(id))
            .filter(|kid| kid.show_in_menus())
            .collect();
        children.sort_by_key(|kid| kid.sort());
        children
    }

    /// True if the parent chain fails to reach the virtual root.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Cycle`] if the chain loops.
    pub fn is_orphaned(&self) -> Result<bool, NavError> {
        let mut parent_id = self.parent_id();
        let mut steps = 0;
        while parent_id != ROOT_ID {
            let limit = self.cache.len();
            if steps >= limit {
                return Err(self.cycle(limit));
            }
            let Some(parent) = self.cache.get(parent_id) else {
                return Ok(true);
            };
            parent_id = parent.parent_id();
            steps += 1;
        }
        Ok(false)
    }

    /// True if this is the current page of the request.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.cache.current_id() == Some(self.id())
    }

    /// True if this is the current page or one of its ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Cycle`] if the current page's chain loops.
    pub fn is_section(&self) -> Result<bool, NavError> {
        if self.is_current() {
            return Ok(true);
        }
        let Some(current) = self.cache.current() else {
            return Ok(false);
        };
        for ancestor in current.ancestors() {
            if ancestor?.id() == self.id() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Current, section or plain link.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Cycle`] if the current page's chain loops.
    pub fn linking_mode(&self) -> Result<LinkingMode, NavError> {
        if self.is_current() {
            Ok(LinkingMode::Current)
        } else if self.is_section()? {
            Ok(LinkingMode::Section)
        } else {
            Ok(LinkingMode::Link)
        }
    }

    /// [`LinkingMode::Current`] or [`LinkingMode::Link`].
    #[must_use]
    pub fn link_or_current(&self) -> LinkingMode {
        if self.is_current() {
            LinkingMode::Current
        } else {
            LinkingMode::Link
        }
    }

    /// [`LinkingMode::Section`] or [`LinkingMode::Link`].
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Cycle`] if the current page's chain loops.
    pub fn link_or_section(&self) -> Result<LinkingMode, NavError> {
        if self.is_section()? {
            Ok(LinkingMode::Section)
        } else {
            Ok(LinkingMode::Link)
        }
    }

    /// Snapshot for renderers.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Cycle`] if the linking mode cannot be resolved.
    pub fn to_nav_item(&self) -> Result<NavItem, NavError> {
        Ok(NavItem {
            id: self.id(),
            title: self.title().to_owned(),
            menu_title: self.menu_title().to_owned(),
            url_segment: self.url_segment().to_owned(),
            link: self.link().to_owned(),
            linking_mode: self.linking_mode()?,
            show_in_menus: self.show_in_menus(),
        })
    }

    /// Shared handle to the node.
    #[must_use]
    pub fn node(&self) -> &Arc<TreeNode> {
        &self.node
    }

    /// Cache the node belongs to.
    #[must_use]
    pub fn cache(&self) -> &'c NodeCache {
        self.cache
    }

    fn cycle(&self, limit: usize) -> NavError {
        tracing::warn!(id = self.id(), limit, "Cycle detected in parent chain");
        NavError::Cycle {
            id: self.id(),
            limit,
        }
    }
}

impl std::ops::Deref for NodeRef<'_> {
    type Target = TreeNode;

    fn deref(&self) -> &TreeNode {
        &self.node
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.cache, other.cache) && self.node == other.node
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("link", &self.link())
            .finish_non_exhaustive()
    }
}

/// Iterator over a node's ancestors, nearest first.
///
/// Ends at the virtual root or at an unresolvable parent. If the walk takes
/// more steps than there are cached nodes it yields one
/// [`NavError::Cycle`] and then ends.
#[derive(Clone)]
pub struct Ancestors<'c> {
    cache: &'c NodeCache,
    origin: NodeId,
    next: NodeId,
    steps: usize,
    done: bool,
}

impl<'c> Iterator for Ancestors<'c> {
    type Item = Result<NodeRef<'c>, NavError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next == ROOT_ID {
            self.done = true;
            return None;
        }

        let limit = self.cache.len();
        if self.steps >= limit {
            self.done = true;
            tracing::warn!(id = self.origin, limit, "Cycle detected in parent chain");
            return Some(Err(NavError::Cycle {
                id: self.origin,
                limit,
            }));
        }

        let Some(node) = self.cache.get(self.next) else {
            self.done = true;
            return None;
        };
        self.steps += 1;
        self.next = node.parent_id();
        Some(Ok(node))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use sitenav_source::MockSource;

    use super::*;
    use crate::cache::CacheConfig;

    fn sample_cache(current: Option<NodeId>) -> NodeCache {
        let source = MockSource::new().with_records([
            NodeRecord::new(1, 0, "home"),
            NodeRecord::new(2, 1, "about"),
            NodeRecord::new(3, 2, "team"),
            NodeRecord::new(4, 0, "contact"),
        ]);
        let cache = NodeCache::new(Arc::new(source), CacheConfig::default());
        match current {
            Some(id) => cache.with_current(id),
            None => cache,
        }
    }

    fn ids(nodes: &[NodeRef<'_>]) -> Vec<NodeId> {
        nodes.iter().map(|n| n.id()).collect()
    }

    fn ancestor_ids(node: &NodeRef<'_>) -> Vec<NodeId> {
        node.ancestors().map(|a| a.unwrap().id()).collect()
    }

    #[test]
    fn test_parent_of_top_level_is_none() {
        let cache = sample_cache(None);

        let home = cache.get(1).unwrap();

        assert!(home.parent().is_none());
        assert_eq!(cache.get(3).unwrap().parent().unwrap().id(), 2);
    }

    #[test]
    fn test_ancestors_length_equals_depth() {
        let cache = sample_cache(None);

        assert_eq!(ancestor_ids(&cache.get(1).unwrap()), Vec::<NodeId>::new());
        assert_eq!(ancestor_ids(&cache.get(2).unwrap()), vec![1]);
        assert_eq!(ancestor_ids(&cache.get(3).unwrap()), vec![2, 1]);
    }

    #[test]
    fn test_ancestors_restartable() {
        let cache = sample_cache(None);
        let team = cache.get(3).unwrap();

        let first = ancestor_ids(&team);
        let second = ancestor_ids(&team);

        assert_eq!(first, second);
    }

    #[test]
    fn test_ancestors_cycle_reports_error_once() {
        let cache = sample_cache(None);
        cache.load().unwrap();
        cache.ensure(NodeRecord::new(20, 21, "a"));
        let node = cache.ensure(NodeRecord::new(21, 20, "b"));

        let items: Vec<_> = node.ancestors().collect();

        let limit = cache.len();
        assert_eq!(items.len(), limit + 1);
        assert!(items[..limit].iter().all(Result::is_ok));
        assert!(matches!(
            items[limit],
            Err(NavError::Cycle { id: 21, limit: l }) if l == limit
        ));
    }

    #[test]
    fn test_children_filters_hidden_and_sorts() {
        let source = MockSource::new().with_records([
            NodeRecord::new(1, 0, "home"),
            NodeRecord::new(2, 1, "a").with_sort(2),
            NodeRecord::new(3, 1, "b").with_sort(1).with_show_in_menus(false),
            NodeRecord::new(4, 1, "c").with_sort(1),
        ]);
        let cache = NodeCache::new(Arc::new(source), CacheConfig::default());

        let children = cache.get(1).unwrap().children();

        assert_eq!(ids(&children), vec![4, 2]);
    }

    #[test]
    fn test_children_single_visible() {
        let source = MockSource::new().with_records([
            NodeRecord::new(1, 0, "home"),
            NodeRecord::new(10, 1, "a").with_sort(2),
            NodeRecord::new(11, 1, "b").with_sort(1).with_show_in_menus(false),
        ]);
        let cache = NodeCache::new(Arc::new(source), CacheConfig::default());

        let children = cache.get(1).unwrap().children();

        assert_eq!(ids(&children), vec![10]);
    }

    #[test]
    fn test_is_orphaned_false_for_built_nodes() {
        let cache = sample_cache(None);

        for id in 1..=4 {
            assert!(!cache.get(id).unwrap().is_orphaned().unwrap());
        }
    }

    #[test]
    fn test_is_orphaned_true_for_dangling_parent() {
        let cache = sample_cache(None);

        let lost = cache.ensure(NodeRecord::new(9, 99, "lost"));

        assert!(lost.is_orphaned().unwrap());
    }

    #[test]
    fn test_is_orphaned_cycle_is_error() {
        let cache = sample_cache(None);
        cache.load().unwrap();
        cache.ensure(NodeRecord::new(20, 21, "a"));
        let node = cache.ensure(NodeRecord::new(21, 20, "b"));

        assert!(matches!(
            node.is_orphaned(),
            Err(NavError::Cycle { id: 21, .. })
        ));
    }

    #[test]
    fn test_current_and_section_classification() {
        let cache = sample_cache(Some(3));

        let home = cache.get(1).unwrap();
        let about = cache.get(2).unwrap();
        let team = cache.get(3).unwrap();
        let contact = cache.get(4).unwrap();

        assert!(team.is_current());
        assert!(!about.is_current());
        assert!(home.is_section().unwrap());
        assert!(about.is_section().unwrap());
        assert!(!contact.is_section().unwrap());
        assert_eq!(team.linking_mode().unwrap(), LinkingMode::Current);
        assert_eq!(about.linking_mode().unwrap(), LinkingMode::Section);
        assert_eq!(home.linking_mode().unwrap(), LinkingMode::Section);
        assert_eq!(contact.linking_mode().unwrap(), LinkingMode::Link);
    }

    #[test]
    fn test_link_or_current_and_section() {
        let cache = sample_cache(Some(3));

        let about = cache.get(2).unwrap();
        let team = cache.get(3).unwrap();

        assert_eq!(team.link_or_current(), LinkingMode::Current);
        assert_eq!(about.link_or_current(), LinkingMode::Link);
        assert_eq!(about.link_or_section().unwrap(), LinkingMode::Section);
        assert_eq!(cache.get(4).unwrap().link_or_section().unwrap(), LinkingMode::Link);
    }

    #[test]
    fn test_no_current_page_means_plain_links() {
        let cache = sample_cache(None);

        let team = cache.get(3).unwrap();

        assert_eq!(team.linking_mode().unwrap(), LinkingMode::Link);
    }

    #[test]
    fn test_to_nav_item_serializes() {
        let source = MockSource::new().with_records([
            NodeRecord::new(1, 0, "home").with_title("Welcome"),
            NodeRecord::new(2, 1, "about")
                .with_title("About Us")
                .with_menu_title("About"),
        ]);
        let cache = NodeCache::new(Arc::new(source), CacheConfig::default()).with_current(2);

        let item = cache.get(2).unwrap().to_nav_item().unwrap();
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 2,
                "title": "About Us",
                "menuTitle": "About",
                "urlSegment": "about",
                "link": "about",
                "linkingMode": "current",
                "showInMenus": true,
            })
        );
        assert_eq!(cache.get(1).unwrap().menu_title(), "Welcome");
    }

    #[test]
    fn test_linking_mode_display() {
        assert_eq!(LinkingMode::Section.to_string(), "section");
    }
}

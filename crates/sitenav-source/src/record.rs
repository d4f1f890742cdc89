//! Flat node records as delivered by a row source.

use serde::{Deserialize, Serialize};

/// Node identifier. `0` is reserved for the virtual root.
pub type NodeId = u64;

/// Identifier of the virtual root every top-level node hangs from.
pub const ROOT_ID: NodeId = 0;

/// View-permission classifier carried by each node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanViewType {
    /// Visible to everyone.
    #[default]
    Anyone,
    /// Visible to any authenticated member.
    LoggedInUsers,
    /// Visible to members of the node's viewer groups.
    OnlyTheseUsers,
    /// Permission follows the parent node.
    Inherit,
}

/// One row of the page hierarchy.
///
/// Records are immutable once read. `parent_id` should reference another
/// record in the same build, but sources give no such guarantee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeRecord {
    /// Unique identifier within one build.
    #[serde(rename = "ID")]
    pub id: NodeId,
    /// Parent identifier, [`ROOT_ID`] for top-level nodes.
    #[serde(rename = "ParentID", default)]
    pub parent_id: NodeId,
    /// Concrete page type (e.g. "Page", "BlogHolder").
    #[serde(default)]
    pub class_name: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Navigation label. Blank means "use the title".
    #[serde(default)]
    pub menu_title: Option<String>,
    /// Path component, unique among siblings.
    #[serde(rename = "URLSegment", default)]
    pub url_segment: String,
    /// View-permission classifier.
    #[serde(default)]
    pub can_view_type: CanViewType,
    /// Sibling sort key (ascending).
    #[serde(default)]
    pub sort: i64,
    /// Whether the node appears in menus and breadcrumbs.
    #[serde(default = "default_show_in_menus")]
    pub show_in_menus: bool,
    /// Creation time as seconds since Unix epoch.
    #[serde(default)]
    pub created: f64,
    /// Last modification time as seconds since Unix epoch.
    #[serde(default)]
    pub last_edited: f64,
}

fn default_show_in_menus() -> bool {
    true
}

impl NodeRecord {
    /// Create a record with the given identity and defaults elsewhere.
    ///
    /// The class name defaults to `"Page"` and the node is shown in menus.
    #[must_use]
    pub fn new(id: NodeId, parent_id: NodeId, url_segment: impl Into<String>) -> Self {
        let url_segment = url_segment.into();
        Self {
            id,
            parent_id,
            class_name: "Page".to_owned(),
            title: url_segment.clone(),
            menu_title: None,
            url_segment,
            can_view_type: CanViewType::Anyone,
            sort: 0,
            show_in_menus: true,
            created: 0.0,
            last_edited: 0.0,
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the menu title.
    #[must_use]
    pub fn with_menu_title(mut self, menu_title: impl Into<String>) -> Self {
        self.menu_title = Some(menu_title.into());
        self
    }

    /// Set the class name.
    #[must_use]
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Set the sibling sort key.
    #[must_use]
    pub fn with_sort(mut self, sort: i64) -> Self {
        self.sort = sort;
        self
    }

    /// Set the show-in-menus flag.
    #[must_use]
    pub fn with_show_in_menus(mut self, show: bool) -> Self {
        self.show_in_menus = show;
        self
    }

    /// Set the view-permission classifier.
    #[must_use]
    pub fn with_can_view_type(mut self, can_view_type: CanViewType) -> Self {
        self.can_view_type = can_view_type;
        self
    }

    /// True if the record hangs directly from the virtual root.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent_id == ROOT_ID
    }

    /// Menu title with the title fallback applied.
    #[must_use]
    pub fn resolved_menu_title(&self) -> &str {
        match self.menu_title.as_deref() {
            Some(menu_title) if !menu_title.is_empty() => menu_title,
            _ => &self.title,
        }
    }
}

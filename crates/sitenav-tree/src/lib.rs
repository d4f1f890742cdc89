//! Request-scoped navigation tree for a site's page hierarchy.
//!
//! This crate provides:
//! - [`TreeBuilder`]: flat records to a rooted hierarchy with computed links
//! - [`NodeCache`]: lazily built id → node map for one request
//! - [`NodeRef`]: parent, ancestor, children and current/section queries
//! - [`breadcrumbs`] and [`level`]: trail helpers for renderers
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use sitenav_source::{MemorySource, NodeRecord};
//! use sitenav_tree::{BreadcrumbOptions, CacheConfig, LinkingMode, NodeCache, breadcrumbs};
//!
//! let source = MemorySource::new()
//!     .with_node(NodeRecord::new(1, 0, "home"))
//!     .with_node(NodeRecord::new(2, 1, "about"))
//!     .with_node(NodeRecord::new(3, 2, "team"));
//! let cache = NodeCache::new(Arc::new(source), CacheConfig::default()).with_current(3);
//!
//! let team = cache.get(3).unwrap();
//! assert_eq!(team.link(), "about/team");
//! assert_eq!(cache.get(2).unwrap().linking_mode().unwrap(), LinkingMode::Section);
//!
//! let trail = breadcrumbs(&team, &BreadcrumbOptions::default()).unwrap();
//! let links: Vec<&str> = trail.iter().map(|n| n.link()).collect();
//! assert_eq!(links, ["", "about", "about/team"]);
//! ```

mod builder;
mod cache;
mod error;
mod node;
mod trail;

pub use builder::{
    Exclusion, ExclusionReason, SettledEntry, TreeBuild, TreeBuilder, compose_link,
};
pub use cache::{CacheConfig, NodeCache};
pub use error::NavError;
pub use node::{Ancestors, LinkingMode, NavItem, NodeRef, TreeNode};
pub use trail::{BreadcrumbOptions, breadcrumbs, level};

//! Breadcrumb trails and menu levels.

use sitenav_config::Config;

use crate::error::NavError;
use crate::node::NodeRef;

/// Breadcrumb collection options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BreadcrumbOptions {
    /// Maximum number of collected pages. `0` means unbounded.
    pub max_depth: usize,
    /// Class name at which the walk stops. The matching node is not collected.
    pub stop_at_type: Option<String>,
    /// Collect pages hidden from menus.
    pub show_hidden: bool,
}

impl Default for BreadcrumbOptions {
    fn default() -> Self {
        Self {
            max_depth: 20,
            stop_at_type: None,
            show_hidden: false,
        }
    }
}

impl From<&Config> for BreadcrumbOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_depth: config.breadcrumbs.max_depth,
            stop_at_type: config.breadcrumbs.stop_at_type.clone(),
            show_hidden: config.breadcrumbs.show_hidden,
        }
    }
}

/// Collect the breadcrumb trail for `node`, root first.
///
/// Walks from `node` upward. Hidden pages are skipped unless
/// `show_hidden` is set, but `node` itself is always collected. Only
/// collected pages count toward `max_depth`.
///
/// # Errors
///
/// Returns [`NavError::Cycle`] if the walk loops before a stop condition.
pub fn breadcrumbs<'c>(
    node: &NodeRef<'c>,
    options: &BreadcrumbOptions,
) -> Result<Vec<NodeRef<'c>>, NavError> {
    let mut pages = Vec::new();
    let mut chain = std::iter::once(Ok(node.clone())).chain(node.ancestors());

    while options.max_depth == 0 || pages.len() < options.max_depth {
        let Some(page) = chain.next() else {
            break;
        };
        let page = page?;
        if options.stop_at_type.as_deref() == Some(page.class_name()) {
            break;
        }
        if options.show_hidden || page.show_in_menus() || page.id() == node.id() {
            pages.push(page);
        }
    }

    pages.reverse();
    Ok(pages)
}

/// Node at menu level `n` (1-indexed) on the path from the root to `node`.
///
/// `level(node, 1)` is the top-level page `node` lives under. Returns
/// `None` for `n == 0` or when `n` exceeds the depth of `node`.
///
/// # Errors
///
/// Returns [`NavError::Cycle`] if the parent chain loops.
pub fn level<'c>(node: &NodeRef<'c>, n: usize) -> Result<Option<NodeRef<'c>>, NavError> {
    if n == 0 {
        return Ok(None);
    }
    let mut stack = node.ancestors().collect::<Result<Vec<_>, _>>()?;
    stack.reverse();
    stack.push(node.clone());
    Ok(stack.into_iter().nth(n - 1))
}

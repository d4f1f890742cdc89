//! Node record model and row source abstraction for sitenav.
//!
//! This crate provides a [`NodeSource`] trait for abstracting where flat page
//! records come from. This enables:
//!
//! - **Unit testing** of tree construction without a database
//! - **Backend flexibility** (SQL query layer, in-memory fixtures)
//! - **Clean separation** between permission filtering and hierarchy logic
//!
//! # Architecture
//!
//! The crate provides:
//! - [`NodeRecord`], the flat row shape every source returns
//! - [`NodeSource`] trait with `public_nodes()`, `private_nodes()` and
//!   `additional_nodes()` methods
//! - [`MemorySource`] with viewer and stage filtering
//! - [`MockSource`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```
//! use sitenav_source::{MemorySource, NodeRecord, NodeSource, Stage, Viewer};
//!
//! let source = MemorySource::new()
//!     .with_node(NodeRecord::new(1, 0, "home"))
//!     .for_viewer(Viewer::member(7))
//!     .on_stage(Stage::Live);
//! let rows = source.public_nodes().unwrap();
//! assert_eq!(rows[0].url_segment, "home");
//! ```

mod memory;
#[cfg(feature = "mock")]
mod mock;
mod record;
mod source;

pub use memory::{GroupId, MemorySource, Stage, Viewer};
#[cfg(feature = "mock")]
pub use mock::MockSource;
pub use record::{CanViewType, NodeId, NodeRecord, ROOT_ID};
pub use source::{ErrorStatus, NodeSource, SourceError, SourceErrorKind};

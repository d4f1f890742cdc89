//! Mock source implementation for testing.
//!
//! Provides [`MockSource`] for unit testing cache laziness and failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::record::NodeRecord;
use crate::source::{ErrorStatus, NodeSource, SourceError, SourceErrorKind};

/// Mock source for testing.
///
/// Serves fixed public, private and additional rows without any filtering,
/// counts how often it is queried, and can be switched into a failing mode.
///
/// # Example
///
/// ```ignore
/// use sitenav_source::{MockSource, NodeRecord, NodeSource};
///
/// let source = MockSource::new()
///     .with_public(NodeRecord::new(1, 0, "home"))
///     .with_public(NodeRecord::new(2, 1, "about"));
///
/// assert_eq!(source.public_nodes().unwrap().len(), 2);
/// assert_eq!(source.fetch_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    public: Vec<NodeRecord>,
    private: Vec<NodeRecord>,
    additional: Vec<NodeRecord>,
    failure: Option<SourceErrorKind>,
    fetches: AtomicUsize,
}

impl MockSource {
    /// Create a new empty mock source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a public row.
    #[must_use]
    pub fn with_public(mut self, record: NodeRecord) -> Self {
        self.public.push(record);
        self
    }

    /// Add several public rows.
    #[must_use]
    pub fn with_records(mut self, records: impl IntoIterator<Item = NodeRecord>) -> Self {
        self.public.extend(records);
        self
    }

    /// Add a private row.
    #[must_use]
    pub fn with_private(mut self, record: NodeRecord) -> Self {
        self.private.push(record);
        self
    }

    /// Add an additional row.
    #[must_use]
    pub fn with_additional(mut self, record: NodeRecord) -> Self {
        self.additional.push(record);
        self
    }

    /// Make every public query fail with the given kind.
    ///
    /// `Timeout` and `Unavailable` failures are marked temporary.
    #[must_use]
    pub fn failing(mut self, kind: SourceErrorKind) -> Self {
        self.failure = Some(kind);
        self
    }

    /// Number of `public_nodes` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl NodeSource for MockSource {
    fn public_nodes(&self) -> Result<Vec<NodeRecord>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.failure {
            let status = match kind {
                SourceErrorKind::Timeout | SourceErrorKind::Unavailable => ErrorStatus::Temporary,
                SourceErrorKind::InvalidRecord => ErrorStatus::Permanent,
            };
            return Err(SourceError::new(kind)
                .with_backend("Mock")
                .with_status(status));
        }
        Ok(self.public.clone())
    }

    fn private_nodes(&self) -> Result<Vec<NodeRecord>, SourceError> {
        Ok(self.private.clone())
    }

    fn additional_nodes(&self) -> Result<Vec<NodeRecord>, SourceError> {
        Ok(self.additional.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_mock_source_is_send_sync() {
        assert_send_sync::<MockSource>();
    }

    #[test]
    fn test_new_empty() {
        let source = MockSource::new();

        assert!(source.public_nodes().unwrap().is_empty());
        assert!(source.private_nodes().unwrap().is_empty());
        assert!(source.additional_nodes().unwrap().is_empty());
    }

    #[test]
    fn test_with_rows_per_set() {
        let source = MockSource::new()
            .with_public(NodeRecord::new(1, 0, "home"))
            .with_private(NodeRecord::new(2, 1, "board"))
            .with_additional(NodeRecord::new(3, 1, "extra"));

        assert_eq!(source.public_nodes().unwrap()[0].id, 1);
        assert_eq!(source.private_nodes().unwrap()[0].id, 2);
        assert_eq!(source.additional_nodes().unwrap()[0].id, 3);
    }

    #[test]
    fn test_fetch_count_tracks_public_queries() {
        let source = MockSource::new().with_records([NodeRecord::new(1, 0, "home")]);

        assert_eq!(source.fetch_count(), 0);
        let _ = source.public_nodes();
        let _ = source.public_nodes();

        assert_eq!(source.fetch_count(), 2);
    }

    #[test]
    fn test_failing_source_keeps_failing() {
        let source = MockSource::new().failing(SourceErrorKind::Unavailable);

        let first = source.public_nodes().unwrap_err();
        let second = source.public_nodes().unwrap_err();

        assert_eq!(first.kind, SourceErrorKind::Unavailable);
        assert_eq!(first.backend, Some("Mock"));
        assert_eq!(second.kind, SourceErrorKind::Unavailable);
        assert!(first.is_temporary());
    }

    #[test]
    fn test_failing_invalid_record_is_permanent() {
        let source = MockSource::new().failing(SourceErrorKind::InvalidRecord);

        let err = source.public_nodes().unwrap_err();

        assert_eq!(err.status, ErrorStatus::Permanent);
        assert!(!err.is_temporary());
    }
}

//! Row source trait and error types.
//!
//! Provides the [`NodeSource`] trait that feeds flat node records into the
//! tree builder, along with [`SourceError`] for unified error handling across
//! backends.
//!
//! # Filtering Contract
//!
//! Sources return rows already filtered for the current viewer's permissions
//! and the active content stage. Consumers never re-check permissions.

use crate::record::NodeRecord;

/// Semantic error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceErrorKind {
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Query timed out.
    Timeout,
    /// A row could not be decoded into a [`NodeRecord`].
    InvalidRecord,
}

/// Retry guidance.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (bad data, denied).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
}

/// Source error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct SourceError {
    /// Semantic error category.
    pub kind: SourceErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Backend identifier (e.g., "Memory", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    /// Create a new source error.
    #[must_use]
    pub fn new(kind: SourceErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            backend: None,
            source: None,
        }
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// True if retrying the query may succeed.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.status == ErrorStatus::Temporary
    }

    /// Create an invalid record error from a decode failure.
    #[must_use]
    pub fn invalid_record(err: serde_json::Error) -> Self {
        Self::new(SourceErrorKind::InvalidRecord).with_source(err)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            SourceErrorKind::Unavailable => "Unavailable",
            SourceErrorKind::Timeout => "Timeout",
            SourceErrorKind::InvalidRecord => "Invalid record",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Row source for the page hierarchy.
///
/// The tree builder concatenates the three record sets in order:
/// public, private, additional. Only [`public_nodes`](Self::public_nodes)
/// is mandatory; the other two default to empty sets.
///
/// Implementations are expected to apply viewer permissions and content
/// stage selection before returning rows.
pub trait NodeSource: Send + Sync {
    /// Nodes visible through the coarse view classifier.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the query fails.
    fn public_nodes(&self) -> Result<Vec<NodeRecord>, SourceError>;

    /// Nodes restricted to specific viewer groups that the viewer may see.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the query fails.
    fn private_nodes(&self) -> Result<Vec<NodeRecord>, SourceError> {
        Ok(Vec::new())
    }

    /// Extension point for deployment-specific extra rows.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the query fails.
    fn additional_nodes(&self) -> Result<Vec<NodeRecord>, SourceError> {
        Ok(Vec::new())
    }
}

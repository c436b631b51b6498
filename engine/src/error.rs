use thiserror::Error;

/// Typed failures surfaced by build and query operations.
///
/// Build-time per-document failures (`DataIntegrity`, `ResourceLimit`) are
/// recorded against the offending document and never abort a build. A query
/// term or pattern with no matches is a successful empty response, not an
/// error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("empty query")]
    EmptyQuery,

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("pattern evaluation exceeded its time budget")]
    PatternTimeout,

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("unreadable or corrupt data: {0}")]
    DataIntegrity(String),

    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
}

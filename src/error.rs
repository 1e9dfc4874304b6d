use thiserror::Error;

/// Failures surfaced by [`crate::transform`].
///
/// Unmatched import sources and call shapes the removal transform cannot
/// classify are not errors; they pass through unchanged. Only configuration
/// problems, parser diagnostics, printer failures, and internal invariant
/// breaches abort a call.
#[derive(Debug, Error)]
pub enum Error {
    /// A rewrite rule is unusable: a template is missing the `{}` marker, or
    /// the rule configures neither a JS nor a CSS replacement.
    #[error("malformed rewrite config: {0}")]
    MalformedConfig(String),

    /// The parser reported diagnostics for the input module.
    #[error("parse error: {0}")]
    Parse(String),

    /// The printer or source-map builder failed.
    #[error("emit error: {0}")]
    Emit(String),

    /// An engine invariant broke (e.g. scope stack underflow). The module is
    /// abandoned rather than partially rewritten.
    #[error("internal invariant violation: {0}")]
    Internal(String),
}

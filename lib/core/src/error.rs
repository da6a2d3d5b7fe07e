//! Error handling foundation for the FlowForge dashboard.
//!
//! Each crate defines its own domain error enum with `thiserror`. This module
//! only provides the shared `Result` alias and the identifier parse error.

/// A Result type alias defaulting the error to [`ParseIdError`].
///
/// Crates pass their own error type as the second parameter.
pub type Result<T, E = ParseIdError> = std::result::Result<T, E>;

/// Error returned when an identifier cannot be built from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse {id_type}: {reason}")]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseIdError {
            id_type: "NodeId",
            reason: "empty".to_string(),
        };
        assert_eq!(err.to_string(), "failed to parse NodeId: empty");
    }

    #[test]
    fn result_alias_accepts_custom_error() {
        let res: Result<u8, &'static str> = Err("nope");
        assert_eq!(res, Err("nope"));
    }
}

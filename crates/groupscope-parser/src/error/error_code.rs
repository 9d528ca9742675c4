//! Error codes for the grouping diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E1xx` - Grouping parser errors and warnings
//! - `E2xx` - Inference stack errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Grouping Parser (E1xx)
    // =========================================================================
    /// Missing operator.
    ///
    /// An item other than the first one in its group is not preceded by a
    /// recognized operator.
    E100,

    /// Unterminated group.
    ///
    /// The input or an enclosing end condition was reached inside a `(` that
    /// was never closed.
    E101,

    /// Unbalanced closing parenthesis.
    ///
    /// A `)` was found with no open group to close.
    E102,

    /// Empty group.
    ///
    /// A `()` pair contains nothing. The group is dropped.
    E103,

    /// Fragment rejected.
    ///
    /// The fragment parser could not make sense of the text at this position.
    E104,

    /// Nesting too deep.
    ///
    /// A `(` would open more nested groups than the parser allows.
    E105,

    // =========================================================================
    // Inference Stack (E2xx)
    // =========================================================================
    /// Stack index out of range.
    E200,

    /// Inference stack mismatch.
    ///
    /// A reorder request does not name exactly the parsers on the stack.
    E201,

    /// Inference stack resolution failure.
    E202,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E100").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "missing operator",
            ErrorCode::E101 => "unterminated group",
            ErrorCode::E102 => "unbalanced closing parenthesis",
            ErrorCode::E103 => "empty group",
            ErrorCode::E104 => "fragment rejected",
            ErrorCode::E105 => "nesting too deep",
            ErrorCode::E200 => "stack index out of range",
            ErrorCode::E201 => "inference stack mismatch",
            ErrorCode::E202 => "inference stack resolution failure",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E202.as_str(), "E202");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E101.description(), "unterminated group");
        assert_eq!(ErrorCode::E201.description(), "inference stack mismatch");
    }
}

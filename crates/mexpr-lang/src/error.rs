use mexpr_core::Diag;
use thiserror::Error;

/// Errors raised while validating or rewriting an expression.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unmatched opening parenthesis {0}")]
    UnmatchedOpeningPar(Diag),

    #[error("unmatched closing parenthesis {0}")]
    UnmatchedClosingPar(Diag),

    /// A character survived the erasure of every known construct.
    #[error("unknown symbol {0}")]
    UnknownSymbol(Diag),

    /// An identifier directly follows a numeric literal, e.g. `2x`.
    #[error("invalid name {0}")]
    InvalidName(Diag),

    /// Operand counting selected an `(name, largs, rargs)` triple that no
    /// operator descriptor provides.
    #[error("operator not found {0}")]
    OperatorNotFound(Diag),
}

/// Errors raised while compiling a token sequence.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// A token with no text at all.
    #[error("null token {0}")]
    NullToken(Diag),

    /// A token that resolves to nothing in the run-time environment.
    #[error("unknown token {0}")]
    UnknownToken(Diag),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_carries_diag() {
        let e = ParseError::UnknownSymbol(Diag::new("validate", 12, "$"));
        assert_eq!(e.to_string(), "unknown symbol [validate:12] $");
    }

    #[test]
    fn compile_error_display() {
        let e = CompileError::UnknownToken(Diag::new("compile", 3, "foo"));
        assert_eq!(e.to_string(), "unknown token [compile:3] foo");
    }
}

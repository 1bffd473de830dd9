use mexpr_core::Diag;

/// Runtime error during instruction execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecError {
    /// An assignment found something other than a variable load at the
    /// expected instruction offset.
    InvalidAssign(Diag),
    /// A function popped from an empty value stack.
    StackUnderflow(Diag),
    /// The machine was run without a program.
    NoProgram(Diag),
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecError::InvalidAssign(d) => write!(f, "invalid assignment {}", d),
            ExecError::StackUnderflow(d) => write!(f, "value stack underflow {}", d),
            ExecError::NoProgram(d) => write!(f, "no program loaded {}", d),
        }
    }
}

impl std::error::Error for ExecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_error_display() {
        let e = ExecError::InvalidAssign(Diag::new("call", 10, "="));
        assert_eq!(e.to_string(), "invalid assignment [call:10] =");
    }
}

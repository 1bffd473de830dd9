use crate::error::ExecError;
use crate::rte::Rte;

pub use crate::value::FunRef;

/// A callable registered in the run-time environment.
///
/// A function reads `values_in()` values from the value stack (the top of the
/// stack is the rightmost argument) and pushes `values_out()` values. For
/// operators the input count splits into `lvalues_in()` left and
/// `rvalues_in()` right values; the invariant `values_in == lvalues_in +
/// rvalues_in` must hold. Implementations are immutable after construction
/// and shared through [`FunRef`] handles.
pub trait Function<T> {
    fn name(&self) -> &str;

    /// Number of input values read from the value stack.
    fn values_in(&self) -> usize;

    /// Number of output values placed on the value stack.
    fn values_out(&self) -> usize;

    /// Number of left-side input values; nonzero only for infix operators.
    fn lvalues_in(&self) -> usize;

    /// Number of right-side input values.
    fn rvalues_in(&self) -> usize {
        self.values_in() - self.lvalues_in()
    }

    /// Apply the function against the run-time environment.
    fn call(&self, rte: &mut Rte<T>) -> Result<(), ExecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    impl Function<f64> for Nop {
        fn name(&self) -> &str {
            "nop"
        }
        fn values_in(&self) -> usize {
            2
        }
        fn values_out(&self) -> usize {
            1
        }
        fn lvalues_in(&self) -> usize {
            1
        }
        fn call(&self, _rte: &mut Rte<f64>) -> Result<(), ExecError> {
            Ok(())
        }
    }

    #[test]
    fn rvalues_default_is_in_minus_left() {
        let f = Nop;
        assert_eq!(f.rvalues_in(), 1);
    }
}

/// Parser-side description of an operator.
///
/// `largs` and `rargs` give the dimensionality of each operand (3 for a
/// triple), not the number of operands; `operands` is 1 or 2. With
/// `swap = true` the rewriter emits the arguments right-then-left, which is
/// how assignment places its target variable immediately before the `=`
/// token (`x = 2` becomes `2 x =`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorDef {
    name: String,
    operands: usize,
    largs: usize,
    rargs: usize,
    outvals: usize,
    swap: bool,
}

impl OperatorDef {
    /// Create a descriptor with scalar operands and one result value.
    pub fn new(name: impl Into<String>, operands: usize) -> Self {
        Self {
            name: name.into(),
            operands,
            largs: 1,
            rargs: 1,
            outvals: 1,
            swap: false,
        }
    }

    /// Set operand and result dimensions.
    pub fn dims(mut self, largs: usize, rargs: usize, outvals: usize) -> Self {
        self.largs = largs;
        self.rargs = rargs;
        self.outvals = outvals;
        self
    }

    /// Request right-then-left argument emission.
    pub fn swap(mut self) -> Self {
        self.swap = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operands(&self) -> usize {
        self.operands
    }

    /// Dimension of the left operand.
    pub fn largs(&self) -> usize {
        self.largs
    }

    /// Dimension of the right operand.
    pub fn rargs(&self) -> usize {
        self.rargs
    }

    /// Dimension of the result.
    pub fn outvals(&self) -> usize {
        self.outvals
    }

    pub fn swapped(&self) -> bool {
        self.swap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_def_defaults() {
        let op = OperatorDef::new("+", 2);
        assert_eq!(op.name(), "+");
        assert_eq!(op.operands(), 2);
        assert_eq!(op.largs(), 1);
        assert_eq!(op.rargs(), 1);
        assert_eq!(op.outvals(), 1);
        assert!(!op.swapped());
    }

    #[test]
    fn operator_def_dims() {
        let op = OperatorDef::new("+", 2).dims(3, 3, 3);
        assert_eq!(op.largs(), 3);
        assert_eq!(op.rargs(), 3);
        assert_eq!(op.outvals(), 3);
    }

    #[test]
    fn operator_def_swap() {
        let op = OperatorDef::new("=", 2).swap();
        assert!(op.swapped());
    }

    #[test]
    fn operator_def_unary() {
        let op = OperatorDef::new("-", 1).dims(0, 1, 1);
        assert_eq!(op.operands(), 1);
        assert_eq!(op.largs(), 0);
        assert_eq!(op.rargs(), 1);
    }
}

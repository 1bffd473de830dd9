//! Vector operations: elementwise lifting of scalar binaries, dot product
//! and cross product over triples.
//!
//! Vectors live flattened on the value stack; the stack top holds the last
//! component of the rightmost operand.

use mexpr_vm::{ExecError, FunRef, Function, Rte};
use smallvec::SmallVec;

type Components = SmallVec<[f64; 4]>;

fn pop_components(rte: &mut Rte<f64>, n: usize) -> Result<Components, ExecError> {
    let mut v = Components::new();
    for _ in 0..n {
        v.push(rte.pop()?);
    }
    Ok(v)
}

/// Lift a scalar infix operator to fixed-dimension operands, applying it
/// componentwise: `(1,2,3) + (4,5,6)` is `(5,7,9)`.
pub struct VectorApply {
    n: usize,
    inner: FunRef<f64>,
}

impl VectorApply {
    /// Only scalar infix binaries (one value on each side) can be lifted.
    pub fn lift(inner: FunRef<f64>, n: usize) -> Option<Self> {
        if inner.lvalues_in() != 1 || inner.rvalues_in() != 1 {
            return None;
        }
        Some(Self { n, inner })
    }
}

impl Function<f64> for VectorApply {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn values_in(&self) -> usize {
        2 * self.n
    }

    fn values_out(&self) -> usize {
        self.n
    }

    fn lvalues_in(&self) -> usize {
        self.n
    }

    fn call(&self, rte: &mut Rte<f64>) -> Result<(), ExecError> {
        let right = pop_components(rte, self.n)?;
        let left = pop_components(rte, self.n)?;
        let mut out = Components::new();
        for i in 0..self.n {
            rte.push(left[i]);
            rte.push(right[i]);
            self.inner.call(rte)?;
            out.push(rte.pop()?);
        }
        for &v in out.iter().rev() {
            rte.push(v);
        }
        Ok(())
    }
}

/// Dot product over triples, registered under `*`: 6 values in, 1 out.
pub struct Dot3;

impl Function<f64> for Dot3 {
    fn name(&self) -> &str {
        "*"
    }

    fn values_in(&self) -> usize {
        6
    }

    fn values_out(&self) -> usize {
        1
    }

    fn lvalues_in(&self) -> usize {
        3
    }

    fn call(&self, rte: &mut Rte<f64>) -> Result<(), ExecError> {
        let z2 = rte.pop()?;
        let y2 = rte.pop()?;
        let x2 = rte.pop()?;
        let z1 = rte.pop()?;
        let y1 = rte.pop()?;
        let x1 = rte.pop()?;
        rte.push(x1 * x2 + y1 * y2 + z1 * z2);
        Ok(())
    }
}

/// Cross product over triples, a prefix function of 6 inputs and 3 outputs.
pub struct Cross3;

impl Function<f64> for Cross3 {
    fn name(&self) -> &str {
        "cross3"
    }

    fn values_in(&self) -> usize {
        6
    }

    fn values_out(&self) -> usize {
        3
    }

    fn lvalues_in(&self) -> usize {
        0
    }

    fn call(&self, rte: &mut Rte<f64>) -> Result<(), ExecError> {
        let z2 = rte.pop()?;
        let y2 = rte.pop()?;
        let x2 = rte.pop()?;
        let z1 = rte.pop()?;
        let y1 = rte.pop()?;
        let x1 = rte.pop()?;
        rte.push(y1 * z2 - y2 * z1);
        rte.push(x2 * z1 - x1 * z2);
        rte.push(x1 * y2 - x2 * y1);
        Ok(())
    }
}

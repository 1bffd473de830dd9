//! Assignment functions.
//!
//! Assignment is an ordinary function, not a dedicated instruction. Because
//! the parser emits the target after the value (`x = 2` becomes `2 x =`),
//! the function can locate its destination by requiring a variable load at
//! the instruction directly before the one currently executing. Any
//! transformation that reorders or removes instructions ahead of an `=`
//! therefore breaks assignment.

use mexpr_core::Diag;
use mexpr_vm::{CellRef, ExecError, Function, Rte};
use smallvec::SmallVec;

/// Find the variable cell loaded `back + 1` instructions before the current
/// one, failing when that slot is not a variable load.
fn assign_target(rte: &Rte<f64>, back: usize) -> Result<CellRef<f64>, ExecError> {
    rte.ip
        .checked_sub(1 + back)
        .and_then(|i| rte.instruction(i))
        .and_then(|inst| inst.loaded_var())
        .cloned()
        .ok_or_else(|| ExecError::InvalidAssign(Diag::new("assign_target", line!(), "=")))
}

/// Scalar assignment: `2 x =` writes 2 into `x` and leaves 2 on the stack,
/// so chained assignments evaluate.
pub struct ScalarAssign;

impl Function<f64> for ScalarAssign {
    fn name(&self) -> &str {
        "="
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

    fn call(&self, rte: &mut Rte<f64>) -> Result<(), ExecError> {
        // drop the target's loaded value; the assigned value stays on top
        rte.pop()?;
        let cell = assign_target(rte, 0)?;
        let val = rte
            .stack
            .last()
            .copied()
            .ok_or_else(|| ExecError::StackUnderflow(Diag::new("call", line!(), "=")))?;
        cell.borrow_mut().val = val;
        Ok(())
    }
}

/// Fixed-dimension vector assignment: `1 2 3 x y z =` writes componentwise
/// and re-pushes the assigned values in their original order.
pub struct VectorAssign {
    n: usize,
}

impl VectorAssign {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl Function<f64> for VectorAssign {
    fn name(&self) -> &str {
        "="
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
        // drop the targets' loaded values
        for _ in 0..self.n {
            rte.pop()?;
        }
        // the load of the last target sits directly before this call; walk
        // backwards through the previous n instructions
        let mut vals = SmallVec::<[f64; 4]>::new();
        for i in 0..self.n {
            let cell = assign_target(rte, i)?;
            let v = rte.pop()?;
            cell.borrow_mut().val = v;
            vals.push(v);
        }
        for &v in vals.iter().rev() {
            rte.push(v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use mexpr_vm::{Cell, Instruction, Vm};

    #[test]
    fn scalar_assign_writes_cell_and_keeps_value() {
        let x = Cell::shared("x", 0.0);
        let mut rte = Rte::new();
        rte.variables.push(Rc::clone(&x));
        let mut vm = Vm::new(rte);
        vm.set_prog(Rc::from([
            Instruction::LoadVal(2.0),
            Instruction::LoadVar(Rc::clone(&x)),
            Instruction::CallFun(Rc::new(ScalarAssign)),
        ]));

        vm.run(0).unwrap();

        assert_eq!(x.borrow().val, 2.0);
        assert_eq!(vm.rte().stack, vec![2.0]);
    }

    #[test]
    fn scalar_assign_requires_variable_load_before_it() {
        let mut vm = Vm::new(Rte::new());
        vm.set_prog(Rc::from([
            Instruction::LoadVal(2.0),
            Instruction::LoadVal(3.0),
            Instruction::CallFun(Rc::new(ScalarAssign)),
        ]));

        assert!(matches!(vm.run(0), Err(ExecError::InvalidAssign(_))));
    }

    #[test]
    fn vector_assign_writes_componentwise() {
        let x = Cell::shared("x", 0.0);
        let y = Cell::shared("y", 0.0);
        let z = Cell::shared("z", 0.0);
        let mut rte = Rte::new();
        rte.variables
            .extend([Rc::clone(&x), Rc::clone(&y), Rc::clone(&z)]);
        let mut vm = Vm::new(rte);
        vm.set_prog(Rc::from([
            Instruction::LoadVal(1.0),
            Instruction::LoadVal(2.0),
            Instruction::LoadVal(3.0),
            Instruction::LoadVar(Rc::clone(&x)),
            Instruction::LoadVar(Rc::clone(&y)),
            Instruction::LoadVar(Rc::clone(&z)),
            Instruction::CallFun(Rc::new(VectorAssign::new(3))),
        ]));

        vm.run(0).unwrap();

        assert_eq!(x.borrow().val, 1.0);
        assert_eq!(y.borrow().val, 2.0);
        assert_eq!(z.borrow().val, 3.0);
        // assigned values remain, original order preserved
        assert_eq!(vm.rte().stack, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn vector_assign_rejects_non_variable_slot() {
        let x = Cell::shared("x", 0.0);
        let mut rte = Rte::new();
        rte.variables.push(Rc::clone(&x));
        let mut vm = Vm::new(rte);
        vm.set_prog(Rc::from([
            Instruction::LoadVal(1.0),
            Instruction::LoadVal(2.0),
            Instruction::LoadVal(9.0), // should have been a variable load
            Instruction::LoadVar(x),
            Instruction::CallFun(Rc::new(VectorAssign::new(2))),
        ]));

        assert!(matches!(vm.run(0), Err(ExecError::InvalidAssign(_))));
    }
}

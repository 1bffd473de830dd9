use std::rc::Rc;

use crate::error::ExecError;
use crate::rte::Rte;
use crate::value::{CellRef, FunRef};

/// A compiled instruction.
#[derive(Clone)]
pub enum Instruction<T> {
    /// Push a literal value.
    LoadVal(T),
    /// Push the current value of a shared variable cell.
    LoadVar(CellRef<T>),
    /// Invoke a function object.
    CallFun(FunRef<T>),
}

/// An ordered instruction sequence, addressed by index.
///
/// Programs are shared: the RTE holds a handle to the program it is running,
/// and function objects may inspect it through the RTE (assignment locates
/// its target by looking at the instructions preceding the current one).
pub type Program<T> = Rc<[Instruction<T>]>;

impl<T: Clone> Instruction<T> {
    /// Apply the instruction's effect to the run-time environment.
    pub fn exec(&self, rte: &mut Rte<T>) -> Result<(), ExecError> {
        match self {
            Instruction::LoadVal(v) => {
                rte.stack.push(v.clone());
                Ok(())
            }
            Instruction::LoadVar(cell) => {
                rte.stack.push(cell.borrow().val.clone());
                Ok(())
            }
            Instruction::CallFun(f) => f.call(rte),
        }
    }

    /// The variable cell referenced by a `LoadVar`, if that is what this is.
    pub fn loaded_var(&self) -> Option<&CellRef<T>> {
        match self {
            Instruction::LoadVar(cell) => Some(cell),
            _ => None,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Instruction<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::LoadVal(v) => write!(f, "LoadVal({:?})", v),
            Instruction::LoadVar(cell) => write!(f, "LoadVar({})", cell.borrow().name),
            Instruction::CallFun(fun) => write!(f, "CallFun({})", fun.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Cell;

    #[test]
    fn load_val_pushes() {
        let mut rte: Rte<f64> = Rte::new();
        Instruction::LoadVal(3.5).exec(&mut rte).unwrap();
        assert_eq!(rte.stack, vec![3.5]);
    }

    #[test]
    fn load_var_pushes_current_value() {
        let mut rte: Rte<f64> = Rte::new();
        let cell = Cell::shared("x", 1.0);
        let inst = Instruction::LoadVar(Rc::clone(&cell));

        inst.exec(&mut rte).unwrap();
        cell.borrow_mut().val = 2.0;
        inst.exec(&mut rte).unwrap();

        assert_eq!(rte.stack, vec![1.0, 2.0]);
    }

    #[test]
    fn loaded_var_distinguishes_variants() {
        let cell = Cell::shared("x", 0.0);
        assert!(Instruction::LoadVar(cell).loaded_var().is_some());
        assert!(Instruction::<f64>::LoadVal(1.0).loaded_var().is_none());
    }
}

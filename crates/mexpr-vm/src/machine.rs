use mexpr_core::Diag;

use crate::error::ExecError;
use crate::instruction::Program;
use crate::rte::Rte;

/// The stack machine: a linear instruction dispatcher over an [`Rte`].
pub struct Vm<T> {
    rte: Rte<T>,
}

impl<T: Clone> Vm<T> {
    /// Create a machine around a run-time environment.
    pub fn new(rte: Rte<T>) -> Self {
        Self { rte }
    }

    pub fn rte(&self) -> &Rte<T> {
        &self.rte
    }

    pub fn rte_mut(&mut self) -> &mut Rte<T> {
        &mut self.rte
    }

    /// The active program, if any.
    pub fn prog(&self) -> Option<Program<T>> {
        self.rte.prog.clone()
    }

    /// Set the active program.
    pub fn set_prog(&mut self, prog: Program<T>) {
        self.rte.prog = Some(prog);
    }

    /// Execute the active program from `entry`.
    ///
    /// The instruction pointer is set to `entry` and incremented after each
    /// instruction's effect has been applied; instructions are free to read
    /// or modify `rte.ip` themselves. The first failing instruction aborts
    /// the run.
    pub fn run(&mut self, entry: usize) -> Result<(), ExecError> {
        let prog = self
            .rte
            .prog
            .clone()
            .ok_or_else(|| ExecError::NoProgram(Diag::new("run", line!(), "")))?;
        self.rte.ip = entry;
        while self.rte.ip < prog.len() {
            prog[self.rte.ip].exec(&mut self.rte)?;
            self.rte.ip += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::instruction::Instruction;
    use crate::value::Cell;

    #[test]
    fn run_without_program_fails() {
        let mut vm: Vm<f64> = Vm::new(Rte::new());
        assert!(matches!(vm.run(0), Err(ExecError::NoProgram(_))));
    }

    #[test]
    fn run_empty_program() {
        let mut vm: Vm<f64> = Vm::new(Rte::new());
        vm.set_prog(Rc::from([] as [Instruction<f64>; 0]));
        vm.run(0).unwrap();
        assert!(vm.rte().stack.is_empty());
    }

    #[test]
    fn run_pushes_literals_in_order() {
        let mut vm: Vm<f64> = Vm::new(Rte::new());
        vm.set_prog(Rc::from([
            Instruction::LoadVal(1.0),
            Instruction::LoadVal(2.0),
        ]));
        vm.run(0).unwrap();
        assert_eq!(vm.rte().stack, vec![1.0, 2.0]);
    }

    #[test]
    fn run_from_entry_skips_prefix() {
        let mut vm: Vm<f64> = Vm::new(Rte::new());
        vm.set_prog(Rc::from([
            Instruction::LoadVal(1.0),
            Instruction::LoadVal(2.0),
        ]));
        vm.run(1).unwrap();
        assert_eq!(vm.rte().stack, vec![2.0]);
    }

    #[test]
    fn run_loads_variables_through_shared_cells() {
        let cell = Cell::shared("x", 4.0);
        let mut rte: Rte<f64> = Rte::new();
        rte.variables.push(Rc::clone(&cell));
        let mut vm = Vm::new(rte);
        vm.set_prog(Rc::from([Instruction::LoadVar(cell)]));
        vm.run(0).unwrap();
        assert_eq!(vm.rte().stack, vec![4.0]);
    }
}

//! User-defined procedures: function objects that own a private machine and
//! an embedded compiled program.

use std::cell::RefCell;

use mexpr_vm::{ExecError, Function, Program, Rte, Vm};

/// A compiled user function.
///
/// On invocation the procedure pops its inputs from the caller's stack into
/// its own variable table (first declared variable first), runs the embedded
/// program on its private machine, then moves its outputs from the private
/// stack onto the caller's stack. The caller's execution stack records the
/// return index around the nested run.
pub struct Procedure {
    name: String,
    values_in: usize,
    values_out: usize,
    lvalues_in: usize,
    vm: RefCell<Vm<f64>>,
}

impl Procedure {
    pub fn new(
        name: impl Into<String>,
        prog: Program<f64>,
        rte: Rte<f64>,
        values_in: usize,
        values_out: usize,
        lvalues_in: usize,
    ) -> Self {
        let mut vm = Vm::new(rte);
        vm.set_prog(prog);
        Self {
            name: name.into(),
            values_in,
            values_out,
            lvalues_in,
            vm: RefCell::new(vm),
        }
    }
}

impl Function<f64> for Procedure {
    fn name(&self) -> &str {
        &self.name
    }

    fn values_in(&self) -> usize {
        self.values_in
    }

    fn values_out(&self) -> usize {
        self.values_out
    }

    fn lvalues_in(&self) -> usize {
        self.lvalues_in
    }

    fn call(&self, rt: &mut Rte<f64>) -> Result<(), ExecError> {
        let mut vm = self.vm.borrow_mut();

        // move arguments into the local variables in table order
        let takes = self.values_in.min(vm.rte().variables.len());
        for i in 0..takes {
            let v = rt.pop()?;
            vm.rte_mut().variables[i].borrow_mut().val = v;
        }

        rt.exe_stack.push(rt.ip);
        let outcome = vm.run(0);
        rt.exe_stack.pop();
        outcome?;

        // move results onto the caller's stack
        for _ in 0..self.values_out {
            let v = vm.rte_mut().pop()?;
            rt.push(v);
        }
        Ok(())
    }
}

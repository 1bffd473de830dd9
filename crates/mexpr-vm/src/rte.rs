use std::rc::Rc;

use mexpr_core::Diag;

use crate::error::ExecError;
use crate::instruction::Program;
use crate::value::{CellRef, FunRef};

/// Run-time environment: the data a program executes against.
///
/// Holds the function, variable and constant tables, the value stack, the
/// execution stack (return indices for nested procedure calls), the active
/// program and the instruction pointer. The tables keep insertion order;
/// lookups are linear scans, so earlier entries win when arity is not
/// constrained.
pub struct Rte<T> {
    /// Function table; order defines resolution precedence.
    pub functions: Vec<FunRef<T>>,
    /// Variable table; grown by the compiler when variable creation is on.
    pub variables: Vec<CellRef<T>>,
    /// Constant table; cells are never written after construction.
    pub constants: Vec<CellRef<T>>,
    /// Value stack.
    pub stack: Vec<T>,
    /// Execution stack: return indices for nested procedure calls.
    pub exe_stack: Vec<usize>,
    /// Program being executed, if any.
    pub prog: Option<Program<T>>,
    /// Index of the instruction currently executing.
    pub ip: usize,
}

impl<T> Rte<T> {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::with_tables(Vec::new(), Vec::new(), Vec::new())
    }

    /// Create an environment from pre-built tables.
    pub fn with_tables(
        functions: Vec<FunRef<T>>,
        variables: Vec<CellRef<T>>,
        constants: Vec<CellRef<T>>,
    ) -> Self {
        Self {
            functions,
            variables,
            constants,
            stack: Vec::new(),
            exe_stack: Vec::new(),
            prog: None,
            ip: 0,
        }
    }

    /// First function with the given name, regardless of arity.
    pub fn function_by_name(&self, name: &str) -> Option<FunRef<T>> {
        self.functions
            .iter()
            .find(|f| f.name() == name)
            .map(Rc::clone)
    }

    /// Function with the given name and exact right/left input counts.
    pub fn function_with_arity(
        &self,
        name: &str,
        rargs: usize,
        largs: usize,
    ) -> Option<FunRef<T>> {
        self.functions
            .iter()
            .find(|f| f.name() == name && f.rvalues_in() == rargs && f.lvalues_in() == largs)
            .map(Rc::clone)
    }

    /// Variable cell with the given name.
    pub fn variable(&self, name: &str) -> Option<CellRef<T>> {
        self.variables
            .iter()
            .find(|c| c.borrow().name == name)
            .map(Rc::clone)
    }

    /// Constant cell with the given name.
    pub fn constant(&self, name: &str) -> Option<CellRef<T>> {
        self.constants
            .iter()
            .find(|c| c.borrow().name == name)
            .map(Rc::clone)
    }

    /// Push a value onto the value stack.
    pub fn push(&mut self, v: T) {
        self.stack.push(v);
    }

    /// Pop the value stack, failing on underflow.
    pub fn pop(&mut self) -> Result<T, ExecError> {
        self.stack
            .pop()
            .ok_or_else(|| ExecError::StackUnderflow(Diag::new("pop", line!(), "")))
    }

    /// The instruction at `index` of the active program.
    pub fn instruction(&self, index: usize) -> Option<&crate::Instruction<T>> {
        self.prog.as_ref().and_then(|p| p.get(index))
    }
}

impl<T> Default for Rte<T> {
    fn default() -> Self {
        Self::new()
    }
}

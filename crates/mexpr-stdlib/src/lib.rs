//! Default function library and run-time environment for mexpr.
//!
//! Provides:
//! - Scalar math builtins (unary and binary tables)
//! - Scalar and fixed-dimension vector assignment
//! - Elementwise lifting of the infix binaries over triples
//! - Dot and cross product
//! - User-defined procedures with a private machine
//! - The default operator descriptor table and default RTE

pub mod assign;
pub mod builtins;
pub mod procedure;
pub mod vector;

use std::rc::Rc;

use mexpr_core::OperatorDef;
use mexpr_vm::{Cell, CellRef, FunRef, Rte};

pub use assign::{ScalarAssign, VectorAssign};
pub use builtins::{binary_functions, unary_functions, BinaryFn, UnaryFn};
pub use procedure::Procedure;
pub use vector::{Cross3, Dot3, VectorApply};

/// The default operator descriptor table.
///
/// Declaration order doubles as rewrite order: `^` binds before `*` and `/`,
/// which bind before `-` and `+`; assignment comes last and swaps its
/// operands so the target variable lands directly before the `=` token.
pub fn default_operators() -> Vec<OperatorDef> {
    vec![
        OperatorDef::new("cross3", 1).dims(0, 6, 3),
        OperatorDef::new("^", 2),
        OperatorDef::new("*", 2).dims(3, 3, 1),
        OperatorDef::new("*", 2),
        OperatorDef::new("/", 2),
        OperatorDef::new("%", 2),
        OperatorDef::new("-", 1).dims(0, 1, 1),
        OperatorDef::new("-", 2),
        OperatorDef::new("-", 2).dims(3, 3, 3),
        OperatorDef::new("+", 2).dims(3, 3, 3),
        OperatorDef::new("+", 2),
        OperatorDef::new("=", 2).swap(),
        OperatorDef::new("=", 2).dims(2, 2, 2).swap(),
        OperatorDef::new("=", 2).dims(3, 3, 3).swap(),
        OperatorDef::new("=", 2).dims(4, 4, 4).swap(),
    ]
}

/// The default function table, in resolution order: scalar builtins, vector
/// assignments, cross and dot product, elementwise lifts of the infix
/// binaries, and scalar assignment last.
pub fn default_functions() -> Vec<FunRef<f64>> {
    let mut funs = unary_functions();
    funs.extend(binary_functions());

    funs.push(Rc::new(VectorAssign::new(4)));
    funs.push(Rc::new(VectorAssign::new(3)));
    funs.push(Rc::new(VectorAssign::new(2)));
    funs.push(Rc::new(Cross3));
    funs.push(Rc::new(Dot3));

    for f in binary_functions() {
        if let Some(lifted) = VectorApply::lift(f, 3) {
            funs.push(Rc::new(lifted));
        }
    }

    funs.push(Rc::new(ScalarAssign));
    funs
}

/// The default variables `x`, `y`, `z`, `w`, all zero.
pub fn default_variables() -> Vec<CellRef<f64>> {
    ["x", "y", "z", "w"]
        .into_iter()
        .map(|name| Cell::shared(name, 0.0))
        .collect()
}

/// The default constants `e`, `log2e` and `Pi`.
pub fn default_constants() -> Vec<CellRef<f64>> {
    vec![
        Cell::shared("e", std::f64::consts::E),
        Cell::shared("log2e", std::f64::consts::LOG2_E),
        Cell::shared("Pi", std::f64::consts::PI),
    ]
}

/// Assemble the default run-time environment.
pub fn default_rte() -> Rte<f64> {
    Rte::with_tables(default_functions(), default_variables(), default_constants())
}

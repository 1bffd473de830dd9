//! Scalar math builtins: wrappers turning plain function pointers into
//! [`Function`] objects, plus the default unary and binary tables.

use std::rc::Rc;

use mexpr_vm::{ExecError, FunRef, Function, Rte};

/// A unary builtin: one value in, one value out.
pub struct UnaryFn {
    name: &'static str,
    f: fn(f64) -> f64,
}

impl UnaryFn {
    pub fn new(name: &'static str, f: fn(f64) -> f64) -> Self {
        Self { name, f }
    }
}

impl Function<f64> for UnaryFn {
    fn name(&self) -> &str {
        self.name
    }

    fn values_in(&self) -> usize {
        1
    }

    fn values_out(&self) -> usize {
        1
    }

    fn lvalues_in(&self) -> usize {
        0
    }

    fn call(&self, rte: &mut Rte<f64>) -> Result<(), ExecError> {
        let v = rte.pop()?;
        rte.push((self.f)(v));
        Ok(())
    }
}

/// A binary builtin: two values in, one out. `left` is 1 for infix
/// operators (`a + b`) and 0 for prefix forms (`atan2(y, x)`).
pub struct BinaryFn {
    name: &'static str,
    f: fn(f64, f64) -> f64,
    left: usize,
}

impl BinaryFn {
    pub fn new(name: &'static str, f: fn(f64, f64) -> f64, left: usize) -> Self {
        Self { name, f, left }
    }
}

impl Function<f64> for BinaryFn {
    fn name(&self) -> &str {
        self.name
    }

    fn values_in(&self) -> usize {
        2
    }

    fn values_out(&self) -> usize {
        1
    }

    fn lvalues_in(&self) -> usize {
        self.left
    }

    fn call(&self, rte: &mut Rte<f64>) -> Result<(), ExecError> {
        // the stack top is the rightmost argument
        let b = rte.pop()?;
        let a = rte.pop()?;
        rte.push((self.f)(a, b));
        Ok(())
    }
}

fn neg(v: f64) -> f64 {
    -v
}

fn inv(v: f64) -> f64 {
    1.0 / v
}

fn add(a: f64, b: f64) -> f64 {
    a + b
}

fn sub(a: f64, b: f64) -> f64 {
    a - b
}

fn mul(a: f64, b: f64) -> f64 {
    a * b
}

fn div(a: f64, b: f64) -> f64 {
    a / b
}

fn rem(a: f64, b: f64) -> f64 {
    a % b
}

fn pow(a: f64, b: f64) -> f64 {
    a.powf(b)
}

fn atan2(a: f64, b: f64) -> f64 {
    a.atan2(b)
}

/// The default unary table. All entries are prefix forms, including the
/// negation registered under `-`.
pub fn unary_functions() -> Vec<FunRef<f64>> {
    let table: &[(&'static str, fn(f64) -> f64)] = &[
        ("abs", f64::abs),
        ("acos", f64::acos),
        ("asin", f64::asin),
        ("atan", f64::atan),
        ("ceil", f64::ceil),
        ("cos", f64::cos),
        ("cosh", f64::cosh),
        ("exp", f64::exp),
        ("floor", f64::floor),
        ("log", f64::ln),
        ("log10", f64::log10),
        ("sin", f64::sin),
        ("sinh", f64::sinh),
        ("sqrt", f64::sqrt),
        ("tan", f64::tan),
        ("inv", inv),
        ("-", neg),
    ];
    table
        .iter()
        .map(|&(name, f)| Rc::new(UnaryFn::new(name, f)) as FunRef<f64>)
        .collect()
}

/// The default binary table: infix operators first (one left operand), then
/// their prefix spellings and `atan2`.
pub fn binary_functions() -> Vec<FunRef<f64>> {
    let table: &[(&'static str, fn(f64, f64) -> f64, usize)] = &[
        ("^", pow, 1),
        ("*", mul, 1),
        ("/", div, 1),
        ("+", add, 1),
        ("-", sub, 1),
        ("%", rem, 1),
        ("add", add, 0),
        ("sub", sub, 0),
        ("div", div, 0),
        ("mul", mul, 0),
        ("pow", pow, 0),
        ("atan2", atan2, 0),
    ];
    table
        .iter()
        .map(|&(name, f, left)| Rc::new(BinaryFn::new(name, f, left)) as FunRef<f64>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unary_pops_one_pushes_one() {
        let f = UnaryFn::new("sqrt", f64::sqrt);
        let mut rte = Rte::new();
        rte.push(9.0);
        f.call(&mut rte).unwrap();
        assert_eq!(rte.stack, vec![3.0]);
    }

    #[test]
    fn binary_top_of_stack_is_right_argument() {
        let f = BinaryFn::new("-", sub, 1);
        let mut rte = Rte::new();
        rte.push(5.0);
        rte.push(2.0);
        f.call(&mut rte).unwrap();
        assert_eq!(rte.stack, vec![3.0]);
    }

    #[test]
    fn atan2_argument_order() {
        let f = BinaryFn::new("atan2", atan2, 0);
        let mut rte = Rte::new();
        rte.push(1.0); // y
        rte.push(0.0); // x
        f.call(&mut rte).unwrap();
        assert!((rte.stack[0] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn unary_underflow_propagates() {
        let f = UnaryFn::new("sin", f64::sin);
        let mut rte = Rte::new();
        assert!(matches!(f.call(&mut rte), Err(ExecError::StackUnderflow(_))));
    }

    #[test]
    fn tables_carry_expected_arities() {
        for f in unary_functions() {
            assert_eq!(f.values_in(), 1);
            assert_eq!(f.lvalues_in(), 0);
        }
        for f in binary_functions() {
            assert_eq!(f.values_in(), 2);
            assert!(f.lvalues_in() <= 1);
        }
    }

    #[test]
    fn infix_minus_differs_from_prefix_minus() {
        let unary = unary_functions();
        let neg = unary.iter().find(|f| f.name() == "-").unwrap();
        assert_eq!(neg.rvalues_in(), 1);
        assert_eq!(neg.lvalues_in(), 0);

        let binary = binary_functions();
        let sub = binary.iter().find(|f| f.name() == "-").unwrap();
        assert_eq!(sub.lvalues_in(), 1);
        assert_eq!(sub.rvalues_in(), 1);
    }
}

//! The compiler: per-token dispatch from an RPN token sequence into an
//! instruction sequence, resolved against a run-time environment.

use std::rc::Rc;
use std::str::FromStr;

use mexpr_core::{Diag, Token};
use mexpr_vm::{Cell, Instruction, Program, Rte};

use crate::error::CompileError;

/// Turns token sequences into programs.
///
/// With `count_args` on, functions are resolved by `(name, args)`; otherwise
/// by name alone. With `create_variables` on, an unresolved name grows the
/// RTE's variable table by a fresh default-initialised cell instead of
/// failing.
pub struct Compiler {
    count_args: bool,
    create_variables: bool,
}

impl Compiler {
    pub fn new(count_args: bool, create_variables: bool) -> Self {
        Self {
            count_args,
            create_variables,
        }
    }

    pub fn count_args(&self) -> bool {
        self.count_args
    }

    pub fn set_count_args(&mut self, count: bool) {
        self.count_args = count;
    }

    pub fn create_variables(&self) -> bool {
        self.create_variables
    }

    pub fn set_create_variables(&mut self, create: bool) {
        self.create_variables = create;
    }

    /// Compile a token sequence against `rte`. The program has exactly one
    /// instruction per token.
    pub fn compile<T>(&self, tokens: &[Token], rte: &mut Rte<T>) -> Result<Program<T>, CompileError>
    where
        T: Clone + Default + FromStr,
    {
        let mut program = Vec::with_capacity(tokens.len());
        for token in tokens {
            program.push(self.compile_token(token, rte)?);
        }
        Ok(Rc::from(program))
    }

    fn compile_token<T>(&self, token: &Token, rte: &mut Rte<T>) -> Result<Instruction<T>, CompileError>
    where
        T: Clone + Default + FromStr,
    {
        if token.text().is_empty() {
            return Err(CompileError::NullToken(Diag::new("compile", line!(), "")));
        }
        match token {
            Token::Value(text) => text
                .parse::<T>()
                .map(Instruction::LoadVal)
                .map_err(|_| CompileError::UnknownToken(Diag::new("compile", line!(), text.clone()))),

            Token::Function { name, arity } => {
                let f = match arity {
                    Some(a) if self.count_args => rte.function_with_arity(name, a.args, 0),
                    _ => rte.function_by_name(name),
                };
                f.map(Instruction::CallFun).ok_or_else(|| {
                    CompileError::UnknownToken(Diag::new("compile", line!(), name.clone()))
                })
            }

            Token::Operator { name, arity } => {
                let f = match arity {
                    Some(a) => rte.function_with_arity(name, a.rargs, a.largs),
                    None => rte.function_by_name(name),
                };
                f.map(Instruction::CallFun).ok_or_else(|| {
                    CompileError::UnknownToken(Diag::new("compile", line!(), name.clone()))
                })
            }

            Token::Name(name) => {
                if !self.count_args {
                    if let Some(f) = rte.function_by_name(name) {
                        return Ok(Instruction::CallFun(f));
                    }
                }
                if let Some(cell) = rte.variable(name) {
                    return Ok(Instruction::LoadVar(cell));
                }
                if let Some(cell) = rte.constant(name) {
                    return Ok(Instruction::LoadVal(cell.borrow().val.clone()));
                }
                if self.create_variables {
                    let cell = Cell::shared(name.clone(), T::default());
                    rte.variables.push(Rc::clone(&cell));
                    return Ok(Instruction::LoadVar(cell));
                }
                Err(CompileError::UnknownToken(Diag::new(
                    "compile",
                    line!(),
                    name.clone(),
                )))
            }

            Token::Unknown(text) => Err(CompileError::UnknownToken(Diag::new(
                "compile",
                line!(),
                text.clone(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mexpr_core::{FnArity, OpArity};
    use mexpr_vm::{ExecError, FunRef, Function};

    struct Named {
        name: &'static str,
        lin: usize,
        rin: usize,
    }

    impl Function<f64> for Named {
        fn name(&self) -> &str {
            self.name
        }
        fn values_in(&self) -> usize {
            self.lin + self.rin
        }
        fn values_out(&self) -> usize {
            1
        }
        fn lvalues_in(&self) -> usize {
            self.lin
        }
        fn call(&self, _rte: &mut Rte<f64>) -> Result<(), ExecError> {
            Ok(())
        }
    }

    fn named(name: &'static str, lin: usize, rin: usize) -> FunRef<f64> {
        Rc::new(Named { name, lin, rin })
    }

    fn rte_with(funs: Vec<FunRef<f64>>) -> Rte<f64> {
        Rte::with_tables(funs, Vec::new(), Vec::new())
    }

    #[test]
    fn compile_value_token() {
        let c = Compiler::new(true, false);
        let mut rte = rte_with(Vec::new());
        let prog = c.compile(&[Token::Value("2.5".into())], &mut rte).unwrap();
        assert_eq!(prog.len(), 1);
        assert!(matches!(prog[0], Instruction::LoadVal(v) if v == 2.5));
    }

    #[test]
    fn compile_operator_by_arity() {
        let c = Compiler::new(true, false);
        let mut rte = rte_with(vec![named("+", 1, 1)]);
        let tokens = [Token::Operator {
            name: "+".into(),
            arity: Some(OpArity {
                largs: 1,
                rargs: 1,
                out: 1,
            }),
        }];
        let prog = c.compile(&tokens, &mut rte).unwrap();
        assert!(matches!(&prog[0], Instruction::CallFun(f) if f.name() == "+"));
    }

    #[test]
    fn compile_operator_wrong_arity_fails() {
        let c = Compiler::new(true, false);
        let mut rte = rte_with(vec![named("+", 1, 1)]);
        let tokens = [Token::Operator {
            name: "+".into(),
            arity: Some(OpArity {
                largs: 3,
                rargs: 3,
                out: 3,
            }),
        }];
        assert!(matches!(
            c.compile(&tokens, &mut rte),
            Err(CompileError::UnknownToken(_))
        ));
    }

    #[test]
    fn compile_function_by_name_when_not_counting() {
        let c = Compiler::new(false, false);
        let mut rte = rte_with(vec![named("sin", 0, 1)]);
        let tokens = [Token::Function {
            name: "sin".into(),
            arity: Some(FnArity { args: 5, out: None }),
        }];
        // arity mismatch is ignored with counting off
        assert!(c.compile(&tokens, &mut rte).is_ok());
    }

    #[test]
    fn compile_name_resolves_variable_then_constant() {
        let c = Compiler::new(true, false);
        let mut rte = Rte::with_tables(
            Vec::new(),
            vec![Cell::shared("x", 1.0)],
            vec![Cell::shared("Pi", 3.5)],
        );
        let prog = c
            .compile(&[Token::Name("x".into()), Token::Name("Pi".into())], &mut rte)
            .unwrap();
        assert!(matches!(&prog[0], Instruction::LoadVar(_)));
        // constants compile to literal loads of their current value
        assert!(matches!(&prog[1], Instruction::LoadVal(v) if *v == 3.5));
    }

    #[test]
    fn compile_name_as_function_when_not_counting() {
        let c = Compiler::new(false, false);
        let mut rte = rte_with(vec![named("sin", 0, 1)]);
        let prog = c.compile(&[Token::Name("sin".into())], &mut rte).unwrap();
        assert!(matches!(&prog[0], Instruction::CallFun(_)));
    }

    #[test]
    fn compile_creates_variable_on_first_sight() {
        let c = Compiler::new(true, true);
        let mut rte = rte_with(Vec::new());
        let prog = c.compile(&[Token::Name("fresh".into())], &mut rte).unwrap();
        assert!(matches!(&prog[0], Instruction::LoadVar(_)));
        assert_eq!(rte.variables.len(), 1);
        assert_eq!(rte.variables[0].borrow().name, "fresh");
        assert_eq!(rte.variables[0].borrow().val, 0.0);
    }

    #[test]
    fn compile_unresolved_name_fails_without_creation() {
        let c = Compiler::new(true, false);
        let mut rte = rte_with(Vec::new());
        assert!(matches!(
            c.compile(&[Token::Name("nope".into())], &mut rte),
            Err(CompileError::UnknownToken(_))
        ));
    }

    #[test]
    fn compile_unknown_token_fails() {
        let c = Compiler::new(true, true);
        let mut rte = rte_with(Vec::new());
        assert!(matches!(
            c.compile(&[Token::Unknown("$".into())], &mut rte),
            Err(CompileError::UnknownToken(_))
        ));
    }

    #[test]
    fn compile_empty_text_is_null_token() {
        let c = Compiler::new(true, true);
        let mut rte = rte_with(Vec::new());
        assert!(matches!(
            c.compile(&[Token::Unknown(String::new())], &mut rte),
            Err(CompileError::NullToken(_))
        ));
    }

    #[test]
    fn program_length_equals_token_count() {
        let c = Compiler::new(true, true);
        let mut rte = rte_with(vec![named("+", 1, 1)]);
        let tokens = [
            Token::Value("1".into()),
            Token::Value("2".into()),
            Token::Operator {
                name: "+".into(),
                arity: Some(OpArity {
                    largs: 1,
                    rargs: 1,
                    out: 1,
                }),
            },
        ];
        let prog = c.compile(&tokens, &mut rte).unwrap();
        assert_eq!(prog.len(), tokens.len());
    }
}

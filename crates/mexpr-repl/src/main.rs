//! mexpr interactive interpreter.
//!
//! Reads expressions from stdin line by line; parses, compiles and runs each
//! one, then prints the drained value stack. Lines starting with `@` are
//! directives:
//!
//! ```text
//! @count     toggle operator/function arity annotation in the parser
//! @countfun  toggle arity-based function lookup in the compiler
//! @reverse   toggle function argument reversal
//! @debug     toggle parser phase logging
//! @status    print the current toggles
//! @defun     define a function (header line, then one body line)
//! @list      print the function and operator tables
//! @vals      print the variable and constant tables
//! @quit      exit
//! ```

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;

use mexpr_core::OperatorDef;
use mexpr_lang::{Compiler, Parser};
use mexpr_stdlib::{
    default_constants, default_functions, default_operators, default_rte, Procedure,
};
use mexpr_vm::{Cell, FunRef, Rte, Vm};

const PROMPT_RULE: &str = "==============================================";

struct Repl {
    parser: Parser,
    compiler: Compiler,
    vm: Vm<f64>,
}

enum Outcome {
    Continue,
    Quit,
}

impl Repl {
    fn new() -> Self {
        Self {
            parser: Parser::new(default_operators(), false, true, false),
            compiler: Compiler::new(true, true),
            vm: Vm::new(default_rte()),
        }
    }

    /// Handle one input line; directives start with `@`.
    fn handle_line(&mut self, line: &str, input: &mut impl BufRead) -> Outcome {
        if let Some(command) = line.strip_prefix('@') {
            let outcome = self.handle_command(command, input);
            println!("{}", PROMPT_RULE);
            return outcome;
        }
        self.eval(line);
        println!("{}", PROMPT_RULE);
        Outcome::Continue
    }

    fn handle_command(&mut self, command: &str, input: &mut impl BufRead) -> Outcome {
        match command.trim() {
            "count" => {
                let v = !self.parser.count_args();
                self.parser.set_count_args(v);
            }
            "countfun" => {
                let v = !self.compiler.count_args();
                self.compiler.set_count_args(v);
            }
            "reverse" => {
                let v = !self.parser.swap_args();
                self.parser.set_swap_args(v);
            }
            "debug" => {
                let v = !self.parser.debug();
                self.parser.set_debug(v);
            }
            "status" => {
                println!("REVERSE ARGUMENTS   {}", self.parser.swap_args());
                println!("COUNT ARGUMENTS     {}", self.parser.count_args());
                println!("COUNT FUN ARGUMENTS {}", self.compiler.count_args());
                println!("DEBUG               {}", self.parser.debug());
            }
            "defun" => self.define_function(input),
            "list" => self.list_functions(),
            "vals" => self.list_values(),
            "quit" => return Outcome::Quit,
            _ => {
                println!("UNKNOWN COMMAND; VALID COMMANDS:");
                print_usage();
            }
        }
        Outcome::Continue
    }

    /// Parse, compile and run one expression; print the drained stack.
    fn eval(&mut self, line: &str) {
        let tokens = match self.parser.parse(line) {
            Ok(tokens) => tokens,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };
        let prog = match self.compiler.compile(&tokens, self.vm.rte_mut()) {
            Ok(prog) => prog,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };
        self.vm.set_prog(prog);
        if let Err(e) = self.vm.run(0) {
            println!("{}", e);
            return;
        }
        let stack = &mut self.vm.rte_mut().stack;
        if !stack.is_empty() {
            print!("\nRESULT: ");
            while let Some(v) = stack.pop() {
                print!("{} ", v);
            }
            println!();
        }
    }

    /// `@defun`: read `<out-arity> <name> <arg...>`, then one body line;
    /// compile the body against a fresh environment whose variables are the
    /// arguments, and register the result as a procedure.
    fn define_function(&mut self, input: &mut impl BufRead) {
        println!("DEFINE FUNCTION Enter <# of out values> <name> <list of input values>");
        println!(" example: 1 myfun x y");
        let header = match read_line(input) {
            Some(line) => line,
            None => return,
        };
        let mut words = header.split_whitespace();
        let out: usize = match words.next().and_then(|w| w.parse().ok()) {
            Some(n) => n,
            None => {
                println!("malformed function header");
                return;
            }
        };
        let name = match words.next() {
            Some(n) => n.to_string(),
            None => {
                println!("malformed function header");
                return;
            }
        };
        let args: Vec<String> = words.map(str::to_string).collect();
        for arg in &args {
            if !well_formed_name(arg) {
                println!("wrong parameter: {}", arg);
                return;
            }
        }

        println!("TYPE BODY OF FUNCTION ON NEXT LINE");
        let body = match read_line(input) {
            Some(line) => line,
            None => return,
        };

        let mut local = Rte::with_tables(
            default_functions(),
            args.iter().map(|a| Cell::shared(a.clone(), 0.0)).collect(),
            default_constants(),
        );
        let tokens = match self.parser.parse(&body) {
            Ok(tokens) => tokens,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };
        let prog = match Compiler::new(false, true).compile(&tokens, &mut local) {
            Ok(prog) => prog,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };
        let proc = Procedure::new(name, prog, local, args.len(), out, 0);
        self.vm.rte_mut().functions.push(Rc::new(proc));
    }

    fn list_functions(&self) {
        println!("==========================");
        println!("FUNCTIONS");
        println!("==========================");
        for f in &self.vm.rte().functions {
            println!("{}", function_line(f));
        }
        println!("==========================");
        println!("OPERATORS");
        println!("==========================");
        for op in self.parser.operators() {
            println!("{}", operator_line(op));
        }
    }

    fn list_values(&self) {
        println!("==========================");
        println!("VARIABLES");
        println!("==========================");
        for cell in &self.vm.rte().variables {
            let cell = cell.borrow();
            println!("{} = {}", cell.name, cell.val);
        }
        println!("==========================");
        println!("CONSTANTS");
        println!("==========================");
        for cell in &self.vm.rte().constants {
            let cell = cell.borrow();
            println!("{} = {}", cell.name, cell.val);
        }
    }
}

fn function_line(f: &FunRef<f64>) -> String {
    format!(
        "{}\tLEFT: {}\tRIGHT: {}\tOUT: {}",
        f.name(),
        f.lvalues_in(),
        f.rvalues_in(),
        f.values_out()
    )
}

fn operator_line(op: &OperatorDef) -> String {
    format!(
        "{}\tLEFT: {}\tRIGHT: {}\tOUT: {}\tSWAP: {}",
        op.name(),
        op.largs(),
        op.rargs(),
        op.outvals(),
        if op.swapped() { 'Y' } else { 'N' }
    )
}

/// Argument names must scan as a single identifier from the first character.
fn well_formed_name(s: &str) -> bool {
    use mexpr_lang::scan::{search_range, NameMatcher};
    matches!(
        search_range::<NameMatcher>(s.as_bytes(), 0, s.len()),
        Some(r) if r.start == 0 && r.end == s.len()
    )
}

fn read_line(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
    }
}

fn print_usage() {
    println!("@count\t\ttoggle count arguments");
    println!("@countfun\ttoggle count arguments for functions");
    println!("@reverse\ttoggle reverse arguments");
    println!("@debug\t\ttoggle debug");
    println!("@status\t\tprint status");
    println!("@defun\t\tdefine new function");
    println!("@list\t\tlist supported operators & functions");
    println!("@vals\t\tlist variables and constants");
    println!("@quit\t\tquit");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    print_usage();
    println!("{}", PROMPT_RULE);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut repl = Repl::new();
    loop {
        io::stdout().flush().ok();
        let line = match read_line(&mut input) {
            Some(line) => line,
            None => break,
        };
        if line.is_empty() {
            continue;
        }
        if let Outcome::Quit = repl.handle_line(&line, &mut input) {
            break;
        }
    }
    println!("\nbye");
    ExitCode::SUCCESS
}

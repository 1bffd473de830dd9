//! The expression parser: validates an infix source string and rewrites it,
//! phase by phase, into an arity-annotated RPN token sequence.
//!
//! The pipeline inside [`Parser::parse`] is strict and sequential:
//! validate → wrap → remove blanks → to_rpn → create_tokens. Every phase
//! operates by splicing text in place; the wrap phase parenthesises each
//! atom so the postfix phases only ever see uniform `(atom)` shapes.

use std::ops::Range;

use smallvec::SmallVec;

use mexpr_core::{Diag, FnArity, OpArity, OperatorDef, Token};

use crate::error::ParseError;
use crate::scan::{self, NameMatcher, NumberMatcher};

/// Rewrites infix expressions into annotated RPN.
pub struct Parser {
    operators: Vec<OperatorDef>,
    swap_args: bool,
    count_args: bool,
    debug: bool,
    expr: String,
}

impl Parser {
    /// Create a parser over an operator descriptor table.
    pub fn new(operators: Vec<OperatorDef>, swap_args: bool, count_args: bool, debug: bool) -> Self {
        Self {
            operators,
            swap_args,
            count_args,
            debug,
            expr: String::new(),
        }
    }

    pub fn swap_args(&self) -> bool {
        self.swap_args
    }

    pub fn set_swap_args(&mut self, swap: bool) {
        self.swap_args = swap;
    }

    pub fn count_args(&self) -> bool {
        self.count_args
    }

    pub fn set_count_args(&mut self, count: bool) {
        self.count_args = count;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// The operator descriptor table.
    pub fn operators(&self) -> &[OperatorDef] {
        &self.operators
    }

    /// The expression in its current (last) rewritten form.
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Parse an expression into an RPN token sequence.
    pub fn parse(&mut self, expr: &str) -> Result<Vec<Token>, ParseError> {
        self.expr = expr.to_string();
        self.validate()?;
        self.wrap()?;
        self.trace("wrap");
        self.remove_blanks();
        self.trace("remove_blanks");
        self.to_rpn()?;
        self.trace("to_rpn");
        self.create_tokens()
    }

    fn trace(&self, phase: &str) {
        if self.debug {
            tracing::info!(target: "mexpr::parse", "{}: {}", phase, self.expr);
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    fn validate(&self) -> Result<(), ParseError> {
        let bytes = self.expr.as_bytes();
        for i in 0..bytes.len() {
            if bytes[i] == b'(' && scan::forward_par_match(bytes, i).is_none() {
                return Err(ParseError::UnmatchedOpeningPar(Diag::new(
                    "validate",
                    line!(),
                    self.expr[..=i].to_string(),
                )));
            }
            if bytes[i] == b')' && scan::backward_par_match(bytes, i).is_none() {
                return Err(ParseError::UnmatchedClosingPar(Diag::new(
                    "validate",
                    line!(),
                    self.expr[..=i].to_string(),
                )));
            }
        }

        // Erase every recognised construct from a scratch copy; whatever is
        // left over is an unknown symbol.
        let mut tmp = self.expr.clone();
        while let Some(r) = self.search_number(&tmp, 0)? {
            blank(&mut tmp, r);
        }
        for op in &self.operators {
            while let Some(pos) = tmp.find(op.name()) {
                blank(&mut tmp, pos..pos + op.name().len());
            }
        }
        while let Some(r) = self.search_function(&tmp, 0) {
            let open = find_from(&tmp, '(', r.start).unwrap_or(r.end);
            blank(&mut tmp, r.start..open);
        }
        while let Some(r) = self.search_name(&tmp, 0, tmp.len()) {
            blank(&mut tmp, r);
        }
        let residue: String = tmp
            .chars()
            .map(|c| {
                if matches!(c, '(' | ')' | ',' | '[' | ']') {
                    ' '
                } else {
                    c
                }
            })
            .collect();
        if residue.bytes().any(|b| b != b' ') {
            return Err(ParseError::UnknownSymbol(Diag::new(
                "validate",
                line!(),
                residue,
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Wrapping
    // ------------------------------------------------------------------

    /// Parenthesise every number, name and function span so later phases see
    /// uniform `(atom)` shapes. A span already delimited by `(`..`)`,
    /// `(`..`,` or `,`..`)` is left alone; a span touching either end of the
    /// string is wrapped unconditionally.
    fn wrap(&mut self) -> Result<(), ParseError> {
        let mut expr = std::mem::take(&mut self.expr);

        let mut r = self.search_number(&expr, 0)?;
        while let Some(range) = r {
            if range.start == 0 || range.end == expr.len() {
                let resume = add_parens(&mut expr, range);
                r = self.search_number(&expr, resume)?;
                continue;
            }
            if delimited(&expr, &range) {
                r = self.search_number(&expr, range.end)?;
                continue;
            }
            let resume = add_parens(&mut expr, range);
            r = self.search_number(&expr, resume)?;
        }

        let mut r = self.search_name(&expr, 0, expr.len());
        while let Some(range) = r {
            if range.start == 0 || range.end == expr.len() {
                add_parens(&mut expr, range);
                r = self.search_name(&expr, 0, expr.len());
                continue;
            }
            // a name carrying an arity annotation is already a finished token
            if delimited(&expr, &range) || expr.as_bytes()[range.end] == b'[' {
                r = self.search_name(&expr, range.end, expr.len());
                continue;
            }
            let resume = add_parens(&mut expr, range);
            r = self.search_name(&expr, resume, expr.len());
        }

        let mut r = self.search_function(&expr, 0);
        while let Some(range) = r {
            if range.start == 0 || range.end == expr.len() {
                add_parens(&mut expr, range);
                r = self.search_function(&expr, 0);
                continue;
            }
            if delimited(&expr, &range) {
                // already delimited: continue inside the argument list, so
                // nested functions still get wrapped
                let open = find_from(&expr, '(', range.start).unwrap_or(expr.len());
                r = self.search_function(&expr, open);
                continue;
            }
            add_parens(&mut expr, range);
            r = self.search_function(&expr, 0);
        }

        self.expr = expr;
        Ok(())
    }

    fn remove_blanks(&mut self) {
        self.expr.retain(|c| c != ' ');
    }

    // ------------------------------------------------------------------
    // RPN conversion
    // ------------------------------------------------------------------

    fn to_rpn(&mut self) -> Result<(), ParseError> {
        let mut expr = std::mem::take(&mut self.expr);
        self.postfix_operators(&mut expr)?;
        self.postfix_functions(&mut expr);

        // flatten: parentheses and separators become blanks, runs collapse
        let mut out = String::with_capacity(expr.len());
        let mut prev_blank = false;
        for ch in expr.chars() {
            let ch = if matches!(ch, '(' | ')' | ',') { ' ' } else { ch };
            if ch == ' ' && prev_blank {
                continue;
            }
            prev_blank = ch == ' ';
            out.push(ch);
        }
        self.expr = out;
        Ok(())
    }

    /// Rewrite every operator application `(L) op (R)` into postfix form
    /// `((L),(R) op[ l r o ])`, right-then-left when the descriptor asks for
    /// swapped operands. Descriptors are processed in declaration order.
    fn postfix_operators(&self, expr: &mut String) -> Result<(), ParseError> {
        for op in &self.operators {
            let name = op.name();
            let mut found = expr.find(name);
            while let Some(first) = found {
                let last = first + name.len() - 1;
                if last == expr.len() - 1 {
                    break;
                }
                let start = last + 1;
                let bytes = expr.as_bytes();
                if bytes[start] == b')' || bytes[start] == b'[' {
                    // tail of an earlier rewrite
                    found = find_str_from(expr, name, start);
                    continue;
                }

                // inclusive (open, close) spans of the parenthesised operands
                let left = if first != 0 && bytes[first - 1] == b')' {
                    scan::backward_par_match(bytes, first - 1).map(|open| (open, first - 1))
                } else {
                    None
                };
                let right = if bytes[start] == b'(' {
                    scan::forward_par_match(bytes, start).map(|close| (start, close))
                } else {
                    None
                };

                let present = left.is_some() as usize + right.is_some() as usize;
                if present != op.operands() {
                    found = find_str_from(expr, name, start);
                    continue;
                }

                let span_start = left.map_or(first, |l| l.0);
                let span_end = right.map_or(last, |r| r.1);

                let mut op_str = name.to_string();
                if self.count_args {
                    let largs = left.map_or(0, |(o, c)| operand_dim(bytes, o, c));
                    let rargs = right.map_or(0, |(o, c)| operand_dim(bytes, o, c));
                    let out = self
                        .operators
                        .iter()
                        .find(|o| o.name() == name && o.largs() == largs && o.rargs() == rargs)
                        .map(|o| o.outvals())
                        .ok_or_else(|| {
                            ParseError::OperatorNotFound(Diag::new(
                                "postfix_operators",
                                line!(),
                                format!("operator {}[ {} {} ? ] not found", name, largs, rargs),
                            ))
                        })?;
                    op_str = format!("{}[ {} {} {} ]", name, largs, rargs, out);
                }

                let left_str = left.map(|(o, c)| expr[o..=c].to_string()).unwrap_or_default();
                let right_str = right
                    .map(|(o, c)| expr[o..=c].to_string())
                    .unwrap_or_default();
                let rewritten = if op.swapped() {
                    format!("({},{} {})", right_str, left_str, op_str)
                } else {
                    format!("({},{} {})", left_str, right_str, op_str)
                };
                expr.replace_range(span_start..=span_end, &rewritten);
                found = find_str_from(expr, name, start);
            }
        }
        Ok(())
    }

    /// Rewrite every function call `name(args)` into `(args)name[A]`,
    /// reversing the argument list first when `swap_args` is on.
    fn postfix_functions(&self, expr: &mut String) {
        loop {
            let range = match self.search_function(expr, 0) {
                Some(r) => r,
                None => break,
            };
            let open = match find_from(expr, '(', range.start) {
                Some(i) => i,
                None => break,
            };
            let close = range.end - 1;

            let mut fun = expr[open..=close].to_string();
            if self.swap_args {
                fun = swap_function_args(&fun);
            }
            let name = expr[range.start..open].to_string();
            fun.push_str(&name);

            if self.count_args {
                let mut args = 0usize;
                if close - open > 1 {
                    args = operand_dim(expr.as_bytes(), open, close);
                }
                fun.push_str(&format!("[{}]", args));
            }

            expr.replace_range(range.start..=close, &fun);
        }
    }

    // ------------------------------------------------------------------
    // Tokenisation
    // ------------------------------------------------------------------

    /// Split the flattened RPN string into tokens. An annotation opened in
    /// one word spans following words until one ends with `]`.
    fn create_tokens(&self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut words = self.expr.split_whitespace();
        while let Some(word) = words.next() {
            let mut text = word.to_string();
            if self.count_args && text.contains('[') && !text.ends_with(']') {
                for next in words.by_ref() {
                    text.push(' ');
                    text.push_str(next);
                    if next.ends_with(']') {
                        break;
                    }
                }
            }
            let token = self.create_token(&text)?;
            if self.debug {
                tracing::info!(target: "mexpr::parse", "{}\t{}", text, kind_name(&token));
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn create_token(&self, s: &str) -> Result<Token, ParseError> {
        if self.count_args {
            if let Some(i) = s.find('[') {
                let close = match s[i..].find(']') {
                    Some(c) => i + c,
                    None => return Ok(Token::Unknown(s.to_string())),
                };
                let name = s[..i].to_string();
                let values: SmallVec<[usize; 3]> = s[i + 1..close]
                    .split_whitespace()
                    .map_while(|w| w.parse().ok())
                    .collect();
                return Ok(match values.as_slice() {
                    [args] => Token::Function {
                        name,
                        arity: Some(FnArity {
                            args: *args,
                            out: None,
                        }),
                    },
                    [args, out] => Token::Function {
                        name,
                        arity: Some(FnArity {
                            args: *args,
                            out: Some(*out),
                        }),
                    },
                    [largs, rargs, out] => Token::Operator {
                        name,
                        arity: Some(OpArity {
                            largs: *largs,
                            rargs: *rargs,
                            out: *out,
                        }),
                    },
                    _ => Token::Unknown(s.to_string()),
                });
            }
        } else if self.is_operator_name(s) {
            return Ok(Token::Operator {
                name: s.to_string(),
                arity: None,
            });
        }

        if self.search_number(s, 0)?.is_some() {
            return Ok(Token::Value(s.to_string()));
        }
        if self.search_name(s, 0, s.len()).is_some() {
            return Ok(Token::Name(s.to_string()));
        }
        Ok(Token::Unknown(s.to_string()))
    }

    // ------------------------------------------------------------------
    // Searches
    // ------------------------------------------------------------------

    fn is_operator_name(&self, s: &str) -> bool {
        self.operators.iter().any(|o| o.name() == s)
    }

    /// Next complete number in `s[from..]`.
    ///
    /// A candidate directly followed by a name (`2x`) is an invalid name. A
    /// candidate that is part of an identifier (`x2`, `x2x`) is skipped. A
    /// candidate whose last matched character is not a digit (`1.2E`,
    /// `1.2E-`) is a partial match; scanning continues past it unchecked.
    fn search_number(&self, s: &str, from: usize) -> Result<Option<Range<usize>>, ParseError> {
        let bytes = s.as_bytes();
        let to = bytes.len();
        let mut from = from;
        loop {
            if from >= to {
                return Ok(None);
            }
            let r = match scan::search_range::<NumberMatcher>(bytes, from, to) {
                Some(r) => r,
                None => return Ok(None),
            };

            if let Some(rn) = self.search_name(s, r.end, to) {
                if rn.start == r.end {
                    return Err(ParseError::InvalidName(Diag::new(
                        "search_number",
                        line!(),
                        s[r.start..rn.end].to_string(),
                    )));
                }
            }

            if r.start == 0 {
                return Ok(Some(r));
            }

            // part of an identifier starting just before the digits, e.g. x2
            if scan::search_range::<NameMatcher>(bytes, r.start - 1, r.end).is_some() {
                from = r.end;
                continue;
            }

            let last = bytes[r.end - 1];
            if !last.is_ascii_digit() {
                // partial exponent form; scan past it
                return Ok(scan::search_range::<NumberMatcher>(bytes, r.end, to));
            }

            // digits embedded in a longer identifier, e.g. the 2 of x2x
            if let Some(v) = self.search_name(s, r.start - 1, to) {
                if v.start < r.end {
                    from = r.end;
                    continue;
                }
            }

            return Ok(Some(r));
        }
    }

    /// Next variable/constant name in `s[from..to]`. Skips names followed by
    /// an opening parenthesis (functions) and names that textually equal an
    /// operator.
    fn search_name(&self, s: &str, from: usize, to: usize) -> Option<Range<usize>> {
        let bytes = s.as_bytes();
        let to = to.min(bytes.len());
        let mut from = from;
        loop {
            let r = scan::search_range::<NameMatcher>(bytes, from, to)?;
            if r.end < to && bytes[r.end] == b'(' {
                from = r.end;
                continue;
            }
            if self.is_operator_name(&s[r.clone()]) {
                from = r.end;
                continue;
            }
            return Some(r);
        }
    }

    /// Next function span in `s[from..]`: a name directly followed by a
    /// parenthesised argument list, through the matching closing
    /// parenthesis. Names that equal an operator are retried past the name.
    fn search_function(&self, s: &str, from: usize) -> Option<Range<usize>> {
        let bytes = s.as_bytes();
        let to = bytes.len();
        let mut from = from;
        loop {
            let r = scan::search_range::<NameMatcher>(bytes, from, to)?;
            if r.end < to && bytes[r.end] == b'(' {
                if self.is_operator_name(&s[r.clone()]) {
                    from = r.end;
                    continue;
                }
                let close = scan::forward_par_match(bytes, r.end)?;
                return Some(r.start..close + 1);
            }
            from = r.end;
        }
    }
}

/// Replace `expr[r]` with a blank run of the same length.
fn blank(expr: &mut String, r: Range<usize>) {
    let blanks = " ".repeat(r.len());
    expr.replace_range(r, &blanks);
}

/// Wrap `expr[r]` in parentheses; returns the index just past the inserted
/// closing parenthesis.
fn add_parens(expr: &mut String, r: Range<usize>) -> usize {
    let wrapped = format!("({})", &expr[r.clone()]);
    let resume = r.start + wrapped.len();
    expr.replace_range(r, &wrapped);
    resume.min(expr.len())
}

/// Is the span already delimited as `(..)`, `(..,` or `,..)`?
fn delimited(expr: &str, r: &Range<usize>) -> bool {
    let bytes = expr.as_bytes();
    let prev = bytes[r.start - 1];
    let next = bytes[r.end];
    matches!(
        (prev, next),
        (b'(', b')') | (b'(', b',') | (b',', b')')
    )
}

/// Dimension of a parenthesised operand spanning `open..=close`: a trailing
/// `[.. O]` annotation wins, otherwise top-level separators + 1.
fn operand_dim(bytes: &[u8], open: usize, close: usize) -> usize {
    match scan::trailing_out_values(bytes, close) {
        Some(v) => v,
        None => scan::top_level_separators(bytes, open + 1..close) + 1,
    }
}

/// Reverse a parenthesised argument list, recursing into each argument.
/// Lists with fewer than two top-level arguments are returned unchanged.
fn swap_function_args(s: &str) -> String {
    let bytes = s.as_bytes();
    if s.len() >= 2 && bytes[0] == b'(' && bytes[s.len() - 1] == b')' {
        return format!("({})", swap_function_args(&s[1..s.len() - 1]));
    }
    let parts = split_top_level(s);
    if parts.len() < 2 {
        return s.to_string();
    }
    let swapped: Vec<String> = parts.iter().rev().map(|p| swap_function_args(p)).collect();
    swapped.join(",")
}

/// Split on argument separators at nesting depth zero.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, &b) in s.as_bytes().iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn find_from(s: &str, ch: char, from: usize) -> Option<usize> {
    s[from..].find(ch).map(|i| i + from)
}

fn find_str_from(s: &str, pat: &str, from: usize) -> Option<usize> {
    if from > s.len() {
        return None;
    }
    s[from..].find(pat).map(|i| i + from)
}

fn kind_name(t: &Token) -> &'static str {
    match t {
        Token::Value(_) => "VALUE",
        Token::Name(_) => "NAME",
        Token::Function { .. } => "FUNCTION",
        Token::Operator { .. } => "OPERATOR",
        Token::Unknown(_) => "UNKNOWN",
    }
}

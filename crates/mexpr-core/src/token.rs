use std::fmt;

/// Arity annotation of a function token: `name[A]` or `name[A O]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FnArity {
    /// Number of input values consumed from the stack.
    pub args: usize,
    /// Number of produced values, when the annotation carried one.
    pub out: Option<usize>,
}

/// Arity annotation of an operator token: `name[ L R O ]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpArity {
    /// Dimension of the left operand.
    pub largs: usize,
    /// Dimension of the right operand.
    pub rargs: usize,
    /// Number of produced values.
    pub out: usize,
}

/// A token of the RPN output stream.
///
/// Function and Operator tokens carry an arity annotation exactly when the
/// parser was counting arguments; with counting off the `arity` field is
/// `None` and resolution falls back to name-only lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Numeric literal, e.g. `1.2E-3`.
    Value(String),
    /// Variable or constant name, e.g. `x`.
    Name(String),
    /// Function call, e.g. `atan2[2]`.
    Function { name: String, arity: Option<FnArity> },
    /// Operator application, e.g. `+[ 1 1 1 ]`.
    Operator { name: String, arity: Option<OpArity> },
    /// Anything the tokenizer could not classify.
    Unknown(String),
}

impl Token {
    /// The textual payload of the token (name or literal text).
    pub fn text(&self) -> &str {
        match self {
            Token::Value(s) | Token::Name(s) | Token::Unknown(s) => s,
            Token::Function { name, .. } | Token::Operator { name, .. } => name,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Value(s) | Token::Name(s) | Token::Unknown(s) => write!(f, "{}", s),
            Token::Function { name, arity: None } => write!(f, "{}", name),
            Token::Function {
                name,
                arity: Some(a),
            } => match a.out {
                Some(out) => write!(f, "{}[{} {}]", name, a.args, out),
                None => write!(f, "{}[{}]", name, a.args),
            },
            Token::Operator { name, arity: None } => write!(f, "{}", name),
            Token::Operator {
                name,
                arity: Some(a),
            } => write!(f, "{}[ {} {} {} ]", name, a.largs, a.rargs, a.out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_text() {
        assert_eq!(Token::Value("1.5".into()).text(), "1.5");
        assert_eq!(Token::Name("x".into()).text(), "x");
        assert_eq!(
            Token::Function {
                name: "sin".into(),
                arity: None
            }
            .text(),
            "sin"
        );
    }

    #[test]
    fn operator_display_round_trips_annotation_form() {
        let t = Token::Operator {
            name: "+".into(),
            arity: Some(OpArity {
                largs: 1,
                rargs: 1,
                out: 1,
            }),
        };
        assert_eq!(t.to_string(), "+[ 1 1 1 ]");
    }

    #[test]
    fn function_display_forms() {
        let one = Token::Function {
            name: "atan2".into(),
            arity: Some(FnArity {
                args: 2,
                out: None,
            }),
        };
        assert_eq!(one.to_string(), "atan2[2]");

        let two = Token::Function {
            name: "f".into(),
            arity: Some(FnArity {
                args: 2,
                out: Some(3),
            }),
        };
        assert_eq!(two.to_string(), "f[2 3]");
    }

    #[test]
    fn unannotated_display_is_bare_name() {
        let t = Token::Operator {
            name: "+".into(),
            arity: None,
        };
        assert_eq!(t.to_string(), "+");
    }
}

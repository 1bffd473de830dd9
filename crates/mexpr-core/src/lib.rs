//! Core types for the mexpr expression pipeline.
//!
//! This crate provides the foundational types shared by the parser, compiler
//! and runtime:
//! - Tokens and their arity annotations
//! - Operator descriptors
//! - Diagnostic payloads for error reporting

pub mod diag;
pub mod operator;
pub mod token;

pub use diag::Diag;
pub use operator::OperatorDef;
pub use token::{FnArity, OpArity, Token};

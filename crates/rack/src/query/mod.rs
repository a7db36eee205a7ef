pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod statement;

pub use ast::{Ast, Condition, Op, Operand};
pub use eval::{eval, Row};
pub use parser::parse;
pub use statement::statement;

///
/// Diagnostic
///
/// A non-fatal evaluation failure recorded during a scan (spec §7):
/// a `QueryTypeError` against one candidate record turns that record into
/// a non-match rather than aborting the whole scan.
///

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub key: String,
    pub message: String,
}

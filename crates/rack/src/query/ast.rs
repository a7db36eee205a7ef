use crate::value::Value;

///
/// Predicate AST
///
/// Pure representation of one parsed query (spec §4.3). The parser
/// resolves bare identifiers against the target schema as it builds this
/// tree, so by the time an `Ast` exists every `Operand::Field` is known to
/// name a declared field (spec §9, open-question resolution).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Op {
    Eq,
    NotEq,
    EqCi,
    NotEqCi,
    StartsWith,
    NotStartsWith,
    StartsWithCi,
    NotStartsWithCi,
    EndsWith,
    NotEndsWith,
    EndsWithCi,
    NotEndsWithCi,
    MemberOf,
    NotMemberOf,
    MemberOfCi,
    NotMemberOfCi,
    IdentityEq,
    Lt,
    Lte,
    Gt,
    Gte,
}

///
/// Operand
///

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Field(String),
    Literal(Value),
}

///
/// Condition
///
/// An ordered chain `operand (op operand)+`: `a OP1 b OP2 c` evaluates as
/// `(a OP1 b) AND (b OP2 c)` (spec §4.3 chaining rule). `operands.len() ==
/// ops.len() + 1`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub operands: Vec<Operand>,
    pub ops: Vec<Op>,
}

///
/// Ast
///
/// `target` is either a registered entry type or a tag's name (spec §4.3
/// grammar); `Store` decides which at execution time. Conditions separated
/// by `;` in the source are AND-joined.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Ast {
    pub target: String,
    pub conditions: Vec<Condition>,
}

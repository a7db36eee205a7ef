//! Query evaluator (spec §4.4): run a parsed `Ast` against one record.

use crate::error::{ErrorClass, ErrorOrigin, RackError};
use crate::query::ast::{Ast, Condition, Op, Operand};
use crate::value::Value;

///
/// Row
///
/// Decouples evaluation from the concrete record type: both `Entry` and
/// `TagRecord` implement it (grounded in the teacher's field-lookup
/// abstraction for predicate evaluation).
///

pub trait Row {
    fn field(&self, name: &str) -> Option<Value>;
}

/// Evaluate every condition against `row`; conditions are AND-joined
/// (spec §4.3, top-level `;`). The first `false` short-circuits.
pub fn eval(ast: &Ast, row: &dyn Row) -> Result<bool, RackError> {
    for condition in &ast.conditions {
        if !eval_condition(condition, row)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_condition(condition: &Condition, row: &dyn Row) -> Result<bool, RackError> {
    // `a OP1 b OP2 c` == `(a OP1 b) AND (b OP2 c)`; `b` is resolved once
    // and reused for both comparisons it participates in.
    let mut left = resolve_operand(&condition.operands[0], row);
    for (op, next_operand) in condition.ops.iter().zip(condition.operands.iter().skip(1)) {
        let right = resolve_operand(next_operand, row);
        if !apply_op(*op, &left, &right)? {
            return Ok(false);
        }
        left = right;
    }
    Ok(true)
}

fn resolve_operand(operand: &Operand, row: &dyn Row) -> Value {
    match operand {
        Operand::Field(name) => row.field(name).unwrap_or(Value::Null),
        Operand::Literal(value) => value.clone(),
    }
}

fn apply_op(op: Op, left: &Value, right: &Value) -> Result<bool, RackError> {
    let result = match op {
        Op::Eq => Some(left.eq_structural(right)),
        Op::NotEq => Some(!left.eq_structural(right)),
        Op::EqCi => Some(left.eq_ci(right)),
        Op::NotEqCi => Some(!left.eq_ci(right)),
        Op::StartsWith => left.starts_with(right),
        Op::NotStartsWith => left.starts_with(right).map(|b| !b),
        Op::StartsWithCi => left.starts_with_ci(right),
        Op::NotStartsWithCi => left.starts_with_ci(right).map(|b| !b),
        Op::EndsWith => left.ends_with(right),
        Op::NotEndsWith => left.ends_with(right).map(|b| !b),
        Op::EndsWithCi => left.ends_with_ci(right),
        Op::NotEndsWithCi => left.ends_with_ci(right).map(|b| !b),
        Op::MemberOf => left.member_of(right),
        Op::NotMemberOf => left.member_of(right).map(|b| !b),
        Op::MemberOfCi => left.member_of_ci(right),
        Op::NotMemberOfCi => left.member_of_ci(right).map(|b| !b),
        // Declared "entirely useless" by spec §9: identity compare,
        // implemented as structural equality (no reference identity
        // exists for `Value`).
        Op::IdentityEq => Some(left.eq_structural(right)),
        Op::Lt => left.order_cmp(right).map(|o| o.is_lt()),
        Op::Lte => left.order_cmp(right).map(|o| o.is_le()),
        Op::Gt => left.order_cmp(right).map(|o| o.is_gt()),
        Op::Gte => left.order_cmp(right).map(|o| o.is_ge()),
    };

    result.ok_or_else(|| {
        RackError::new(
            ErrorClass::QueryType,
            ErrorOrigin::Query,
            format!("operator {op:?} is not applicable to {left:?} and {right:?}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityModel, FieldKind, FieldModel};
    use crate::model::SchemaRegistry;
    use crate::query::parser::parse;
    use std::collections::BTreeMap;

    struct FakeRow(BTreeMap<String, Value>);
    impl Row for FakeRow {
        fn field(&self, name: &str) -> Option<Value> {
            self.0.get(name).cloned()
        }
    }

    fn registry() -> SchemaRegistry {
        const FIELDS: &[FieldModel] = &[
            FieldModel::required("title", FieldKind::String),
            FieldModel::required("author", FieldKind::String),
            FieldModel::with_default("rating", FieldKind::Integer, || Value::Integer(0)),
        ];
        const BOOK: EntityModel = EntityModel {
            type_name: "book",
            fields: FIELDS,
        };
        let mut reg = SchemaRegistry::new();
        reg.register(BOOK).unwrap();
        reg
    }

    fn row(title: &str, author: &str, rating: i64) -> FakeRow {
        let mut m = BTreeMap::new();
        m.insert("title".to_string(), Value::String(title.into()));
        m.insert("author".to_string(), Value::String(author.into()));
        m.insert("rating".to_string(), Value::Integer(rating));
        FakeRow(m)
    }

    #[test]
    fn chained_range_condition() {
        let reg = registry();
        let ast = parse("book: 3 <= rating <= 5", &reg).unwrap();
        assert!(eval(&ast, &row("The B", "A.B. Cee", 4)).unwrap());
        assert!(!eval(&ast, &row("The A", "A.B. Cee", 1)).unwrap());
    }

    #[test]
    fn case_insensitive_starts_with() {
        let reg = registry();
        let ast = parse(r#"book: title <%. "the""#, &reg).unwrap();
        assert!(eval(&ast, &row("The A", "A.B. Cee", 1)).unwrap());
        assert!(eval(&ast, &row("the b", "A.B. Cee", 1)).unwrap());
        assert!(!eval(&ast, &row("E Up!", "B.C. Dea", 4)).unwrap());
    }

    #[test]
    fn member_of_list_literal() {
        let reg = registry();
        let ast = parse(r#"book: author -> "A.B. Cee", "B.C. Dea""#, &reg).unwrap();
        assert!(eval(&ast, &row("x", "A.B. Cee", 1)).unwrap());
        assert!(eval(&ast, &row("x", "B.C. Dea", 1)).unwrap());
        assert!(!eval(&ast, &row("x", "Nobody", 1)).unwrap());
    }

    #[test]
    fn type_mismatch_is_query_type_error() {
        let reg = registry();
        let ast = parse(r#"book: title <% rating"#, &reg).unwrap();
        let err = eval(&ast, &row("x", "y", 1)).unwrap_err();
        assert_eq!(err.class, ErrorClass::QueryType);
    }
}

//! Query parser (spec §4.3). Schema-aware: bare identifiers are resolved
//! against the target's declared fields as the AST is built, so an
//! unresolved identifier fails at parse time with a `QueryParseError`
//! carrying a byte offset (spec §9, open-question resolution).
//!
//! `target := IDENT` admits both a registered entry type and a tag name
//! (spec §4.3 grammar); which one a given target string actually names is
//! data, not schema, so it isn't decided here — a target that isn't a
//! registered type resolves its fields against the built-in `tag` row
//! shape (`name`/`data`/`fk_data`), and `Store` decides at execution time
//! whether that target is the literal `tag` type (rejected), an existing
//! tag's name (evaluated against that one record), or neither.

use crate::error::RackError;
use crate::model::{EntityModel, SchemaRegistry};
use crate::query::ast::{Ast, Condition, Op, Operand};
use crate::query::lexer::{lex, Spanned, Token};
use crate::value::Value;

pub fn parse(src: &str, registry: &SchemaRegistry) -> Result<Ast, RackError> {
    let tokens = lex(src)?;
    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
    };

    let target = cursor.expect_ident()?;
    cursor.expect(Token::Colon)?;

    let mut conditions = Vec::new();
    loop {
        conditions.push(parse_condition(&mut cursor, registry, &target)?);
        if cursor.eat(&Token::Semicolon) {
            continue;
        }
        break;
    }
    cursor.expect_eof()?;

    Ok(Ast { target, conditions })
}

struct Cursor<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token) -> Result<(), RackError> {
        if self.peek() == &tok {
            self.advance();
            Ok(())
        } else {
            Err(RackError::parse(
                format!("expected {tok:?}, found {:?}", self.peek()),
                self.offset(),
                vec!["expected token"],
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, RackError> {
        match self.peek().clone() {
            Token::Ident(s) => {
                self.advance();
                Ok(s)
            }
            other => Err(RackError::parse(
                format!("expected identifier, found {other:?}"),
                self.offset(),
                vec!["identifier"],
            )),
        }
    }

    fn expect_eof(&mut self) -> Result<(), RackError> {
        if self.peek() == &Token::Eof {
            Ok(())
        } else {
            Err(RackError::parse(
                format!("unexpected trailing input: {:?}", self.peek()),
                self.offset(),
                vec!["';'", "end of query"],
            ))
        }
    }

    fn peek_op(&self) -> Option<Op> {
        match self.peek() {
            Token::Op(op) => Some(*op),
            _ => None,
        }
    }
}

fn parse_condition(
    cursor: &mut Cursor<'_>,
    registry: &SchemaRegistry,
    target: &str,
) -> Result<Condition, RackError> {
    let mut operands = vec![parse_operand(cursor, registry, target)?];
    let mut ops = Vec::new();

    while let Some(op) = cursor.peek_op() {
        cursor.advance();
        ops.push(op);
        operands.push(parse_operand(cursor, registry, target)?);
    }

    if ops.is_empty() {
        return Err(RackError::parse(
            "a condition needs at least one operator",
            cursor.offset(),
            vec!["operator"],
        ));
    }

    Ok(Condition { operands, ops })
}

fn parse_operand(
    cursor: &mut Cursor<'_>,
    registry: &SchemaRegistry,
    target: &str,
) -> Result<Operand, RackError> {
    let first = parse_single_operand(cursor, registry, target)?;

    // LIST := literal (',' literal)* — only literals chain via comma; a
    // field reference is never the head of a comma-joined list.
    let Operand::Literal(first_value) = first else {
        return Ok(first);
    };

    if cursor.peek() != &Token::Comma {
        return Ok(Operand::Literal(first_value));
    }

    let mut items = vec![first_value];
    while cursor.eat(&Token::Comma) {
        match parse_single_operand(cursor, registry, target)? {
            Operand::Literal(v) => items.push(v),
            Operand::Field(name) => {
                return Err(RackError::parse(
                    format!("'{name}' cannot appear inside a literal list"),
                    cursor.offset(),
                    vec!["literal"],
                ))
            }
        }
    }
    Ok(Operand::Literal(Value::List(items)))
}

/// The row shape used to resolve bare identifiers for `target`: the
/// registered schema if `target` names one, otherwise the built-in tag row
/// shape (covers both the literal `tag` type and a query against a named
/// tag instance, which share the same fields).
fn target_schema(registry: &SchemaRegistry, target: &str) -> EntityModel {
    registry
        .schema_for(target)
        .ok()
        .copied()
        .unwrap_or_else(crate::tag::tag_schema)
}

fn parse_single_operand(
    cursor: &mut Cursor<'_>,
    registry: &SchemaRegistry,
    target: &str,
) -> Result<Operand, RackError> {
    let offset = cursor.offset();
    match cursor.advance() {
        Token::Int(i) => Ok(Operand::Literal(Value::Integer(i))),
        Token::Float(f) => Ok(Operand::Literal(Value::Float(f))),
        Token::Bool(b) => Ok(Operand::Literal(Value::Bool(b))),
        Token::String(s) => Ok(Operand::Literal(Value::String(s))),
        Token::Ident(name) => {
            let schema = target_schema(registry, target);
            if schema.field(&name).is_some() {
                Ok(Operand::Field(name))
            } else {
                Err(RackError::parse(
                    format!("'{name}' is not a field of '{target}'"),
                    offset,
                    vec!["field name", "quoted string literal"],
                ))
            }
        }
        other => Err(RackError::parse(
            format!("expected an operand, found {other:?}"),
            offset,
            vec!["literal", "field name"],
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityModel, FieldKind, FieldModel};

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

    #[test]
    fn parses_chained_condition_and_semicolon() {
        let reg = registry();
        let ast = parse(
            r#"book: 3 <= rating <= 5 ; author -> "A.B. Cee", "B.C. Dea""#,
            &reg,
        )
        .unwrap();
        assert_eq!(ast.target, "book");
        assert_eq!(ast.conditions.len(), 2);
        assert_eq!(ast.conditions[0].ops, vec![Op::Lte, Op::Lte]);
        match &ast.conditions[1].operands[1] {
            Operand::Literal(Value::List(items)) => assert_eq!(items.len(), 2),
            other => panic!("expected list literal, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_bare_identifier_is_parse_error() {
        let reg = registry();
        let err = parse("book: bogus == 1", &reg).unwrap_err();
        assert!(err.parse.is_some());
    }

    #[test]
    fn unknown_target_is_parse_error() {
        let reg = registry();
        let err = parse("movie: title == \"X\"", &reg).unwrap_err();
        assert!(err.parse.is_some());
    }
}

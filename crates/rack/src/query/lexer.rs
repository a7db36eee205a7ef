//! Query lexer (spec §4.3). Longest-match tokenization of operators; `.`
//! suffix marks case-insensitive string ops, leading `!` marks negation.

use crate::error::RackError;
use crate::query::ast::Op;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Op(Op),
    Colon,
    Semicolon,
    Comma,
    Eof,
}

#[derive(Clone, Debug)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

// Ordered longest-match first.
const OPERATOR_TABLE: &[(&str, Op)] = &[
    ("!->.", Op::NotMemberOfCi),
    ("!<%.", Op::NotStartsWithCi),
    ("!%>.", Op::NotEndsWithCi),
    ("!=.", Op::NotEqCi),
    ("->.", Op::MemberOfCi),
    ("<%.", Op::StartsWithCi),
    ("%>.", Op::EndsWithCi),
    ("==.", Op::EqCi),
    ("!->", Op::NotMemberOf),
    ("!<%", Op::NotStartsWith),
    ("!%>", Op::NotEndsWith),
    ("!=", Op::NotEq),
    ("->", Op::MemberOf),
    ("<%", Op::StartsWith),
    ("%>", Op::EndsWith),
    ("==", Op::Eq),
    ("=>", Op::IdentityEq),
    ("<=", Op::Lte),
    (">=", Op::Gte),
    ("<", Op::Lt),
    (">", Op::Gt),
];

pub fn lex(src: &str) -> Result<Vec<Spanned>, RackError> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            ':' => {
                out.push(Spanned { token: Token::Colon, offset: i });
                i += 1;
                continue;
            }
            ';' => {
                out.push(Spanned { token: Token::Semicolon, offset: i });
                i += 1;
                continue;
            }
            ',' => {
                out.push(Spanned { token: Token::Comma, offset: i });
                i += 1;
                continue;
            }
            '"' => {
                let (s, next) = lex_string(src, i)?;
                out.push(Spanned { token: Token::String(s), offset: i });
                i = next;
                continue;
            }
            _ => {}
        }

        if let Some((text, op)) = OPERATOR_TABLE
            .iter()
            .find(|(text, _)| src[i..].starts_with(text))
        {
            out.push(Spanned { token: Token::Op(*op), offset: i });
            i += text.len();
            continue;
        }

        if c.is_ascii_digit() || (c == '-' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit()) {
            let (tok, next) = lex_number(src, i);
            out.push(Spanned { token: tok, offset: i });
            i = next;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && ((bytes[i] as char).is_alphanumeric() || bytes[i] as char == '_') {
                i += 1;
            }
            let word = &src[start..i];
            let token = match word {
                "True" => Token::Bool(true),
                "False" => Token::Bool(false),
                _ => Token::Ident(word.to_string()),
            };
            out.push(Spanned { token, offset: start });
            continue;
        }

        return Err(RackError::parse(
            format!("unexpected character '{c}'"),
            i,
            vec!["identifier", "literal", "operator"],
        ));
    }

    out.push(Spanned { token: Token::Eof, offset: bytes.len() });
    Ok(out)
}

fn lex_string(src: &str, start: usize) -> Result<(String, usize), RackError> {
    let bytes = src.as_bytes();
    let mut i = start + 1;
    let mut out = String::new();
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '"' {
            return Ok((out, i + 1));
        }
        if c == '\\' && i + 1 < bytes.len() {
            out.push(bytes[i + 1] as char);
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }
    Err(RackError::parse(
        "unterminated string literal",
        start,
        vec!["\""],
    ))
}

fn lex_number(src: &str, start: usize) -> (Token, usize) {
    let bytes = src.as_bytes();
    let mut i = start;
    if bytes[i] as char == '-' {
        i += 1;
    }
    while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
        i += 1;
    }
    let mut is_float = false;
    if i < bytes.len() && bytes[i] as char == '.' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit() {
        is_float = true;
        i += 1;
        while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
            i += 1;
        }
    }
    let text = &src[start..i];
    if is_float {
        (Token::Float(text.parse().unwrap_or(0.0)), i)
    } else {
        (Token::Int(text.parse().unwrap_or(0)), i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_match_operators() {
        let toks = lex("a !->. b").unwrap();
        assert_eq!(toks[1].token, Token::Op(Op::NotMemberOfCi));
    }

    #[test]
    fn dotless_before_dot_is_not_picked_early() {
        // `->` must not shadow `->.`
        let toks = lex("a ->. b").unwrap();
        assert_eq!(toks[1].token, Token::Op(Op::MemberOfCi));
    }

    #[test]
    fn strings_and_bools() {
        let toks = lex(r#"title <%. "the" ; ok == True"#).unwrap();
        assert!(toks.iter().any(|t| t.token == Token::String("the".into())));
        assert!(toks.iter().any(|t| t.token == Token::Bool(true)));
    }

    #[test]
    fn negative_integers() {
        let toks = lex("rating == -1").unwrap();
        assert!(toks.iter().any(|t| t.token == Token::Int(-1)));
    }
}

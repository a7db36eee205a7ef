//! `Query::statement` template formatter (spec §4.3.1): the only
//! sanctioned way to build queries programmatically.

use crate::error::{ErrorClass, ErrorOrigin, RackError};
use crate::value::Value;

/// Substitute `{}` (positional) and `{name}` (named) placeholders in
/// `template` with literal-encoded values, then prefix with `{target}:`.
pub fn statement(
    target: &str,
    template: &str,
    positional: &[Value],
    named: &[(&str, Value)],
) -> Result<String, RackError> {
    let mut out = String::new();
    let mut chars = template.char_indices().peekable();
    let mut positional_idx = 0usize;

    while let Some((i, c)) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let close = template[i..]
            .find('}')
            .map(|rel| i + rel)
            .ok_or_else(|| {
                RackError::new(
                    ErrorClass::QueryParse,
                    ErrorOrigin::Query,
                    "unterminated '{' placeholder in statement template",
                )
            })?;
        let name = &template[i + 1..close];

        let value = if name.is_empty() {
            let value = positional.get(positional_idx).ok_or_else(|| {
                RackError::new(
                    ErrorClass::QueryParse,
                    ErrorOrigin::Query,
                    "not enough positional arguments for statement template",
                )
            })?;
            positional_idx += 1;
            value
        } else {
            named
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| {
                    RackError::new(
                        ErrorClass::QueryParse,
                        ErrorOrigin::Query,
                        format!("no named argument '{name}' for statement template"),
                    )
                })?
        };

        out.push_str(&value.literal_encode());

        // Skip consumed chars up through the closing '}'.
        while let Some(&(j, _)) = chars.peek() {
            if j >= close {
                break;
            }
            chars.next();
        }
        chars.next();
    }

    Ok(format!("{target}: {out}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_substitution() {
        let q = statement(
            "book",
            "rating >= {} ; author == {}",
            &[Value::Integer(3), Value::String("A.B. Cee".into())],
            &[],
        )
        .unwrap();
        assert_eq!(q, r#"book: rating >= 3 ; author == "A.B. Cee""#);
    }

    #[test]
    fn named_substitution() {
        let q = statement(
            "book",
            "rating >= {min}",
            &[],
            &[("min", Value::Integer(4))],
        )
        .unwrap();
        assert_eq!(q, "book: rating >= 4");
    }
}

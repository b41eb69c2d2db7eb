//! Pretty-printing of nested metric expressions.
//!
//! [`indent`] breaks a flat expression such as `f(a,g(b,c))` into one
//! argument per line, and [`dedent`] flattens it back by dropping all
//! whitespace. Neither validates the expression; use [`check_balance`] when
//! unbalanced parentheses should be rejected.

use crate::{Error, Result};

/// One level of indentation.
pub const INDENT_UNIT: &str = "  ";

fn push_line_break(out: &mut String, depth: i64) {
    out.push('\n');
    // A negative depth still renders |depth| units.
    for _ in 0..depth.unsigned_abs() {
        out.push_str(INDENT_UNIT);
    }
}

/// Indent a flat metric expression.
///
/// Opens a new line after every `(` and `,`, and puts every `)` on its own
/// line one level shallower. Text between structural characters is copied
/// through unchanged.
pub fn indent(flat: &str) -> String {
    let mut out = String::with_capacity(flat.len() * 2);
    let mut depth: i64 = 0;
    let mut start = 0;

    for (i, c) in flat.char_indices() {
        match c {
            '(' => {
                depth += 1;
                out.push_str(&flat[start..=i]);
                start = i + 1;
                push_line_break(&mut out, depth);
            }
            ')' => {
                out.push_str(&flat[start..i]);
                depth -= 1;
                push_line_break(&mut out, depth);
                out.push(')');
                start = i + 1;
            }
            ',' => {
                out.push_str(&flat[start..=i]);
                start = i + 1;
                push_line_break(&mut out, depth);
            }
            _ => {}
        }
    }

    out.push_str(&flat[start..]);
    out
}

/// Flatten a pretty-printed expression by removing every whitespace
/// character.
pub fn dedent(pretty: &str) -> String {
    pretty.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Reject expressions whose parentheses do not balance.
pub fn check_balance(expr: &str) -> Result<()> {
    let mut depth = 0usize;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::UnbalancedExpression(format!("unmatched ')' at offset {}", i))
                })?;
            }
            _ => {}
        }
    }
    if depth > 0 {
        return Err(Error::UnbalancedExpression(format!("{} unclosed '('", depth)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_nested_call() {
        assert_eq!(
            indent("f(a,g(b,c))"),
            "f(\n  a,\n  g(\n    b,\n    c\n  )\n)"
        );
    }

    #[test]
    fn test_indent_plain_metric() {
        assert_eq!(indent("web.requests.rate"), "web.requests.rate");
    }

    #[test]
    fn test_indent_empty() {
        assert_eq!(indent(""), "");
    }

    #[test]
    fn test_indent_graphite_function() {
        let pretty = indent("sumSeries(web.*.rate,5)");
        assert_eq!(pretty, "sumSeries(\n  web.*.rate,\n  5\n)");
    }

    #[test]
    fn test_indent_empty_call() {
        assert_eq!(indent("f()"), "f(\n  \n)");
    }

    #[test]
    fn test_indent_unbalanced_close_is_lenient() {
        // Depth goes to -1; one indent unit is still emitted.
        assert_eq!(indent("a)b"), "a\n  )b");
    }

    #[test]
    fn test_indent_unclosed_open_is_lenient() {
        assert_eq!(indent("f(a"), "f(\n  a");
    }

    #[test]
    fn test_indent_multibyte_text() {
        assert_eq!(indent("é(ü,ß)"), "é(\n  ü,\n  ß\n)");
    }

    #[test]
    fn test_dedent_strips_all_whitespace() {
        assert_eq!(dedent(" f(\n\ta, b )\r\n"), "f(a,b)");
    }

    #[test]
    fn test_dedent_inverts_indent() {
        let flat = "alias(sumSeries(a.b.c,d.e.f),\"total\")";
        assert_eq!(dedent(&indent(flat)), flat);
    }

    #[test]
    fn test_dedent_idempotent() {
        let once = dedent("f (\n  a ,b)");
        assert_eq!(dedent(&once), once);
    }

    #[test]
    fn test_check_balance_ok() {
        assert!(check_balance("f(a,g(b,c))").is_ok());
        assert!(check_balance("plain.metric").is_ok());
    }

    #[test]
    fn test_check_balance_unmatched_close() {
        let err = check_balance("f(a))").unwrap_err();
        assert!(matches!(err, Error::UnbalancedExpression(ref m) if m.contains("offset 4")));
    }

    #[test]
    fn test_check_balance_unclosed_open() {
        let err = check_balance("f(g(a)").unwrap_err();
        assert!(matches!(err, Error::UnbalancedExpression(ref m) if m.contains("1 unclosed")));
    }
}

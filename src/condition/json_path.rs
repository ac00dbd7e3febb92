//! JSONPath predicate conditions.
//!
//! Grammar:
//! - `<path>` matches when the path selects at least one non-null value
//! - `<path> == <literal>` matches when any selected value equals the literal
//! - `<path> != <literal>` matches when no selected value equals the literal
//!
//! Paths start with `$`; a leading `.` is shorthand for `$.`. Literals are
//! parsed as JSON and fall back to a (quote-stripped) string, so
//! `$.tier == 'vip'` and `$.tier == "vip"` are equivalent.

use std::panic::{catch_unwind, AssertUnwindSafe};

use jsonpath_lib::select;
use serde_json::Value;

use crate::condition::{strip_quotes, ConditionError, ConditionEvaluator, RequestContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
}

#[derive(Debug)]
struct Predicate {
    path: String,
    comparison: Option<(Operator, Value)>,
}

impl Predicate {
    fn matches(&self, expression: &str, root: &Value) -> Result<bool, ConditionError> {
        let found = select_guarded(expression, root, &self.path)?;
        Ok(match &self.comparison {
            None => found.iter().any(|v| !v.is_null()),
            Some((Operator::Eq, literal)) => found.iter().any(|v| *v == literal),
            Some((Operator::Ne, literal)) => !found.iter().any(|v| *v == literal),
        })
    }
}

/// Evaluates JSONPath predicates against the parsed content.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathEvaluator;

impl JsonPathEvaluator {
    /// Split an expression into path and comparison. No path compilation.
    fn parse(expression: &str) -> Result<Predicate, ConditionError> {
        let expr = expression.trim();
        if expr.is_empty() {
            return Err(ConditionError::Empty);
        }

        let (lhs, comparison) = match find_operator(expr) {
            Some((at, op)) => {
                let rhs = expr[at + 2..].trim();
                if rhs.is_empty() {
                    return Err(ConditionError::syntax(expression, "missing right-hand literal"));
                }
                (expr[..at].trim(), Some((op, parse_literal(rhs))))
            }
            None => (expr, None),
        };

        let path = normalize_path(lhs)
            .ok_or_else(|| ConditionError::syntax(expression, "path must start with '$' or '.'"))?;
        if has_zero_step_slice(&path) {
            return Err(ConditionError::syntax(expression, "slice step must not be zero"));
        }

        Ok(Predicate { path, comparison })
    }
}

impl ConditionEvaluator for JsonPathEvaluator {
    fn name(&self) -> &'static str {
        "json_path"
    }

    fn evaluate(&self, expression: &str, content: &str) -> Result<bool, ConditionError> {
        self.evaluate_content(expression, &RequestContent::new(content))
    }

    fn evaluate_content(
        &self,
        expression: &str,
        content: &RequestContent<'_>,
    ) -> Result<bool, ConditionError> {
        let predicate = Self::parse(expression)?;
        predicate.matches(expression, content.json()?)
    }

    fn check(&self, expression: &str) -> Result<(), ConditionError> {
        let predicate = Self::parse(expression)?;
        // Compile against an empty document to surface path errors.
        select_guarded(expression, &Value::Null, &predicate.path).map(|_| ())
    }
}

/// `jsonpath_lib::select`, with selector panics turned into syntax errors.
///
/// The library panics on some malformed filters instead of returning an error.
fn select_guarded<'v>(
    expression: &str,
    root: &'v Value,
    path: &str,
) -> Result<Vec<&'v Value>, ConditionError> {
    match catch_unwind(AssertUnwindSafe(|| select(root, path))) {
        Ok(Ok(found)) => Ok(found),
        Ok(Err(e)) => Err(ConditionError::syntax(expression, sanitize(&e.to_string()))),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "selector panicked".to_string());
            tracing::debug!(path = %path, reason = %reason, "JSONPath selector panicked");
            Err(ConditionError::syntax(expression, format!("unsupported path: {}", sanitize(&reason))))
        }
    }
}

/// Locate a top-level `==` / `!=`, ignoring operators inside brackets,
/// parentheses (filter expressions) and quoted strings.
fn find_operator(expr: &str) -> Option<(usize, Operator)> {
    let bytes = expr.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;

    for i in 0..bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            b'\'' | b'"' => quote = Some(c),
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth = depth.saturating_sub(1),
            b'=' | b'!' if depth == 0 && bytes.get(i + 1) == Some(&b'=') => {
                let op = if c == b'=' { Operator::Eq } else { Operator::Ne };
                return Some((i, op));
            }
            _ => {}
        }
    }
    None
}

/// True if any bracket holds a `start:end:step` slice whose step is zero.
fn has_zero_step_slice(path: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut open: Option<usize> = None;

    for (i, c) in path.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' => open = Some(i),
            ']' => {
                if let Some(start) = open.take() {
                    let parts: Vec<&str> = path[start + 1..i].split(':').collect();
                    if parts.len() == 3 && parts[2].trim().parse::<i64>() == Ok(0) {
                        return true;
                    }
                }
            }
            _ => {}
        }
    }
    false
}

fn normalize_path(raw: &str) -> Option<String> {
    if raw == "." {
        Some("$".to_string())
    } else if raw.starts_with('.') {
        Some(format!("${raw}"))
    } else if raw.starts_with('$') {
        Some(raw.to_string())
    } else {
        None
    }
}

fn parse_literal(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(strip_quotes(raw).to_string()))
}

fn sanitize(message: &str) -> String {
    message.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str =
        r#"{"tier":"vip","amount":42,"customer":{"country":"NL"},"tags":["a","b"],"note":null}"#;

    #[test]
    fn test_equality() {
        let eval = JsonPathEvaluator;
        assert!(eval.evaluate("$.tier == \"vip\"", CONTENT).unwrap());
        assert!(eval.evaluate("$.tier == 'vip'", CONTENT).unwrap());
        assert!(eval.evaluate("$.tier == vip", CONTENT).unwrap());
        assert!(eval.evaluate("$.amount == 42", CONTENT).unwrap());
        assert!(eval.evaluate(".customer.country == \"NL\"", CONTENT).unwrap());
        assert!(!eval.evaluate("$.tier == \"gold\"", CONTENT).unwrap());
    }

    #[test]
    fn test_inequality() {
        let eval = JsonPathEvaluator;
        assert!(eval.evaluate("$.tier != \"gold\"", CONTENT).unwrap());
        assert!(!eval.evaluate("$.tier != \"vip\"", CONTENT).unwrap());
        assert!(eval.evaluate("$.missing != 1", CONTENT).unwrap());
    }

    #[test]
    fn test_existence() {
        let eval = JsonPathEvaluator;
        assert!(eval.evaluate("$.customer", CONTENT).unwrap());
        assert!(eval.evaluate("$.tags[1]", CONTENT).unwrap());
        assert!(!eval.evaluate("$.missing", CONTENT).unwrap());
        assert!(!eval.evaluate("$.note", CONTENT).unwrap());
    }

    #[test]
    fn test_operator_inside_filter_is_not_split() {
        assert_eq!(find_operator("$[?(@.a == 1)]"), None);
        assert_eq!(find_operator("$.a == '=='"), Some((4, Operator::Eq)));
        assert_eq!(find_operator("$.a != 1"), Some((4, Operator::Ne)));
    }

    #[test]
    fn test_content_errors() {
        let eval = JsonPathEvaluator;
        assert!(matches!(
            eval.evaluate("$.tier", "not json"),
            Err(ConditionError::Content(_))
        ));
        // Absent body serializes to `null`, which is valid JSON.
        assert!(!eval.evaluate("$.tier", "null").unwrap());
    }

    #[test]
    fn test_syntax_errors() {
        let eval = JsonPathEvaluator;
        assert_eq!(eval.check(""), Err(ConditionError::Empty));
        assert!(matches!(eval.check("tier == 1"), Err(ConditionError::Syntax { .. })));
        assert!(matches!(eval.check("$.tier =="), Err(ConditionError::Syntax { .. })));
        assert!(eval.check("$.tier == 'vip'").is_ok());
    }

    const ITEMS: &str = r#"{"a":[1,2,3],"items":[{"qty":1,"sku":"x"},{"qty":3,"sku":"y"}]}"#;

    #[test]
    fn test_filter_expressions() {
        let eval = JsonPathEvaluator;
        assert!(eval.check("$.items[?(@.qty > 2)]").is_ok());
        assert!(eval.evaluate("$.items[?(@.qty > 2)]", ITEMS).unwrap());
        assert!(!eval.evaluate("$.items[?(@.qty > 5)]", ITEMS).unwrap());
        assert!(eval.evaluate("$.items[?(@.qty == 3)].sku == \"y\"", ITEMS).unwrap());
    }

    #[test]
    fn test_slices() {
        let eval = JsonPathEvaluator;
        assert!(eval.evaluate("$.a[0:1]", ITEMS).unwrap());
        assert!(eval.evaluate("$.a[0:2] == 2", ITEMS).unwrap());
        assert!(!eval.evaluate("$.a[0:2] == 3", ITEMS).unwrap());
    }

    #[test]
    fn test_selector_panics_become_syntax_errors() {
        let eval = JsonPathEvaluator;
        for expr in ["$[?(@.a[0] == 1)]", "$.a[::0]", "$.a[0:2:0]"] {
            assert!(
                matches!(eval.check(expr), Err(ConditionError::Syntax { .. })),
                "check {expr}"
            );
            assert!(
                matches!(eval.evaluate(expr, ITEMS), Err(ConditionError::Syntax { .. })),
                "evaluate {expr}"
            );
        }
    }

    #[test]
    fn test_select_guarded_catches_panic() {
        let root: Value = serde_json::from_str(ITEMS).unwrap();
        let err = select_guarded("cond", &root, "$[?(@.a[0] == 1)]").unwrap_err();
        assert!(matches!(err, ConditionError::Syntax { ref expression, .. } if expression == "cond"));
    }

    #[test]
    fn test_zero_step_slice() {
        assert!(has_zero_step_slice("$.a[::0]"));
        assert!(has_zero_step_slice("$.a[0:2: 0]"));
        assert!(!has_zero_step_slice("$.a[0:2]"));
        assert!(!has_zero_step_slice("$.a[0:4:2]"));
        assert!(!has_zero_step_slice("$['x::0']"));
    }

    #[test]
    fn test_content_parsed_once_per_dispatch() {
        let eval = JsonPathEvaluator;
        let content = RequestContent::new(ITEMS);
        assert!(eval.evaluate_content("$.a[0] == 1", &content).unwrap());
        assert!(eval.evaluate_content("$.items[1].qty == 3", &content).unwrap());
        assert!(!eval.evaluate_content("$.missing", &content).unwrap());
    }
}

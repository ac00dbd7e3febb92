//! Substring containment conditions.
//!
//! Grammar:
//! - `contains(<needle>)`, needle optionally wrapped in matching quotes
//! - `<needle>` (bare literal, no parentheses), same quoting rules
//!
//! Matching is case-sensitive and runs over the serialized JSON content, so
//! keys as well as values can match.

use crate::condition::{strip_quotes, ConditionError, ConditionEvaluator};

const FUNCTION: &str = "contains";

/// Matches when the serialized content contains the needle.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsEvaluator;

impl ContainsEvaluator {
    fn needle(expression: &str) -> Result<&str, ConditionError> {
        let expr = expression.trim();
        if expr.is_empty() {
            return Err(ConditionError::Empty);
        }

        let Some(open) = expr.find('(') else {
            if expr.contains(')') {
                return Err(ConditionError::syntax(expression, "unbalanced parentheses"));
            }
            return non_empty(expression, strip_quotes(expr));
        };

        if !expr.ends_with(')') {
            return Err(ConditionError::syntax(expression, "missing closing parenthesis"));
        }

        let name = expr[..open].trim();
        if name != FUNCTION {
            return Err(ConditionError::syntax(
                expression,
                format!("unknown function '{name}'"),
            ));
        }

        non_empty(expression, strip_quotes(expr[open + 1..expr.len() - 1].trim()))
    }
}

fn non_empty<'e>(expression: &str, needle: &'e str) -> Result<&'e str, ConditionError> {
    if needle.is_empty() {
        return Err(ConditionError::syntax(expression, "empty needle"));
    }
    Ok(needle)
}

impl ConditionEvaluator for ContainsEvaluator {
    fn name(&self) -> &'static str {
        FUNCTION
    }

    fn evaluate(&self, expression: &str, content: &str) -> Result<bool, ConditionError> {
        let needle = Self::needle(expression)?;
        Ok(content.contains(needle))
    }

    fn check(&self, expression: &str) -> Result<(), ConditionError> {
        Self::needle(expression).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"{"name":"foo","tier":"vip"}"#;

    #[test]
    fn test_match_when_content_contains_needle() {
        let eval = ContainsEvaluator;
        assert!(eval.evaluate("contains(foo)", CONTENT).unwrap());
        assert!(eval.evaluate("contains('vip')", CONTENT).unwrap());
        assert!(eval.evaluate("contains(\"tier\")", CONTENT).unwrap());
        assert!(eval.evaluate("  contains( foo )  ", CONTENT).unwrap());
    }

    #[test]
    fn test_no_match_when_needle_absent() {
        // Never inverted: absence of the needle is a miss.
        let eval = ContainsEvaluator;
        assert!(!eval.evaluate("contains(bar)", CONTENT).unwrap());
        assert!(!eval.evaluate("contains(FOO)", CONTENT).unwrap());
    }

    #[test]
    fn test_bare_literal() {
        let eval = ContainsEvaluator;
        assert!(eval.evaluate("vip", CONTENT).unwrap());
        assert!(!eval.evaluate("gold", CONTENT).unwrap());
    }

    #[test]
    fn test_quoted_bare_literal_matches_like_function_form() {
        let eval = ContainsEvaluator;
        for expr in ["'vip'", "\"vip\"", "contains('vip')", "vip"] {
            assert!(eval.evaluate(expr, CONTENT).unwrap(), "{expr}");
        }
        assert!(matches!(eval.check("''"), Err(ConditionError::Syntax { .. })));
    }

    #[test]
    fn test_nested_parentheses_in_needle() {
        let eval = ContainsEvaluator;
        assert!(eval.evaluate("contains(f(x))", r#""f(x)""#).unwrap());
    }

    #[test]
    fn test_syntax_errors() {
        let eval = ContainsEvaluator;
        assert_eq!(eval.evaluate("", CONTENT), Err(ConditionError::Empty));
        assert_eq!(eval.check("   "), Err(ConditionError::Empty));
        assert!(matches!(
            eval.evaluate("contains(foo", CONTENT),
            Err(ConditionError::Syntax { .. })
        ));
        assert!(matches!(
            eval.evaluate("startsWith(foo)", CONTENT),
            Err(ConditionError::Syntax { .. })
        ));
        assert!(matches!(eval.check("contains('')"), Err(ConditionError::Syntax { .. })));
        assert!(matches!(eval.check("foo)"), Err(ConditionError::Syntax { .. })));
    }
}

// src/expr/mod.rs — User expression compilation and evaluation
//
// Expressions run in a sandboxed Rhai interpreter with no I/O and hard
// operation limits. The only free variable is `x`. `^` is accepted as an
// alias for the native `**` power operator, since Rhai parses `^` as XOR
// with a precedence that surprises in math notation.

use rhai::{Dynamic, Engine, Scope, AST};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure while parsing an expression, before any run exists.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
}

/// Failure while evaluating f(x) at a concrete point. A non-finite result
/// counts as a failure so NaN and infinities never leak into a search.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluable — the function-of-x seam
// ---------------------------------------------------------------------------

/// A scalar function of one real variable.
///
/// `eval` must return `Err` instead of NaN or infinity. Implementations are
/// shared across threads, so they take `&self`.
pub trait Evaluable: Send + Sync {
    fn eval(&self, x: f64) -> Result<f64, EvalError>;
}

impl<F> Evaluable for F
where
    F: Fn(f64) -> Result<f64, EvalError> + Send + Sync,
{
    fn eval(&self, x: f64) -> Result<f64, EvalError> {
        self(x)
    }
}

// ---------------------------------------------------------------------------
// CompiledExpr — Rhai-backed implementation
// ---------------------------------------------------------------------------

/// An expression compiled once and evaluated many times.
pub struct CompiledExpr {
    engine: Engine,
    ast: AST,
}

impl CompiledExpr {
    /// Compile an expression in the single variable `x`.
    ///
    /// Only expressions are accepted; statements (`let`, `;`) are rejected.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(CompileError {
                message: "expression is empty".into(),
            });
        }

        // Classic math notation: `x^2` means `x ** 2` here.
        let normalized = trimmed.replace('^', "**");

        let engine = math_engine();
        let ast = engine
            .compile_expression(&normalized)
            .map_err(|e| CompileError {
                message: e.to_string(),
            })?;

        Ok(Self { engine, ast })
    }
}

impl Evaluable for CompiledExpr {
    fn eval(&self, x: f64) -> Result<f64, EvalError> {
        let mut scope = Scope::new();
        scope.push("x", x);

        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .map_err(|e| EvalError::new(e.to_string()))?;

        // Integer results are fine ("1 + 2"); anything else is not a number.
        let y = if let Some(f) = value.clone().try_cast::<f64>() {
            f
        } else if let Some(i) = value.clone().try_cast::<i64>() {
            i as f64
        } else {
            return Err(EvalError::new(format!(
                "expression returned {}, not a number",
                value.type_name()
            )));
        };

        if !y.is_finite() {
            return Err(EvalError::new(format!("f({x}) = {y} is not finite")));
        }

        Ok(y)
    }
}

// ---------------------------------------------------------------------------
// Engine factory
// ---------------------------------------------------------------------------

/// Rhai engine tuned for evaluating untrusted scalar expressions.
fn math_engine() -> Engine {
    let mut engine = Engine::new();

    // Safety limits: expressions are user input
    engine.set_max_expr_depths(64, 32);
    engine.set_max_operations(100_000);

    engine
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, x: f64) -> Result<f64, EvalError> {
        CompiledExpr::compile(src).unwrap().eval(x)
    }

    #[test]
    fn test_quadratic() {
        assert_eq!(eval("x^2", 3.0).unwrap(), 9.0);
        assert_eq!(eval("x ** 2", 3.0).unwrap(), 9.0);
    }

    #[test]
    fn test_power_binds_tighter_than_plus() {
        // x^2 + 1 must be (x^2) + 1, not x^(2 + 1)
        assert_eq!(eval("x^2 + 1", 2.0).unwrap(), 5.0);
    }

    #[test]
    fn test_mixed_int_float_arithmetic() {
        assert_eq!(eval("1 + 2", 0.0).unwrap(), 3.0);
        assert_eq!(eval("2 + 3 * x", 2.0).unwrap(), 8.0);
        assert_eq!(eval("2 ^ x", 3.0).unwrap(), 8.0);
    }

    #[test]
    fn test_builtin_math_functions() {
        assert!((eval("sin(x) + cos(x)", 0.0).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(eval("sqrt(x)", 9.0).unwrap(), 3.0);
        assert_eq!(eval("exp(x)", 0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_unknown_variable_fails_at_eval() {
        let f = CompiledExpr::compile("y + 1").unwrap();
        let err = f.eval(0.0).unwrap_err();
        assert!(err.message.contains('y'), "got: {}", err.message);
    }

    #[test]
    fn test_empty_expression_rejected() {
        assert!(CompiledExpr::compile("").is_err());
        assert!(CompiledExpr::compile("   ").is_err());
    }

    #[test]
    fn test_syntax_error_rejected() {
        assert!(CompiledExpr::compile("x +").is_err());
        assert!(CompiledExpr::compile("sin(").is_err());
    }

    #[test]
    fn test_statements_rejected() {
        assert!(CompiledExpr::compile("let y = 1; y").is_err());
    }

    #[test]
    fn test_division_by_zero_is_eval_error() {
        let err = eval("1/x", 0.0).unwrap_err();
        assert!(err.message.contains("not finite"), "got: {}", err.message);
    }

    #[test]
    fn test_nan_is_eval_error() {
        assert!(eval("sqrt(x)", -1.0).is_err());
    }

    #[test]
    fn test_negative_exponent() {
        assert_eq!(eval("x^-1", 4.0).unwrap(), 0.25);
    }

    #[test]
    fn test_closure_implements_evaluable() {
        let f = |x: f64| -> Result<f64, EvalError> { Ok(x + 1.0) };
        assert_eq!(f.eval(1.0).unwrap(), 2.0);
    }
}

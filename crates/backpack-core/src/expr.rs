//! Safe numeric expression evaluation for simulation formulas.
//!
//! Expression-mode simulation lets a config file describe each channel
//! as a formula over a sweeping index `x`, e.g. `10 * sin(x / 10) + 16`.
//! Formulas are parsed once into an evalexpr operator tree and
//! evaluated against a closed context: arithmetic, a fixed allow-list
//! of math functions, and the constants `pi` and `e`. Nothing outside
//! that context is reachable — this is deliberately not a scripting
//! engine.

use evalexpr::{
    ContextWithMutableFunctions, ContextWithMutableVariables, EvalexprError, Function,
    HashMapContext, Node, Value, build_operator_tree,
};

use crate::error::{Error, Result};

/// A simulation formula compiled for repeated evaluation.
///
/// An empty formula is valid and evaluates to a constant `0.0`,
/// matching the behavior of an unset channel in the configuration.
#[derive(Debug)]
pub struct CompiledExpression {
    channel: String,
    node: Option<Node>,
    context: HashMapContext,
}

impl CompiledExpression {
    /// Compile a formula for the named channel.
    ///
    /// Parse failures and references to anything outside the math
    /// allow-list are configuration errors, surfaced here (a trial
    /// evaluation runs at compile time) rather than mid-poll.
    pub fn compile(channel: &str, formula: &str) -> Result<Self> {
        let trimmed = formula.trim();
        if trimmed.is_empty() {
            return Ok(Self {
                channel: channel.to_string(),
                node: None,
                context: HashMapContext::new(),
            });
        }

        let node = build_operator_tree(trimmed)
            .map_err(|e| Error::bad_expression(channel, e.to_string()))?;
        let context =
            math_context().map_err(|e| Error::bad_expression(channel, e.to_string()))?;

        let mut compiled = Self {
            channel: channel.to_string(),
            node: Some(node),
            context,
        };
        // Unknown identifiers only surface on evaluation; probe now so
        // a bad formula is fatal at startup, not during serving.
        compiled.evaluate(1.0)?;
        Ok(compiled)
    }

    /// Evaluate the formula at index `x`.
    pub fn evaluate(&mut self, x: f64) -> Result<f64> {
        let Some(node) = &self.node else {
            return Ok(0.0);
        };
        self.context
            .set_value("x".into(), Value::Float(x))
            .and_then(|_| node.eval_number_with_context(&self.context))
            .map_err(|e| Error::bad_expression(&self.channel, e.to_string()))
    }
}

fn unary(f: fn(f64) -> f64) -> Function {
    Function::new(move |argument| {
        let x = argument.as_number()?;
        Ok(Value::Float(f(x)))
    })
}

fn binary(f: fn(f64, f64) -> f64) -> Function {
    Function::new(move |argument| {
        let args = argument.as_fixed_len_tuple(2)?;
        let (a, b) = (args[0].as_number()?, args[1].as_number()?);
        Ok(Value::Float(f(a, b)))
    })
}

/// The closed evaluation context: standard math functions plus `pi`
/// and `e`. The sweep variable `x` is set per evaluation.
fn math_context() -> std::result::Result<HashMapContext, EvalexprError> {
    let unary_fns: [(&str, fn(f64) -> f64); 18] = [
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("asin", f64::asin),
        ("acos", f64::acos),
        ("atan", f64::atan),
        ("sinh", f64::sinh),
        ("cosh", f64::cosh),
        ("tanh", f64::tanh),
        ("sqrt", f64::sqrt),
        ("exp", f64::exp),
        ("ln", f64::ln),
        ("log", f64::ln),
        ("log10", f64::log10),
        ("log2", f64::log2),
        ("abs", f64::abs),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
    ];
    let binary_fns: [(&str, fn(f64, f64) -> f64); 3] = [
        ("pow", f64::powf),
        ("atan2", f64::atan2),
        ("hypot", f64::hypot),
    ];

    let mut context = HashMapContext::new();
    for (name, f) in unary_fns {
        context.set_function(name.into(), unary(f))?;
    }
    for (name, f) in binary_fns {
        context.set_function(name.into(), binary(f))?;
    }
    context.set_value("pi".into(), Value::Float(std::f64::consts::PI))?;
    context.set_value("e".into(), Value::Float(std::f64::consts::E))?;
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_over_x() {
        let mut expr = CompiledExpression::compile("CH4", "2 * x + 1").unwrap();
        assert_eq!(expr.evaluate(3.0).unwrap(), 7.0);
        assert_eq!(expr.evaluate(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_math_functions() {
        let mut expr = CompiledExpression::compile("CH4", "10 * sin(x / 10) + 16").unwrap();
        let value = expr.evaluate(5.0).unwrap();
        assert!((value - (10.0 * (0.5f64).sin() + 16.0)).abs() < 1e-12);

        let mut expr = CompiledExpression::compile("CO2", "sqrt(abs(x))").unwrap();
        assert_eq!(expr.evaluate(-9.0).unwrap(), 3.0);

        let mut expr = CompiledExpression::compile("H2O", "pow(x, 2) + hypot(3, 4)").unwrap();
        assert_eq!(expr.evaluate(2.0).unwrap(), 9.0);
    }

    #[test]
    fn test_constants() {
        let mut expr = CompiledExpression::compile("CH4", "cos(2 * pi)").unwrap();
        assert!((expr.evaluate(1.0).unwrap() - 1.0).abs() < 1e-12);

        let mut expr = CompiledExpression::compile("CH4", "ln(e)").unwrap();
        assert!((expr.evaluate(1.0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_formula_is_constant_zero() {
        let mut expr = CompiledExpression::compile("CO2", "").unwrap();
        assert_eq!(expr.evaluate(42.0).unwrap(), 0.0);
        let mut expr = CompiledExpression::compile("CO2", "   ").unwrap();
        assert_eq!(expr.evaluate(1.0).unwrap(), 0.0);
    }

    #[test]
    fn test_parse_error_is_fatal_at_compile() {
        let err = CompiledExpression::compile("CH4", "2 *").unwrap_err();
        assert!(matches!(err, Error::BadExpression { .. }));
        assert!(err.to_string().contains("CH4"));
    }

    #[test]
    fn test_unknown_identifier_is_fatal_at_compile() {
        // Only the allow-listed functions exist; anything else is
        // caught by the compile-time probe evaluation.
        assert!(CompiledExpression::compile("CH4", "sine(x)").is_err());
        assert!(CompiledExpression::compile("CH4", "open(x)").is_err());
        assert!(CompiledExpression::compile("CH4", "y + 1").is_err());
    }
}

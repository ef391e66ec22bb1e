//! Expression-string evaluators
//!
//! Derived parameters declared in configuration carry an arithmetic
//! expression over other parameter names instead of a compiled formula:
//!
//! ```text
//! baseline_mm / interpupillary_distance_mm
//! degrees(2 * atan(frame_width_mm / (2 * focal_length_mm)))
//! ```
//!
//! Supported syntax: numbers, identifiers, `+ - * / ^`, unary minus,
//! parentheses and the functions listed in [`Function`]. `^` binds tighter
//! than unary minus and is right-associative; every other binary operator
//! is left-associative.

use crate::evaluator::{checked_div, EvaluationError, Evaluator, Inputs};
use crate::parameters::value::Value;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::recognize,
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{pair, preceded},
    IResult, Parser,
};
use thiserror::Error;

/// Error raised while building an expression evaluator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("failed to parse expression '{source_text}': {message}")]
    Parse {
        source_text: String,
        message: String,
    },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Functions callable from an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Atan,
    Asin,
    Acos,
    Sqrt,
    Abs,
    Ln,
    Exp,
    Degrees,
    Radians,
    Min,
    Max,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "atan" => Function::Atan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            "ln" => Function::Ln,
            "exp" => Function::Exp,
            "degrees" => Function::Degrees,
            "radians" => Function::Radians,
            "min" => Function::Min,
            "max" => Function::Max,
            _ => return None,
        };
        Some(function)
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Min | Function::Max => 2,
            _ => 1,
        }
    }

    fn apply(&self, args: &[f64]) -> f64 {
        match (self, args) {
            (Function::Min, [a, b]) => a.min(*b),
            (Function::Max, [a, b]) => a.max(*b),
            (Function::Sin, [x]) => x.sin(),
            (Function::Cos, [x]) => x.cos(),
            (Function::Tan, [x]) => x.tan(),
            (Function::Atan, [x]) => x.atan(),
            (Function::Asin, [x]) => x.asin(),
            (Function::Acos, [x]) => x.acos(),
            (Function::Sqrt, [x]) => x.sqrt(),
            (Function::Abs, [x]) => x.abs(),
            (Function::Ln, [x]) => x.ln(),
            (Function::Exp, [x]) => x.exp(),
            (Function::Degrees, [x]) => x.to_degrees(),
            (Function::Radians, [x]) => x.to_radians(),
            _ => f64::NAN,
        }
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    Variable(String),
    Neg(Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Call(Function, Vec<Expression>),
}

/// Parser output before function names are resolved
enum Syntax {
    Number(f64),
    Variable(String),
    Neg(Box<Syntax>),
    Binary(BinaryOp, Box<Syntax>, Box<Syntax>),
    Call(String, Vec<Syntax>),
}

impl Syntax {
    fn resolve(self) -> Result<Expression, ExpressionError> {
        Ok(match self {
            Syntax::Number(n) => Expression::Number(n),
            Syntax::Variable(name) => Expression::Variable(name),
            Syntax::Neg(inner) => Expression::Neg(Box::new(inner.resolve()?)),
            Syntax::Binary(op, left, right) => {
                Expression::Binary(op, Box::new(left.resolve()?), Box::new(right.resolve()?))
            }
            Syntax::Call(name, args) => {
                let function = Function::from_name(&name)
                    .ok_or_else(|| ExpressionError::UnknownFunction { name: name.clone() })?;
                if args.len() != function.arity() {
                    return Err(ExpressionError::Arity {
                        name,
                        expected: function.arity(),
                        found: args.len(),
                    });
                }
                let args = args
                    .into_iter()
                    .map(Syntax::resolve)
                    .collect::<Result<Vec<_>, _>>()?;
                Expression::Call(function, args)
            }
        })
    }
}

fn undefined(what: &str) -> EvaluationError {
    EvaluationError::Arithmetic {
        message: format!("{} is undefined", what),
    }
}

impl Expression {
    /// Parse a complete expression; trailing input is an error
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let parse_error = |message: String| ExpressionError::Parse {
            source_text: source.to_string(),
            message,
        };

        match sum(source) {
            Ok((remainder, syntax)) => {
                if !remainder.trim().is_empty() {
                    return Err(parse_error(format!(
                        "unexpected trailing characters '{}'",
                        remainder.trim()
                    )));
                }
                syntax.resolve()
            }
            Err(e) => Err(parse_error(e.to_string())),
        }
    }

    pub fn evaluate(&self, inputs: &Inputs) -> Result<f64, EvaluationError> {
        match self {
            Expression::Number(n) => Ok(*n),
            Expression::Variable(name) => inputs.number(name),
            Expression::Neg(inner) => Ok(-inner.evaluate(inputs)?),
            Expression::Binary(op, left, right) => {
                let l = left.evaluate(inputs)?;
                let r = right.evaluate(inputs)?;
                match op {
                    BinaryOp::Add => Ok(l + r),
                    BinaryOp::Sub => Ok(l - r),
                    BinaryOp::Mul => Ok(l * r),
                    BinaryOp::Div => checked_div(l, r),
                    BinaryOp::Pow => {
                        let result = l.powf(r);
                        if result.is_nan() {
                            return Err(undefined(&format!("{} ^ {}", l, r)));
                        }
                        Ok(result)
                    }
                }
            }
            Expression::Call(function, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(inputs))
                    .collect::<Result<Vec<_>, _>>()?;
                let result = function.apply(&values);
                if result.is_nan() {
                    return Err(undefined(&format!("{:?}{:?}", function, values)));
                }
                Ok(result)
            }
        }
    }

    /// Distinct identifiers in order of first appearance
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            Expression::Number(_) => {}
            Expression::Variable(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Expression::Neg(inner) => inner.collect_variables(names),
            Expression::Binary(_, left, right) => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expression::Call(_, args) => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

// Parser functions using nom

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

fn symbol(input: &str, c: char) -> IResult<&str, char> {
    preceded(multispace0, char(c)).parse(input)
}

fn comma(input: &str) -> IResult<&str, char> {
    symbol(input, ',')
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// Identifier, call, number or parenthesized sub-expression.
///
/// Identifiers are tried before numbers so names like `inf` are not read
/// as float literals.
fn primary(input: &str) -> IResult<&str, Syntax> {
    let (input, _) = ws(input)?;

    if let Ok((rest, name)) = identifier(input) {
        if let Ok((rest, _)) = symbol(rest, '(') {
            let (rest, args) = separated_list0(comma, sum).parse(rest)?;
            let (rest, _) = symbol(rest, ')')?;
            return Ok((rest, Syntax::Call(name.to_string(), args)));
        }
        return Ok((rest, Syntax::Variable(name.to_string())));
    }

    if let Ok((rest, n)) = number(input) {
        return Ok((rest, Syntax::Number(n)));
    }

    let (rest, _) = symbol(input, '(')?;
    let (rest, inner) = sum(rest)?;
    let (rest, _) = symbol(rest, ')')?;
    Ok((rest, inner))
}

fn power(input: &str) -> IResult<&str, Syntax> {
    let (input, base) = primary(input)?;
    match symbol(input, '^') {
        Ok((rest, _)) => {
            let (rest, exponent) = unary(rest)?;
            Ok((
                rest,
                Syntax::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
            ))
        }
        Err(_) => Ok((input, base)),
    }
}

fn unary(input: &str) -> IResult<&str, Syntax> {
    match symbol(input, '-') {
        Ok((rest, _)) => {
            let (rest, inner) = unary(rest)?;
            Ok((rest, Syntax::Neg(Box::new(inner))))
        }
        Err(_) => power(input),
    }
}

/// Left fold of `operand (op operand)*`
fn chain<'a>(
    input: &'a str,
    operand: fn(&str) -> IResult<&str, Syntax>,
    operators: &[(char, BinaryOp)],
) -> IResult<&'a str, Syntax> {
    let (mut input, mut left) = operand(input)?;

    'fold: loop {
        for &(c, op) in operators {
            if let Ok((rest, _)) = symbol(input, c) {
                let (rest, right) = operand(rest)?;
                left = Syntax::Binary(op, Box::new(left), Box::new(right));
                input = rest;
                continue 'fold;
            }
        }
        break;
    }

    Ok((input, left))
}

fn product(input: &str) -> IResult<&str, Syntax> {
    chain(input, unary, &[('*', BinaryOp::Mul), ('/', BinaryOp::Div)])
}

fn sum(input: &str) -> IResult<&str, Syntax> {
    chain(input, product, &[('+', BinaryOp::Add), ('-', BinaryOp::Sub)])
}

/// An evaluator computing a float from an arithmetic expression
#[derive(Debug, Clone)]
pub struct ExpressionEvaluator {
    name: String,
    source: String,
    expression: Expression,
    requires: Vec<String>,
}

impl ExpressionEvaluator {
    /// # Examples
    ///
    /// ```
    /// use rigparams_rs::evaluator::{Evaluator, ExpressionEvaluator, Inputs};
    /// use rigparams_rs::parameters::Value;
    ///
    /// let ratio = ExpressionEvaluator::parse(
    ///     "baseline_ratio",
    ///     "baseline_mm / interpupillary_distance_mm",
    /// ).unwrap();
    /// assert_eq!(ratio.requires(), &["baseline_mm", "interpupillary_distance_mm"]);
    ///
    /// let inputs = Inputs::new()
    ///     .with("baseline_mm", 32.5)
    ///     .with("interpupillary_distance_mm", 65.0);
    /// assert_eq!(ratio.evaluate(&inputs).unwrap(), Value::Float(0.5));
    /// ```
    pub fn parse(name: &str, source: &str) -> Result<Self, ExpressionError> {
        let expression = Expression::parse(source)?;
        let requires = expression.variables();
        Ok(Self {
            name: name.to_string(),
            source: source.to_string(),
            expression,
            requires,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

impl Evaluator for ExpressionEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> &[String] {
        &self.requires
    }

    fn evaluate(&self, inputs: &Inputs) -> Result<Value, EvaluationError> {
        let result = self.expression.evaluate(inputs)?;
        if result.is_nan() {
            return Err(undefined(&self.source));
        }
        Ok(Value::Float(result))
    }
}

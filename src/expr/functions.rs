/*!
 * Function Library
 * Functions resolved by name and argument types when a tree is built
 *
 * A call that passes resolution can only fail at evaluation time because of
 * its inputs (missing attributes, content misses, overflow, division by zero),
 * never because of its shape.
 */

use super::context::Context;
use super::errors::{BuildError, BuildResult, EvalError, EvalResult};
use super::expression::Expression;
use crate::value::{AttributeValue, Kind, ValueType};
use std::cmp::Ordering;
use std::fmt;

/// Result strings of `range`
pub const RANGE_BELOW: &str = "Below";
pub const RANGE_WITHIN: &str = "Within";
pub const RANGE_ABOVE: &str = "Above";

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    Contains,
    Greater,
    Less,
    Add,
    Subtract,
    Multiply,
    Divide,
    Not,
    And,
    Or,
    Range,
    Concat,
    Len,
    Try,
}

impl Operator {
    pub const ALL: [Operator; 15] = [
        Operator::Equal,
        Operator::Contains,
        Operator::Greater,
        Operator::Less,
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::Not,
        Operator::And,
        Operator::Or,
        Operator::Range,
        Operator::Concat,
        Operator::Len,
        Operator::Try,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::Contains => "contains",
            Operator::Greater => "greater",
            Operator::Less => "less",
            Operator::Add => "add",
            Operator::Subtract => "subtract",
            Operator::Multiply => "multiply",
            Operator::Divide => "divide",
            Operator::Not => "not",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Range => "range",
            Operator::Concat => "concat",
            Operator::Len => "len",
            Operator::Try => "try",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }

    /// Functions allowed in target matches
    pub const fn is_target_compatible(self) -> bool {
        matches!(
            self,
            Operator::Equal | Operator::Contains | Operator::Greater | Operator::Less
        )
    }

    fn arity(self) -> (usize, Option<usize>, &'static str) {
        match self {
            Operator::Not | Operator::Len => (1, Some(1), "1"),
            Operator::Range => (3, Some(3), "3"),
            Operator::And | Operator::Or | Operator::Concat | Operator::Try => (1, None, "1 or more"),
            _ => (2, Some(2), "2"),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved function call
#[derive(Debug, Clone)]
pub struct Function {
    op: Operator,
    args: Vec<Expression>,
    result: ValueType,
}

impl Function {
    /// Resolve a call by name and the result types of its arguments
    pub fn new(name: &str, args: Vec<Expression>) -> BuildResult<Self> {
        let unknown = |args: &[Expression]| BuildError::UnknownFunction {
            name: name.to_string(),
            args: signature(args),
        };

        let op = Operator::from_name(name).ok_or_else(|| unknown(&args))?;

        let (min, max, expected) = op.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            return Err(BuildError::ArgumentCount {
                name: op.name().to_string(),
                expected,
                actual: args.len(),
            });
        }

        let result = resolve(op, &args).ok_or_else(|| unknown(&args))?;
        Ok(Self { op, args, result })
    }

    pub fn operator(&self) -> Operator {
        self.op
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub fn result_type(&self) -> &ValueType {
        &self.result
    }

    pub fn evaluate(&self, ctx: &Context) -> EvalResult<AttributeValue> {
        match self.op {
            Operator::Equal => {
                let (a, b) = self.pair(ctx)?;
                Ok(AttributeValue::Boolean(a.equals(&b)?))
            }
            Operator::Contains => {
                let (a, b) = self.pair(ctx)?;
                Ok(AttributeValue::Boolean(a.contains(&b)?))
            }
            Operator::Greater => {
                let (a, b) = self.pair(ctx)?;
                Ok(AttributeValue::Boolean(a.compare(&b)? == Ordering::Greater))
            }
            Operator::Less => {
                let (a, b) = self.pair(ctx)?;
                Ok(AttributeValue::Boolean(a.compare(&b)? == Ordering::Less))
            }
            Operator::Add | Operator::Subtract | Operator::Multiply | Operator::Divide => {
                let (a, b) = self.pair(ctx)?;
                arithmetic(self.op, &a, &b)
            }
            Operator::Not => Ok(AttributeValue::Boolean(!self.args[0].evaluate_bool(ctx)?)),
            Operator::And => {
                for arg in &self.args {
                    if !arg.evaluate_bool(ctx)? {
                        return Ok(AttributeValue::Boolean(false));
                    }
                }
                Ok(AttributeValue::Boolean(true))
            }
            Operator::Or => {
                for arg in &self.args {
                    if arg.evaluate_bool(ctx)? {
                        return Ok(AttributeValue::Boolean(true));
                    }
                }
                Ok(AttributeValue::Boolean(false))
            }
            Operator::Range => {
                let min = self.args[0].evaluate(ctx)?;
                let max = self.args[1].evaluate(ctx)?;
                let value = self.args[2].evaluate(ctx)?;
                let label = if value.compare(&min)? == Ordering::Less {
                    RANGE_BELOW
                } else if value.compare(&max)? == Ordering::Greater {
                    RANGE_ABOVE
                } else {
                    RANGE_WITHIN
                };
                Ok(AttributeValue::String(label.to_string()))
            }
            Operator::Concat => {
                let mut list = Vec::new();
                for arg in &self.args {
                    match arg.evaluate(ctx)?.as_ref() {
                        AttributeValue::String(s) => list.push(s.clone()),
                        AttributeValue::SetOfStrings(set) => list.extend(set.iter().map(str::to_string)),
                        AttributeValue::ListOfStrings(items) => list.extend(items.iter().cloned()),
                        other => {
                            return Err(EvalError::UnexpectedKind {
                                context: "concat",
                                expected: Kind::ListOfStrings,
                                actual: other.kind(),
                            })
                        }
                    }
                }
                Ok(AttributeValue::ListOfStrings(list))
            }
            Operator::Len => {
                let value = self.args[0].evaluate(ctx)?;
                let len = match value.as_ref() {
                    AttributeValue::SetOfStrings(set) => set.len(),
                    AttributeValue::ListOfStrings(list) => list.len(),
                    other => {
                        return Err(EvalError::UnexpectedKind {
                            context: "len",
                            expected: Kind::ListOfStrings,
                            actual: other.kind(),
                        })
                    }
                };
                i64::try_from(len)
                    .map(AttributeValue::Integer)
                    .map_err(|_| EvalError::IntegerOverflow("len"))
            }
            Operator::Try => {
                let mut failures: Option<EvalError> = None;
                for arg in &self.args {
                    match arg.evaluate(ctx) {
                        Ok(value) => return Ok(value.into_owned()),
                        Err(err) => {
                            failures = Some(match failures {
                                Some(previous) => previous.merge(err),
                                None => err,
                            })
                        }
                    }
                }
                Err(failures.unwrap_or(EvalError::MissingValue("try".to_string())))
            }
        }
    }

    fn pair<'a>(
        &'a self,
        ctx: &'a Context,
    ) -> EvalResult<(std::borrow::Cow<'a, AttributeValue>, std::borrow::Cow<'a, AttributeValue>)> {
        Ok((self.args[0].evaluate(ctx)?, self.args[1].evaluate(ctx)?))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

fn signature(args: &[Expression]) -> String {
    args.iter()
        .map(|arg| arg.result_type().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type of `op` applied to `args`, `None` when no overload exists
fn resolve(op: Operator, args: &[Expression]) -> Option<ValueType> {
    let types: Vec<ValueType> = args.iter().map(Expression::result_type).collect();
    let kinds: Vec<Kind> = types.iter().map(ValueType::kind).collect();
    let numeric = |k: &Kind| k.is_numeric();

    match op {
        Operator::Equal => {
            let ok = kinds.iter().all(numeric) || types[0] == types[1];
            ok.then_some(ValueType::Boolean)
        }
        Operator::Contains => {
            let ok = matches!(
                (kinds[0], kinds[1]),
                (Kind::String, Kind::String)
                    | (Kind::Network, Kind::Address)
                    | (Kind::SetOfStrings, Kind::String)
                    | (Kind::SetOfNetworks, Kind::Address)
                    | (Kind::SetOfNetworks, Kind::Network)
                    | (Kind::SetOfDomains, Kind::Domain)
                    | (Kind::ListOfStrings, Kind::String)
                    | (Kind::Flags, Kind::String)
            );
            ok.then_some(ValueType::Boolean)
        }
        Operator::Greater | Operator::Less => {
            let ok = kinds.iter().all(numeric) || kinds.iter().all(|k| *k == Kind::String);
            ok.then_some(ValueType::Boolean)
        }
        Operator::Add | Operator::Subtract | Operator::Multiply | Operator::Divide => {
            if !kinds.iter().all(numeric) {
                return None;
            }
            if kinds.iter().all(|k| *k == Kind::Integer) {
                Some(ValueType::Integer)
            } else {
                Some(ValueType::Float)
            }
        }
        Operator::Not | Operator::And | Operator::Or => kinds
            .iter()
            .all(|k| *k == Kind::Boolean)
            .then_some(ValueType::Boolean),
        Operator::Range => kinds.iter().all(numeric).then_some(ValueType::String),
        Operator::Concat => kinds
            .iter()
            .all(|k| matches!(k, Kind::String | Kind::SetOfStrings | Kind::ListOfStrings))
            .then_some(ValueType::ListOfStrings),
        Operator::Len => matches!(kinds[0], Kind::SetOfStrings | Kind::ListOfStrings)
            .then_some(ValueType::Integer),
        Operator::Try => {
            let first = types[0].clone();
            types.iter().all(|ty| *ty == first).then_some(first)
        }
    }
}

fn arithmetic(op: Operator, a: &AttributeValue, b: &AttributeValue) -> EvalResult<AttributeValue> {
    if let (AttributeValue::Integer(x), AttributeValue::Integer(y)) = (a, b) {
        let result = match op {
            Operator::Add => x.checked_add(*y),
            Operator::Subtract => x.checked_sub(*y),
            Operator::Multiply => x.checked_mul(*y),
            _ => {
                if *y == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                x.checked_div(*y)
            }
        };
        return result
            .map(AttributeValue::Integer)
            .ok_or(EvalError::IntegerOverflow(op.name()));
    }

    let (Some(x), Some(y)) = (a.as_float(), b.as_float()) else {
        return Err(EvalError::UnexpectedKind {
            context: op.name(),
            expected: Kind::Float,
            actual: if a.kind().is_numeric() { b.kind() } else { a.kind() },
        });
    };
    let result = match op {
        Operator::Add => x + y,
        Operator::Subtract => x - y,
        Operator::Multiply => x * y,
        _ => {
            if y == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            x / y
        }
    };
    Ok(AttributeValue::Float(result))
}

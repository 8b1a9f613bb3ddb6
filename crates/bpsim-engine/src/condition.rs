//! Branch conditions of the form `<operator>;<threshold>`.
//!
//! The operator is one of `<`, `>`, `=`; the threshold is a decimal 32-bit
//! integer. Conditions are evaluated against the typed result of the node
//! preceding a gateway.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

use bpsim_core::event::SkipReason;
use bpsim_core::types::{TypeTag, TypedValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Lt,
    Gt,
    Eq,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Eq => "=",
        }
    }
}

impl FromStr for Operator {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "=" => Ok(Operator::Eq),
            other => Err(ConditionError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("condition {0:?} has no threshold")]
    MissingThreshold(String),

    #[error("invalid threshold {threshold:?}: {source}")]
    InvalidThreshold {
        threshold: String,
        source: ParseIntError,
    },

    #[error("unknown operator {0:?}")]
    UnknownOperator(String),
}

impl ConditionError {
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            ConditionError::MissingThreshold(_) | ConditionError::InvalidThreshold { .. } => {
                SkipReason::MalformedCondition
            }
            ConditionError::UnknownOperator(_) => SkipReason::UnknownOperator,
        }
    }
}

/// A parsed branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Condition {
    pub operator: Operator,
    pub threshold: i32,
}

impl Condition {
    /// Parse `<op>;<threshold>`. Fields after the second `;` are ignored.
    ///
    /// The threshold is checked before the operator, so `"~;abc"` is a
    /// malformed condition rather than an unknown operator.
    pub fn parse(condition: &str) -> Result<Self, ConditionError> {
        let mut fields = condition.split(';');
        let operator = fields.next().unwrap_or_default();
        let threshold = fields
            .next()
            .ok_or_else(|| ConditionError::MissingThreshold(condition.to_string()))?;

        let threshold = threshold
            .parse::<i32>()
            .map_err(|source| ConditionError::InvalidThreshold {
                threshold: threshold.to_string(),
                source,
            })?;
        let operator = operator.parse()?;

        Ok(Self {
            operator,
            threshold,
        })
    }

    pub fn matches(&self, operand: &Operand) -> bool {
        match operand {
            Operand::Int(value) => match self.operator {
                Operator::Lt => *value < self.threshold,
                Operator::Gt => *value > self.threshold,
                Operator::Eq => *value == self.threshold,
            },
            // Text is never compared against a numeric threshold.
            Operand::Text(_) => false,
        }
    }
}

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.operator, self.threshold)
    }
}

/// The predecessor's result, in the form conditions compare against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Int(i32),
    Text(String),
}

impl Operand {
    /// Interpret a typed result according to its tag.
    ///
    /// INT, FLOAT and BOOL are all read as a 32-bit integer. STRING passes
    /// through as text, which no condition matches. NONE, or a numeric tag
    /// whose text is not an integer, gives no operand at all.
    pub fn from_result(result: &TypedValue) -> Option<Self> {
        match result.tag {
            TypeTag::Int | TypeTag::Float | TypeTag::Bool => {
                result.value.parse::<i32>().ok().map(Operand::Int)
            }
            TypeTag::String => Some(Operand::Text(result.value.clone())),
            TypeTag::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i32) -> Operand {
        Operand::Int(value)
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!(
            Condition::parse(">;30").unwrap(),
            Condition {
                operator: Operator::Gt,
                threshold: 30
            }
        );
        assert_eq!(Condition::parse("<;25").unwrap().operator, Operator::Lt);
        assert_eq!(Condition::parse("=;-4").unwrap().threshold, -4);
        assert_eq!(Condition::parse("=;+4").unwrap().threshold, 4);
    }

    #[test]
    fn test_parse_ignores_trailing_fields() {
        assert_eq!(Condition::parse(">;30;extra").unwrap().threshold, 30);
    }

    #[test]
    fn test_parse_malformed() {
        let err = Condition::parse("~;abc").unwrap_err();
        assert!(matches!(err, ConditionError::InvalidThreshold { .. }));
        assert_eq!(err.skip_reason(), SkipReason::MalformedCondition);

        let err = Condition::parse(">30").unwrap_err();
        assert!(matches!(err, ConditionError::MissingThreshold(_)));
        assert_eq!(err.skip_reason(), SkipReason::MalformedCondition);

        assert!(Condition::parse(">; 30").is_err());
        assert!(Condition::parse(">;3000000000").is_err());
        assert!(Condition::parse("").is_err());
    }

    #[test]
    fn test_parse_unknown_operator() {
        let err = Condition::parse(">=;5").unwrap_err();
        assert_eq!(err, ConditionError::UnknownOperator(">=".into()));
        assert_eq!(err.skip_reason(), SkipReason::UnknownOperator);
    }

    #[test]
    fn test_display_round_trip() {
        let condition: Condition = "<;25".parse().unwrap();
        assert_eq!(condition.to_string(), "<;25");
    }

    #[test]
    fn test_numeric_comparisons() {
        let gt30 = Condition::parse(">;30").unwrap();
        let lt25 = Condition::parse("<;25").unwrap();
        let eq24 = Condition::parse("=;24").unwrap();

        assert!(!gt30.matches(&int(30)));
        assert!(gt30.matches(&int(35)));
        assert!(!lt25.matches(&int(25)));
        assert!(lt25.matches(&int(10)));
        assert!(eq24.matches(&int(24)));
        assert!(!eq24.matches(&int(25)));
    }

    #[test]
    fn test_text_operand_never_matches() {
        let text = Operand::Text("24".into());
        for raw in ["=;24", ">;0", "<;100"] {
            let condition = Condition::parse(raw).unwrap();
            assert!(!condition.matches(&text), "{raw} matched text \"24\"");
        }
        assert!(!Condition::parse("=;24")
            .unwrap()
            .matches(&Operand::Text("NONE".into())));
    }

    #[test]
    fn test_operand_from_result() {
        assert_eq!(Operand::from_result(&TypedValue::int(30)), Some(int(30)));
        assert_eq!(
            Operand::from_result(&TypedValue::new("7", TypeTag::Float)),
            Some(int(7))
        );
        assert_eq!(
            Operand::from_result(&TypedValue::new("1", TypeTag::Bool)),
            Some(int(1))
        );
        // Fractions and boolean words do not parse as integers.
        assert_eq!(Operand::from_result(&TypedValue::float(2.5)), None);
        assert_eq!(Operand::from_result(&TypedValue::boolean(true)), None);
        assert_eq!(
            Operand::from_result(&TypedValue::new("12", TypeTag::None)),
            None
        );
        assert_eq!(
            Operand::from_result(&TypedValue::none()),
            Some(Operand::Text("NONE".into()))
        );
    }
}

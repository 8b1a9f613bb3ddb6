use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BpsimError;

/// Text carried by [`TypedValue::none`].
pub const NONE_VALUE: &str = "NONE";

/// Unique identifier for a single simulation run.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared type of a node's output.
///
/// Values travel as text; the tag tells a downstream gateway how to parse
/// the text instead of letting it guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeTag {
    String,
    Int,
    Float,
    Bool,
    None,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "STRING",
            TypeTag::Int => "INT",
            TypeTag::Float => "FLOAT",
            TypeTag::Bool => "BOOL",
            TypeTag::None => "NONE",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = BpsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRING" => Ok(TypeTag::String),
            "INT" => Ok(TypeTag::Int),
            "FLOAT" => Ok(TypeTag::Float),
            "BOOL" => Ok(TypeTag::Bool),
            "NONE" => Ok(TypeTag::None),
            other => Err(BpsimError::InvalidTypeTag(other.to_string())),
        }
    }
}

/// A node's output: the value as text plus its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedValue {
    pub value: String,
    pub tag: TypeTag,
}

impl TypedValue {
    pub fn new(value: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            value: value.into(),
            tag,
        }
    }

    /// The "no meaningful output" pair every non-computing node reports.
    pub fn none() -> Self {
        Self::new(NONE_VALUE, TypeTag::String)
    }

    pub fn int(value: i64) -> Self {
        Self::new(value.to_string(), TypeTag::Int)
    }

    pub fn float(value: f64) -> Self {
        Self::new(value.to_string(), TypeTag::Float)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(value.to_string(), TypeTag::Bool)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(value, TypeTag::String)
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }
}

impl Default for TypedValue {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.tag)
    }
}

/// The variant of a process-graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    StartEvent,
    EndEvent,
    DefaultActivity,
    ActiveActivity,
    Process,
    ParallelGateway,
    InclusiveGateway,
    ExclusiveGateway,
}

impl NodeKind {
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            NodeKind::ParallelGateway | NodeKind::InclusiveGateway | NodeKind::ExclusiveGateway
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::StartEvent => "start_event",
            NodeKind::EndEvent => "end_event",
            NodeKind::DefaultActivity => "default_activity",
            NodeKind::ActiveActivity => "active_activity",
            NodeKind::Process => "process",
            NodeKind::ParallelGateway => "parallel_gateway",
            NodeKind::InclusiveGateway => "inclusive_gateway",
            NodeKind::ExclusiveGateway => "exclusive_gateway",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_round_trips_through_text() {
        for tag in [
            TypeTag::String,
            TypeTag::Int,
            TypeTag::Float,
            TypeTag::Bool,
            TypeTag::None,
        ] {
            assert_eq!(tag.to_string().parse::<TypeTag>().unwrap(), tag);
        }
    }

    #[test]
    fn test_type_tag_rejects_unknown() {
        let err = "DECIMAL".parse::<TypeTag>().unwrap_err();
        assert!(matches!(err, BpsimError::InvalidTypeTag(ref s) if s == "DECIMAL"));
        assert!("int".parse::<TypeTag>().is_err());
    }

    #[test]
    fn test_none_value_is_string_tagged() {
        let none = TypedValue::none();
        assert_eq!(none.value, "NONE");
        assert_eq!(none.tag, TypeTag::String);
        assert!(none.is_none());
        assert_eq!(TypedValue::default(), none);
    }

    #[test]
    fn test_constructors() {
        assert_eq!(TypedValue::int(24), TypedValue::new("24", TypeTag::Int));
        assert_eq!(TypedValue::boolean(true).value, "true");
        assert_eq!(TypedValue::float(2.5).tag, TypeTag::Float);
        assert!(!TypedValue::string("NONE ").is_none());
    }

    #[test]
    fn test_type_tag_serde_uses_upper_case() {
        let json = serde_json::to_string(&TypedValue::int(7)).unwrap();
        assert_eq!(json, r#"{"value":"7","tag":"INT"}"#);
    }

    #[test]
    fn test_node_kind_gateway() {
        assert!(NodeKind::InclusiveGateway.is_gateway());
        assert!(!NodeKind::Process.is_gateway());
        assert_eq!(NodeKind::ActiveActivity.to_string(), "active_activity");
    }
}

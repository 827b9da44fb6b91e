use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{DbError, Result};

/// A single cell payload.
///
/// On the wire a value is a one-of object: `{"integer": 5}`, `{"real": 1.5}`,
/// `{"string": "a"}` or `{"r": 1, "g": 2, "b": 3}`. Anything else is rejected
/// while parsing, before it reaches a table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "InputValue")]
pub enum Value {
    Integer(i64),
    Real(f64),
    String(String),
    Color { r: i64, g: i64, b: i64 },
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Real(_) => "Real",
            Value::String(_) => "String",
            Value::Color { .. } => "Color",
        }
    }

    /// Human-readable description used in type mismatch reports.
    pub fn describe(&self) -> String {
        format!("{} value '{}'", self.type_name(), self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Color { r, g, b } => write!(f, "({}, {}, {})", r, g, b),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Integer(i) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("integer", i)?;
                map.end()
            }
            Value::Real(x) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("real", x)?;
                map.end()
            }
            Value::String(s) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("string", s)?;
                map.end()
            }
            Value::Color { r, g, b } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("r", r)?;
                map.serialize_entry("g", g)?;
                map.serialize_entry("b", b)?;
                map.end()
            }
        }
    }
}

/// Raw value object as sent by clients.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputValue {
    pub integer: Option<i64>,
    pub real: Option<f64>,
    pub string: Option<String>,
    pub r: Option<i64>,
    pub g: Option<i64>,
    pub b: Option<i64>,
}

impl TryFrom<InputValue> for Value {
    type Error = String;

    fn try_from(input: InputValue) -> std::result::Result<Self, Self::Error> {
        match input {
            InputValue { integer: Some(i), real: None, string: None, r: None, g: None, b: None } => {
                Ok(Value::Integer(i))
            }
            InputValue { integer: None, real: Some(x), string: None, r: None, g: None, b: None } => {
                Ok(Value::Real(x))
            }
            InputValue { integer: None, real: None, string: Some(s), r: None, g: None, b: None } => {
                Ok(Value::String(s))
            }
            InputValue { integer: None, real: None, string: None, r: Some(r), g: Some(g), b: Some(b) } => {
                Ok(Value::Color { r, g, b })
            }
            other => Err(format!(
                "cannot parse value {:?}: expected exactly one of integer, real, string or r/g/b",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Real,
    Char,
    String,
    Color,
    ColorInvl,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "Integer",
            ColumnType::Real => "Real",
            ColumnType::Char => "Char",
            ColumnType::String => "String",
            ColumnType::Color => "Color",
            ColumnType::ColorInvl => "ColorInvl",
        };
        f.write_str(name)
    }
}

/// Closed per-channel bounds of a `ColorInvl` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorRange {
    pub r_min: i64,
    pub r_max: i64,
    pub g_min: i64,
    pub g_max: i64,
    pub b_min: i64,
    pub b_max: i64,
}

impl ColorRange {
    pub fn contains(&self, r: i64, g: i64, b: i64) -> bool {
        (self.r_min..=self.r_max).contains(&r)
            && (self.g_min..=self.g_max).contains(&g)
            && (self.b_min..=self.b_max).contains(&b)
    }

    fn check(&self) -> Result<()> {
        let channels = [
            ('r', self.r_min, self.r_max),
            ('g', self.g_min, self.g_max),
            ('b', self.b_min, self.b_max),
        ];
        for (channel, min, max) in channels {
            if min > max {
                return Err(DbError::Config(format!(
                    "{channel}_min must be less or equal than {channel}_max ({min} > {max})"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ColorRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R∈[{}..{}], G∈[{}..{}], B∈[{}..{}]",
            self.r_min, self.r_max, self.g_min, self.g_max, self.b_min, self.b_max
        )
    }
}

/// Column definition as sent by clients. Bounds are individually optional
/// here; `build` enforces the presence rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub r_min: Option<i64>,
    pub r_max: Option<i64>,
    pub g_min: Option<i64>,
    pub g_max: Option<i64>,
    pub b_min: Option<i64>,
    pub b_max: Option<i64>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            r_min: None,
            r_max: None,
            g_min: None,
            g_max: None,
            b_min: None,
            b_max: None,
        }
    }

    pub fn build(self) -> Result<Column> {
        let bounds = [self.r_min, self.r_max, self.g_min, self.g_max, self.b_min, self.b_max];
        let range = match bounds {
            [Some(r_min), Some(r_max), Some(g_min), Some(g_max), Some(b_min), Some(b_max)] => {
                Some(ColorRange { r_min, r_max, g_min, g_max, b_min, b_max })
            }
            _ if bounds.iter().all(Option::is_none) => None,
            _ => {
                return Err(DbError::Config(format!(
                    "column '{}': r_min, r_max, g_min, g_max, b_min, b_max must be provided together",
                    self.name
                )));
            }
        };
        Column::new(self.name, self.column_type, range)
    }
}

/// A typed schema slot. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    #[serde(rename = "type")]
    column_type: ColumnType,
    #[serde(flatten)]
    range: Option<ColorRange>,
}

impl Column {
    /// `ColorInvl` columns require a range with `min <= max` on every channel;
    /// every other type must come without one.
    pub fn new(name: impl Into<String>, column_type: ColumnType, range: Option<ColorRange>) -> Result<Self> {
        let name = name.into();
        match (column_type, range) {
            (ColumnType::ColorInvl, Some(range)) => range.check()?,
            (ColumnType::ColorInvl, None) => {
                return Err(DbError::Config(format!(
                    "column '{name}': type ColorInvl requires r_min, r_max, g_min, g_max, b_min, b_max"
                )));
            }
            (_, Some(_)) => {
                return Err(DbError::Config(format!(
                    "column '{name}': type {column_type} must not carry color bounds"
                )));
            }
            (_, None) => {}
        }
        Ok(Self { name, column_type, range })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> Option<ColorRange> {
        self.range
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        let accepted = match value {
            Value::Integer(_) => matches!(self.column_type, ColumnType::Integer | ColumnType::Real),
            Value::Real(_) => self.column_type == ColumnType::Real,
            Value::String(s) => match self.column_type {
                ColumnType::String => true,
                ColumnType::Char => s.chars().count() == 1,
                _ => false,
            },
            Value::Color { r, g, b } => match self.column_type {
                ColumnType::Color => true,
                ColumnType::ColorInvl => self.range.is_some_and(|range| range.contains(*r, *g, *b)),
                _ => false,
            },
        };

        if accepted {
            Ok(())
        } else {
            Err(DbError::TypeMismatch {
                expected: self.describe_schema(),
                found: value.describe(),
            })
        }
    }

    pub fn describe_schema(&self) -> String {
        match self.range {
            Some(range) => format!("{} ({})", self.column_type, range),
            None => self.column_type.to_string(),
        }
    }

    /// Same type and bounds under a different display name. Each channel keeps
    /// its own bounds.
    pub fn project(&self, name: impl Into<String>) -> Column {
        Column {
            name: name.into(),
            column_type: self.column_type,
            range: self.range,
        }
    }

    /// Type tag and bounds match, names ignored.
    pub fn same_signature(&self, other: &Column) -> bool {
        self.column_type == other.column_type && self.range == other.range
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub id: u64,
    pub cells: Vec<Value>,
}

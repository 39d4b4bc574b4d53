//! Declarative parameter schemas for agent tools.
//!
//! Each tool declares the shape of its arguments once; the registry runs the
//! declared schema against the untrusted argument object before the tool's
//! executor sees it. Validation is pure: it never touches storage and never
//! mutates its input. Unknown fields are ignored, optional fields receive
//! their declared defaults, and every failure names the offending field.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use uuid::Uuid;

use focal_core::errors::ToolError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    Uuid,
    Email,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// RFC3339 timestamp.
    DateTime,
    /// Monetary value, accepted as a JSON number or numeric string and
    /// normalized to a string.
    Decimal,
    StringArray,
    ObjectArray,
}

#[derive(Clone, Debug)]
pub struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    description: &'static str,
    required: bool,
    default: Option<Value>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    min: Option<i64>,
    max: Option<i64>,
    allowed: Option<&'static [&'static str]>,
    min_items: Option<usize>,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            required: false,
            default: None,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
            allowed: None,
            min_items: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn uuid(name: &'static str) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    pub fn email(name: &'static str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn datetime(name: &'static str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn decimal(name: &'static str) -> Self {
        Self::new(name, FieldKind::Decimal)
    }

    pub fn enumeration(name: &'static str, allowed: &'static [&'static str]) -> Self {
        let mut spec = Self::new(name, FieldKind::String);
        spec.allowed = Some(allowed);
        spec
    }

    pub fn string_array(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringArray)
    }

    pub fn object_array(name: &'static str) -> Self {
        Self::new(name, FieldKind::ObjectArray)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn min_len(mut self, value: usize) -> Self {
        self.min_len = Some(value);
        self
    }

    pub fn max_len(mut self, value: usize) -> Self {
        self.max_len = Some(value);
        self
    }

    pub fn min(mut self, value: i64) -> Self {
        self.min = Some(value);
        self
    }

    pub fn max(mut self, value: i64) -> Self {
        self.max = Some(value);
        self
    }

    pub fn min_items(mut self, value: usize) -> Self {
        self.min_items = Some(value);
        self
    }

    fn validate(&self, value: &Value) -> Result<Value, ToolError> {
        match self.kind {
            FieldKind::String => {
                let text = self.expect_string(value)?;
                if let Some(allowed) = self.allowed {
                    if !allowed.contains(&text) {
                        return Err(ToolError::validation(
                            self.name,
                            format!("must be one of {}", allowed.join("|")),
                        ));
                    }
                }
                let length = text.chars().count();
                if let Some(min_len) = self.min_len {
                    if length < min_len {
                        return Err(ToolError::validation(
                            self.name,
                            format!("must be at least {min_len} characters"),
                        ));
                    }
                }
                if let Some(max_len) = self.max_len {
                    if length > max_len {
                        return Err(ToolError::validation(
                            self.name,
                            format!("must be at most {max_len} characters"),
                        ));
                    }
                }
                Ok(value.clone())
            }
            FieldKind::Integer => {
                let number = value.as_i64().ok_or_else(|| {
                    ToolError::validation(self.name, "must be an integer")
                })?;
                if let Some(min) = self.min {
                    if number < min {
                        return Err(ToolError::validation(
                            self.name,
                            format!("must be at least {min}"),
                        ));
                    }
                }
                if let Some(max) = self.max {
                    if number > max {
                        return Err(ToolError::validation(
                            self.name,
                            format!("must be at most {max}"),
                        ));
                    }
                }
                Ok(value.clone())
            }
            FieldKind::Boolean => {
                value.as_bool().ok_or_else(|| {
                    ToolError::validation(self.name, "must be a boolean")
                })?;
                Ok(value.clone())
            }
            FieldKind::Uuid => {
                let text = self.expect_string(value)?;
                Uuid::parse_str(text).map_err(|_| {
                    ToolError::validation(self.name, "must be a valid UUID")
                })?;
                Ok(value.clone())
            }
            FieldKind::Email => {
                let text = self.expect_string(value)?;
                if !is_plausible_email(text) {
                    return Err(ToolError::validation(
                        self.name,
                        "must be a valid email address",
                    ));
                }
                Ok(value.clone())
            }
            FieldKind::Date => {
                let text = self.expect_string(value)?;
                NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
                    ToolError::validation(self.name, "must be a date in YYYY-MM-DD form")
                })?;
                Ok(value.clone())
            }
            FieldKind::DateTime => {
                let text = self.expect_string(value)?;
                DateTime::parse_from_rfc3339(text).map_err(|_| {
                    ToolError::validation(self.name, "must be an RFC3339 timestamp")
                })?;
                Ok(value.clone())
            }
            FieldKind::Decimal => {
                let text = match value {
                    Value::String(text) => text.clone(),
                    Value::Number(number) => number.to_string(),
                    _ => {
                        return Err(ToolError::validation(
                            self.name,
                            "must be a number or numeric string",
                        ))
                    }
                };
                let decimal = text.parse::<Decimal>().map_err(|_| {
                    ToolError::validation(self.name, "must be a decimal amount")
                })?;
                if decimal.is_sign_negative() {
                    return Err(ToolError::validation(self.name, "must not be negative"));
                }
                Ok(Value::String(decimal.to_string()))
            }
            FieldKind::StringArray => {
                let items = value.as_array().ok_or_else(|| {
                    ToolError::validation(self.name, "must be an array of strings")
                })?;
                if items.iter().any(|item| !item.is_string()) {
                    return Err(ToolError::validation(
                        self.name,
                        "must be an array of strings",
                    ));
                }
                self.check_items(items.len())?;
                Ok(value.clone())
            }
            FieldKind::ObjectArray => {
                let items = value.as_array().ok_or_else(|| {
                    ToolError::validation(self.name, "must be an array of objects")
                })?;
                if items.iter().any(|item| !item.is_object()) {
                    return Err(ToolError::validation(
                        self.name,
                        "must be an array of objects",
                    ));
                }
                self.check_items(items.len())?;
                Ok(value.clone())
            }
        }
    }

    fn expect_string<'a>(&self, value: &'a Value) -> Result<&'a str, ToolError> {
        value.as_str().ok_or_else(|| ToolError::validation(self.name, "must be a string"))
    }

    fn check_items(&self, length: usize) -> Result<(), ToolError> {
        if let Some(min_items) = self.min_items {
            if length < min_items {
                return Err(ToolError::validation(
                    self.name,
                    format!("must contain at least {min_items} items"),
                ));
            }
        }
        Ok(())
    }

    fn describe_json(&self) -> Value {
        let type_name = match self.kind {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Uuid => "uuid",
            FieldKind::Email => "email",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Decimal => "decimal",
            FieldKind::StringArray => "string[]",
            FieldKind::ObjectArray => "object[]",
        };

        let mut json = Map::new();
        json.insert("type".to_string(), Value::String(type_name.to_string()));
        json.insert("required".to_string(), Value::Bool(self.required));
        if !self.description.is_empty() {
            json.insert("description".to_string(), Value::String(self.description.to_string()));
        }
        if let Some(allowed) = self.allowed {
            json.insert(
                "enum".to_string(),
                Value::Array(allowed.iter().map(|item| Value::String(item.to_string())).collect()),
            );
        }
        if let Some(default) = &self.default {
            json.insert("default".to_string(), default.clone());
        }
        if let Some(min) = self.min {
            json.insert("minimum".to_string(), Value::from(min));
        }
        if let Some(max) = self.max {
            json.insert("maximum".to_string(), Value::from(max));
        }
        Value::Object(json)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ParameterSchema {
    fields: Vec<FieldSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Validates an untrusted argument object, returning the defaulted,
    /// normalized parameter object the executor receives.
    pub fn validate(&self, arguments: &Value) -> Result<Map<String, Value>, ToolError> {
        let input = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(ToolError::validation(
                    "parameters",
                    "tool parameters must be a JSON object",
                ))
            }
        };

        let mut output = Map::new();
        for spec in &self.fields {
            match input.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(ToolError::validation(spec.name, "is required"));
                    }
                    if let Some(default) = &spec.default {
                        output.insert(spec.name.to_string(), default.clone());
                    }
                }
                Some(value) => {
                    output.insert(spec.name.to_string(), spec.validate(value)?);
                }
            }
        }

        Ok(output)
    }

    /// Field-by-field description for the orchestrator's tool-selection
    /// prompt.
    pub fn describe_json(&self) -> Value {
        let mut json = Map::new();
        for spec in &self.fields {
            json.insert(spec.name.to_string(), spec.describe_json());
        }
        Value::Object(json)
    }
}

fn is_plausible_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !text.contains(char::is_whitespace)
}

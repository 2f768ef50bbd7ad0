//! Structured output contract.
//!
//! Every step result implements [`StructuredOutput`]: it can describe its own
//! shape as an [`OutputSchema`] (sent to backends that support native
//! structured output, or appended to the prompt for those that don't) and it
//! can validate itself after deserialization.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::foundation::ValidationError;

/// A step result that can be requested from a text-generation backend.
pub trait StructuredOutput: Serialize + DeserializeOwned + Send + Sized {
    /// Describes the expected JSON shape.
    fn output_schema() -> OutputSchema;

    /// Name sent with native structured-output requests.
    fn schema_name() -> String {
        Self::output_schema().name
    }

    /// Checks presence, ranges, and list-length bounds.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Schema for structured output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSchema {
    pub schema_version: String,
    pub name: String,
    pub description: String,
    pub fields: Vec<SchemaField>,
}

/// A field in an output schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: String,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

/// Field types in output schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// One of a fixed set of string values.
    Enum(Vec<String>),
    /// Homogeneous list.
    Array(Box<FieldType>),
    /// Nested object with its own fields.
    Object(Vec<SchemaField>),
}

impl OutputSchema {
    /// Creates a schema at version 1.0.
    pub fn new(name: impl Into<String>, description: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            name: name.into(),
            description: description.into(),
            fields,
        }
    }

    /// Returns the names of required top-level fields.
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Renders the schema as a JSON Schema document.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = object_schema(&self.fields);
        if let Value::Object(map) = &mut schema {
            map.insert("title".to_string(), json!(self.name));
            map.insert("description".to_string(), json!(self.description));
        }
        schema
    }

    /// Renders the formatting instructions appended to fallback prompts.
    pub fn format_instructions(&self) -> String {
        let rendered = serde_json::to_string_pretty(&self.to_json_schema())
            .unwrap_or_else(|_| self.to_json_schema().to_string());
        format!(
            "IMPORTANT: Respond ONLY with valid JSON matching this schema:\n{}\n\n\
             Do not wrap the JSON in markdown and do not add commentary before or after it.",
            rendered
        )
    }
}

impl SchemaField {
    /// Creates a required field.
    pub fn required(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            description: description.into(),
            minimum: None,
            maximum: None,
            min_items: None,
            max_items: None,
        }
    }

    /// Creates an optional field.
    pub fn optional(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type, description)
        }
    }

    /// Sets an inclusive numeric range.
    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Sets list-length bounds. `None` leaves that side open.
    pub fn with_items(mut self, min_items: Option<usize>, max_items: Option<usize>) -> Self {
        self.min_items = min_items;
        self.max_items = max_items;
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = type_schema(&self.field_type);
        if let Value::Object(map) = &mut schema {
            map.insert("description".to_string(), json!(self.description));
            if let Some(min) = self.minimum {
                map.insert("minimum".to_string(), json!(min));
            }
            if let Some(max) = self.maximum {
                map.insert("maximum".to_string(), json!(max));
            }
            if let Some(min) = self.min_items {
                map.insert("minItems".to_string(), json!(min));
            }
            if let Some(max) = self.max_items {
                map.insert("maxItems".to_string(), json!(max));
            }
        }
        schema
    }
}

fn type_schema(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::String => json!({ "type": "string" }),
        FieldType::Number => json!({ "type": "number" }),
        FieldType::Boolean => json!({ "type": "boolean" }),
        FieldType::Enum(values) => json!({ "type": "string", "enum": values }),
        FieldType::Array(item) => json!({ "type": "array", "items": type_schema(item) }),
        FieldType::Object(fields) => object_schema(fields),
    }
}

fn object_schema(fields: &[SchemaField]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), field.to_json_schema());
        if field.required {
            required.push(json!(field.name));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

//! Schema-to-binding conversion.
//!
//! Each [`ToolDescriptor`] becomes a [`BoundTool`]: a closed list of typed
//! parameter descriptors built once at agent creation. The bound tool renders
//! the model-facing definition and validates model-issued arguments before
//! dispatch.

use mcpagent_core::error::BindingError;
use mcpagent_core::provider::ToolDefinition;
use mcpagent_core::tool::{PropertySchema, ToolDescriptor};
use serde_json::{Map, Value, json};

/// Scalar kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Missing or unrecognized kind. Advertised to the model as a string,
    /// accepts any value.
    Opaque,
}

impl ParamKind {
    pub fn from_declared(kind: Option<&str>) -> Self {
        match kind {
            Some("string") => Self::String,
            Some("integer") => Self::Integer,
            Some("number") => Self::Number,
            Some("boolean") => Self::Boolean,
            _ => Self::Opaque,
        }
    }

    /// JSON Schema type advertised to the model.
    pub fn schema_type(self) -> &'static str {
        match self {
            Self::String | Self::Opaque => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Opaque => true,
        }
    }
}

/// One typed parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub kind: ParamKind,
    /// Declared kind as the server wrote it
    pub declared_kind: Option<String>,
    /// Required parameters have no default; optional ones default to absent.
    pub required: bool,
    pub description: Option<String>,
}

impl ParameterDescriptor {
    fn from_property(prop: &PropertySchema, required: bool) -> Self {
        Self {
            name: prop.name.clone(),
            kind: ParamKind::from_declared(prop.kind.as_deref()),
            declared_kind: prop.kind.clone(),
            required,
            // Title wins over description.
            description: prop.title.clone().or_else(|| prop.description.clone()),
        }
    }
}

/// A tool bound for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundTool {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterDescriptor>,
}

impl BoundTool {
    pub fn bind(tool: &ToolDescriptor) -> Result<Self, BindingError> {
        let schema = &tool.parameters;

        if schema.properties.is_empty() && !schema.required.is_empty() {
            return Err(BindingError::NoProperties {
                tool: tool.name.clone(),
            });
        }
        if let Some(missing) = schema
            .required
            .iter()
            .find(|r| schema.property(r).is_none())
        {
            return Err(BindingError::UndeclaredRequired {
                tool: tool.name.clone(),
                property: missing.clone(),
            });
        }

        let parameters = schema
            .properties
            .iter()
            .map(|p| ParameterDescriptor::from_property(p, schema.is_required(&p.name)))
            .collect();

        Ok(Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters,
        })
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// The definition advertised to the model.
    pub fn to_definition(&self) -> ToolDefinition {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(param.kind.schema_type()));
            if let Some(description) = &param.description {
                prop.insert("description".into(), json!(description));
            }
            properties.insert(param.name.clone(), Value::Object(prop));
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    /// Check model-issued arguments.
    ///
    /// Unknown extra arguments are tolerated; `null` counts as absent.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<(), String> {
        let mut problems = Vec::new();

        for param in &self.parameters {
            match arguments.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    problems.push(format!("missing required parameter '{}'", param.name));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.kind.accepts(value) => {
                    problems.push(format!(
                        "parameter '{}' must be {}, got {value}",
                        param.name,
                        param.kind.schema_type()
                    ));
                }
                Some(_) => {}
            }
        }

        let extra: Vec<&str> = arguments
            .keys()
            .filter(|k| self.parameter(k).is_none())
            .map(String::as_str)
            .collect();
        if !extra.is_empty() {
            tracing::debug!(tool = %self.name, extra = ?extra, "Ignoring undeclared arguments");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

/// Bind a whole catalog.
pub fn bind_all(tools: &[ToolDescriptor]) -> Result<Vec<BoundTool>, BindingError> {
    tools.iter().map(BoundTool::bind).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpagent_core::tool::ParameterSchema;

    fn prop(name: &str, kind: Option<&str>) -> PropertySchema {
        PropertySchema {
            name: name.into(),
            kind: kind.map(String::from),
            title: None,
            description: None,
        }
    }

    fn tool(properties: Vec<PropertySchema>, required: &[&str]) -> ToolDescriptor {
        ToolDescriptor {
            name: "search".into(),
            description: "Search things".into(),
            parameters: ParameterSchema {
                properties,
                required: required.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn kinds_map_to_scalars_and_unknown_degrades() {
        assert_eq!(ParamKind::from_declared(Some("integer")), ParamKind::Integer);
        assert_eq!(ParamKind::from_declared(Some("array")), ParamKind::Opaque);
        assert_eq!(ParamKind::from_declared(None), ParamKind::Opaque);
        assert_eq!(ParamKind::Opaque.schema_type(), "string");
    }

    #[test]
    fn required_iff_listed() {
        let bound = BoundTool::bind(&tool(
            vec![prop("query", Some("string")), prop("limit", Some("integer"))],
            &["query"],
        ))
        .unwrap();
        assert!(bound.parameter("query").unwrap().required);
        assert!(!bound.parameter("limit").unwrap().required);
    }

    #[test]
    fn title_preferred_over_description() {
        let mut p = prop("query", Some("string"));
        p.title = Some("Query".into());
        p.description = Some("What to search for".into());
        let mut q = prop("limit", Some("integer"));
        q.description = Some("Max results".into());

        let bound = BoundTool::bind(&tool(vec![p, q], &[])).unwrap();
        assert_eq!(bound.parameters[0].description.as_deref(), Some("Query"));
        assert_eq!(bound.parameters[1].description.as_deref(), Some("Max results"));
    }

    #[test]
    fn undeclared_required_fails() {
        let err = BoundTool::bind(&tool(vec![prop("query", None)], &["limit"])).unwrap_err();
        assert!(matches!(err, BindingError::UndeclaredRequired { property, .. } if property == "limit"));
    }

    #[test]
    fn required_without_properties_fails() {
        let err = BoundTool::bind(&tool(vec![], &["query"])).unwrap_err();
        assert!(matches!(err, BindingError::NoProperties { .. }));
    }

    #[test]
    fn zero_argument_tool_binds() {
        let bound = BoundTool::bind(&tool(vec![], &[])).unwrap();
        let def = bound.to_definition();
        assert_eq!(def.parameters["properties"], json!({}));
        assert!(bound.validate(&Map::new()).is_ok());
    }

    #[test]
    fn definition_shape() {
        let bound = BoundTool::bind(&tool(
            vec![prop("query", Some("string")), prop("filters", Some("object"))],
            &["query"],
        ))
        .unwrap();
        let def = bound.to_definition();
        assert_eq!(def.name, "search");
        assert_eq!(def.parameters["type"], "object");
        assert_eq!(def.parameters["properties"]["query"]["type"], "string");
        assert_eq!(def.parameters["properties"]["filters"]["type"], "string");
        assert_eq!(def.parameters["required"], json!(["query"]));
    }

    #[test]
    fn validate_reports_missing_and_mistyped() {
        let bound = BoundTool::bind(&tool(
            vec![
                prop("query", Some("string")),
                prop("limit", Some("integer")),
                prop("exact", Some("boolean")),
            ],
            &["query"],
        ))
        .unwrap();

        assert!(bound.validate(&args(json!({"query": "rust"}))).is_ok());
        assert!(bound.validate(&args(json!({"query": "rust", "limit": 5.0}))).is_ok());
        assert!(bound.validate(&args(json!({"query": "rust", "limit": null}))).is_ok());

        let err = bound.validate(&args(json!({"limit": "five"}))).unwrap_err();
        assert!(err.contains("missing required parameter 'query'"));
        assert!(err.contains("'limit' must be integer"));

        let err = bound
            .validate(&args(json!({"query": "rust", "exact": "yes"})))
            .unwrap_err();
        assert!(err.contains("'exact' must be boolean"));
    }

    #[test]
    fn extra_and_opaque_arguments_are_tolerated() {
        let bound = BoundTool::bind(&tool(vec![prop("filters", Some("object"))], &[])).unwrap();
        assert!(
            bound
                .validate(&args(json!({"filters": {"year": 2020}, "verbose": true})))
                .is_ok()
        );
    }

    #[test]
    fn bind_all_stops_at_first_error() {
        let good = tool(vec![prop("query", None)], &["query"]);
        let bad = tool(vec![], &["x"]);
        assert!(bind_all(&[good.clone()]).is_ok());
        assert!(bind_all(&[good, bad]).is_err());
    }
}

//! Tool catalog adapter.
//!
//! Turns the raw entries a tool transport reports into canonical
//! [`ToolDescriptor`]s. A single malformed entry aborts discovery: the
//! catalog is either accepted whole or not at all.

use std::collections::HashSet;

use mcpagent_core::error::{AuthError, DiscoveryError, TransportError};
use mcpagent_core::tool::{ParameterSchema, PropertySchema, ToolDescriptor};
use mcpagent_core::transport::{CredentialSupplier, RawToolEntry, ToolTransport};
use mcpagent_core::{Error, Result};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Fetch and normalize the catalog.
pub async fn discover(
    transport: &dyn ToolTransport,
    credentials: &dyn CredentialSupplier,
) -> Result<Vec<ToolDescriptor>> {
    let credential = credentials.credential().await?;

    let entries = transport
        .list_tools(credential.as_deref())
        .await
        .map_err(|e| match e {
            TransportError::Unauthorized(reason) => Error::Auth(AuthError::Rejected(reason)),
            other => Error::Discovery(DiscoveryError::Unreachable {
                endpoint: transport.endpoint().to_string(),
                reason: other.to_string(),
            }),
        })?;

    let tools = normalize_catalog(entries)?;
    if tools.is_empty() {
        warn!(endpoint = %transport.endpoint(), "Tool catalog is empty");
    } else {
        info!(
            endpoint = %transport.endpoint(),
            count = tools.len(),
            "Discovered tools"
        );
    }
    Ok(tools)
}

/// Normalize every entry and reject duplicate names.
pub fn normalize_catalog(entries: Vec<RawToolEntry>) -> std::result::Result<Vec<ToolDescriptor>, DiscoveryError> {
    let mut seen = HashSet::new();
    let mut tools = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let tool = normalize_entry(index, entry)?;
        if !seen.insert(tool.name.clone()) {
            return Err(DiscoveryError::DuplicateTool(tool.name));
        }
        debug!(tool = %tool.name, params = tool.parameters.properties.len(), "Normalized tool");
        tools.push(tool);
    }
    Ok(tools)
}

/// Normalize one catalog entry.
///
/// - missing description → empty string
/// - missing schema → object with no properties
/// - schema without `type` → treated as an object
pub fn normalize_entry(index: usize, entry: RawToolEntry) -> std::result::Result<ToolDescriptor, DiscoveryError> {
    let malformed = |reason: String| DiscoveryError::MalformedEntry { index, reason };

    let name = entry
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| malformed("missing tool name".into()))?;

    let parameters = match entry.input_schema {
        None | Some(Value::Null) => ParameterSchema::default(),
        Some(Value::Object(schema)) => {
            normalize_schema(&schema).map_err(|reason| malformed(format!("tool '{name}': {reason}")))?
        }
        Some(other) => {
            return Err(malformed(format!(
                "tool '{name}': input schema must be a JSON object, got {}",
                json_kind(&other)
            )));
        }
    };

    Ok(ToolDescriptor {
        name,
        description: entry.description.unwrap_or_default(),
        parameters,
    })
}

fn normalize_schema(schema: &Map<String, Value>) -> std::result::Result<ParameterSchema, String> {
    match schema.get("type") {
        None | Some(Value::Null) => {}
        Some(Value::String(t)) if t == "object" => {}
        Some(other) => return Err(format!("top-level schema type must be 'object', got {other}")),
    }

    let properties = match schema.get("properties") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(props)) => props
            .iter()
            .map(|(name, prop)| normalize_property(name, prop))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        Some(other) => return Err(format!("'properties' must be an object, got {}", json_kind(other))),
    };

    let required = match schema.get("required") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(String::from)
                    .ok_or_else(|| format!("'required' entries must be strings, got {item}"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?,
        Some(other) => return Err(format!("'required' must be an array, got {}", json_kind(other))),
    };

    Ok(ParameterSchema {
        properties,
        required,
    })
}

fn normalize_property(name: &str, prop: &Value) -> std::result::Result<PropertySchema, String> {
    let prop = prop
        .as_object()
        .ok_or_else(|| format!("property '{name}' must be an object, got {}", json_kind(prop)))?;

    // `"type": ["string", "null"]` declares a nullable string.
    let kind = match prop.get("type") {
        Some(Value::String(t)) => Some(t.clone()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .map(String::from),
        _ => None,
    };
    let text = |key: &str| prop.get(key).and_then(Value::as_str).map(String::from);

    Ok(PropertySchema {
        name: name.to_string(),
        kind,
        title: text("title"),
        description: text("description"),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! CycloneDX 1.x document types.
//!
//! Only the fields the merge engine reasons about are typed; everything else
//! is carried through untouched in the flattened `extra` maps.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A CycloneDX BOM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycloneDxBom {
    pub bom_format: String,
    pub spec_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CdxMetadata>,
    #[serde(default)]
    pub components: Vec<CdxComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formulation: Option<Vec<CdxFormula>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CycloneDxBom {
    /// `metadata.tools`, if present.
    #[must_use]
    pub fn tools(&self) -> Option<&ToolsRepresentation> {
        self.metadata.as_ref().and_then(|m| m.tools.as_ref())
    }
}

/// BOM metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CdxMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsRepresentation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<CdxComponent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A component entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdxComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<CdxHash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<CdxProperty>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CdxComponent {
    /// Create a component of the given type.
    pub fn new(component_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            name: name.into(),
            version: None,
            purl: None,
            hashes: Vec::new(),
            properties: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A `{name, value}` property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CdxProperty {
    pub name: String,
    pub value: String,
}

impl CdxProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdxHash {
    pub alg: String,
    pub content: String,
}

/// One entry of the `formulation` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdxFormula {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<CdxComponent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// metadata.tools
// ============================================================================

/// `metadata.tools` in either of its two schema shapes.
///
/// CycloneDX 1.4 uses a flat list of tools; 1.5 and later wrap tool
/// components in an object. Any other JSON shape fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolsRepresentation {
    /// 1.4 shape: `[{vendor, name, version}]`
    Flat(Vec<Tool>),
    /// 1.5 shape: `{components: [{type, author, name, version}]}`
    Versioned(ToolComponents),
}

impl ToolsRepresentation {
    /// Convert into 1.5 tool components.
    #[must_use]
    pub fn into_components(self) -> Vec<ToolComponent> {
        match self {
            Self::Flat(tools) => tools.into_iter().map(ToolComponent::from).collect(),
            Self::Versioned(wrapper) => wrapper.components,
        }
    }

    /// Convert into 1.4 tools.
    #[must_use]
    pub fn into_tools(self) -> Vec<Tool> {
        match self {
            Self::Flat(tools) => tools,
            Self::Versioned(wrapper) => wrapper.components.into_iter().map(Tool::from).collect(),
        }
    }
}

impl<'de> Deserialize<'de> for ToolsRepresentation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Array(_) => serde_json::from_value(value)
                .map(Self::Flat)
                .map_err(de::Error::custom),
            Value::Object(_) => serde_json::from_value(value)
                .map(Self::Versioned)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "metadata.tools must be a list or an object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Object wrapper of the 1.5 shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolComponents {
    #[serde(default)]
    pub components: Vec<ToolComponent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A 1.4 tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_references: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A 1.5 tool component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolComponent {
    #[serde(rename = "type", default = "application_type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_references: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn application_type() -> String {
    "application".to_string()
}

/// Shared keys carry over, `vendor` becomes `author`, shape-specific extras are dropped.
impl From<Tool> for ToolComponent {
    fn from(tool: Tool) -> Self {
        Self {
            component_type: application_type(),
            author: tool.vendor,
            name: tool.name.unwrap_or_default(),
            version: tool.version,
            purl: None,
            hashes: tool.hashes,
            external_references: tool.external_references,
            extra: Map::new(),
        }
    }
}

impl From<ToolComponent> for Tool {
    fn from(component: ToolComponent) -> Self {
        Self {
            vendor: component.author,
            name: Some(component.name),
            version: component.version,
            hashes: component.hashes,
            external_references: component.external_references,
            extra: Map::new(),
        }
    }
}

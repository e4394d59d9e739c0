//! Report definition, render design and location models.
//!
//! Responsibilities:
//! - Define the domain-level report catalogue types consumed by the run-report form
//! - Define lenient wire models for the OpenMRS list resources (extra keys such as `links`
//!   are ignored)
//! - Translate wire models into domain types, rejecting empty identifiers
//!
//! Notes:
//! - Parameter types are carried as the Java class name the server declares, for example
//!   `java.util.Date`. Which of them the form can render is decided by the caller, not here.

use crate::wire::{parse_json, require_identifier, ResultsWire};
use crate::OpenmrsResult;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Java type tag for date parameters.
pub const DATE_TYPE: &str = "java.util.Date";
/// Java type tag for free-text parameters.
pub const STRING_TYPE: &str = "java.lang.String";
/// Java type tag for integer parameters.
pub const INTEGER_TYPE: &str = "java.lang.Integer";
/// Java type tag for location references.
pub const LOCATION_TYPE: &str = "org.openmrs.Location";
/// Java type tag for concept references.
pub const CONCEPT_TYPE: &str = "org.openmrs.Concept";
/// Java type tag for encounter type references.
pub const ENCOUNTER_TYPE_TYPE: &str = "org.openmrs.EncounterType";

/// A declared parameter type tag.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterType(String);

/// The input shape a parameter type maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterKind {
    Date,
    Text,
    Integer,
    /// A uuid reference to a location, concept or encounter type.
    Reference,
    /// A type tag with no known input shape.
    Unknown,
}

impl ParameterType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn date() -> Self {
        Self::new(DATE_TYPE)
    }

    pub fn string() -> Self {
        Self::new(STRING_TYPE)
    }

    pub fn integer() -> Self {
        Self::new(INTEGER_TYPE)
    }

    pub fn location() -> Self {
        Self::new(LOCATION_TYPE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_date(&self) -> bool {
        self.0 == DATE_TYPE
    }

    pub fn kind(&self) -> ParameterKind {
        match self.0.as_str() {
            DATE_TYPE => ParameterKind::Date,
            STRING_TYPE => ParameterKind::Text,
            INTEGER_TYPE => ParameterKind::Integer,
            LOCATION_TYPE | CONCEPT_TYPE | ENCOUNTER_TYPE_TYPE => ParameterKind::Reference,
            _ => ParameterKind::Unknown,
        }
    }
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParameterType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// A parameter declared by a report definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Unique within the owning report; used as the key in the parameters map.
    pub name: String,
    /// Human-readable label, when the server provides one.
    pub label: Option<String>,
    pub parameter_type: ParameterType,
    pub required: bool,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, parameter_type: ParameterType, required: bool) -> Self {
        Self {
            name: name.into(),
            label: None,
            parameter_type,
            required,
        }
    }

    /// Label to display, falling back to the parameter name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// A named, parameterised report template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportDefinition {
    pub uuid: String,
    pub name: String,
    /// Declaration order is rendering and validation order.
    pub parameters: Vec<ParameterSpec>,
}

impl ReportDefinition {
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }
}

/// An output format option for a report definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderDesign {
    pub uuid: String,
    pub name: String,
}

/// A location that reference parameters may point at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub uuid: String,
    pub display: String,
}

// ============================================================================
// Public parse operations
// ============================================================================

/// Report definition list operations.
pub struct ReportDefinitions;

impl ReportDefinitions {
    /// Parse a `{ "results": [...] }` report definition list.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OpenmrsError`] if the JSON does not match the wire schema or any
    /// definition or parameter has an empty identifier.
    pub fn parse(json_text: &str) -> OpenmrsResult<Vec<ReportDefinition>> {
        let wire: ResultsWire<ReportDefinitionWire> = parse_json(json_text, "report definitions")?;
        wire.results.into_iter().map(definition_to_domain).collect()
    }
}

/// Render design list operations.
pub struct RenderDesigns;

impl RenderDesigns {
    /// Parse a `{ "results": [...] }` render design list.
    pub fn parse(json_text: &str) -> OpenmrsResult<Vec<RenderDesign>> {
        let wire: ResultsWire<RenderDesignWire> = parse_json(json_text, "render designs")?;
        wire.results
            .into_iter()
            .map(|d| {
                Ok(RenderDesign {
                    uuid: require_identifier(d.uuid, "design uuid")?,
                    name: d.name,
                })
            })
            .collect()
    }
}

/// Location list operations.
pub struct Locations;

impl Locations {
    /// Parse a `{ "results": [...] }` location list.
    pub fn parse(json_text: &str) -> OpenmrsResult<Vec<Location>> {
        let wire: ResultsWire<LocationWire> = parse_json(json_text, "locations")?;
        wire.results
            .into_iter()
            .map(|l| {
                Ok(Location {
                    uuid: require_identifier(l.uuid, "location uuid")?,
                    display: l.display,
                })
            })
            .collect()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ReportDefinitionWire {
    uuid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    parameters: Vec<ParameterWire>,
}

#[derive(Debug, Deserialize)]
struct ParameterWire {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type")]
    parameter_type: String,
    #[serde(default)]
    required: bool,
}

#[derive(Debug, Deserialize)]
struct RenderDesignWire {
    uuid: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LocationWire {
    uuid: String,
    #[serde(default)]
    display: String,
}

fn definition_to_domain(wire: ReportDefinitionWire) -> OpenmrsResult<ReportDefinition> {
    let parameters = wire
        .parameters
        .into_iter()
        .map(|p| {
            Ok(ParameterSpec {
                name: require_identifier(p.name, "parameter name")?,
                label: p.label.filter(|l| !l.trim().is_empty()),
                parameter_type: ParameterType::new(p.parameter_type),
                required: p.required,
            })
        })
        .collect::<OpenmrsResult<Vec<_>>>()?;

    Ok(ReportDefinition {
        uuid: require_identifier(wire.uuid, "report definition uuid")?,
        name: wire.name,
        parameters,
    })
}

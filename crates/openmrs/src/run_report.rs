//! Run-report request body and parameter values.
//!
//! The run-report resource accepts a one-shot request shaped as:
//!
//! ```json
//! {
//!   "uuid": null,
//!   "reportDefinition": {
//!     "parameterizable": { "uuid": "<report uuid>" },
//!     "parameterMappings": { "<parameter name>": <value> }
//!   },
//!   "renderingMode": { "argument": "<render design uuid>" },
//!   "schedule": null
//! }
//! ```
//!
//! `uuid` and `schedule` are always null: this client never creates scheduled requests.

use crate::report_definition::ParameterKind;
use crate::OpenmrsResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Literal a date input produces when it cannot parse what the user typed.
pub const INVALID_DATE: &str = "Invalid Date";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current value of a single report parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterValue {
    Date(NaiveDate),
    /// The invalid-date sentinel.
    InvalidDate,
    Text(String),
    Integer(i64),
    /// A uuid reference (location, concept, encounter type).
    Reference(String),
    Flag(bool),
}

impl ParameterValue {
    /// Whether the value satisfies a required parameter.
    ///
    /// Empty text, empty references, the invalid-date sentinel and an unchecked flag count as
    /// absent.
    pub fn is_present(&self) -> bool {
        match self {
            ParameterValue::Date(_) | ParameterValue::Integer(_) => true,
            ParameterValue::InvalidDate => false,
            ParameterValue::Text(s) | ParameterValue::Reference(s) => {
                !s.is_empty() && s != INVALID_DATE
            }
            ParameterValue::Flag(checked) => *checked,
        }
    }

    /// Value produced by a date picker. `None` means the picker could not produce a date.
    pub fn from_date(date: Option<NaiveDate>) -> Self {
        date.map_or(ParameterValue::InvalidDate, ParameterValue::Date)
    }

    /// Type raw text input according to the parameter's input kind.
    ///
    /// Text is stored exactly as typed, so whitespace-only text still counts as present. For the
    /// parsed kinds, blank input is kept as empty text so that a cleared field reads as absent.
    /// A date that does not parse as `YYYY-MM-DD` becomes [`ParameterValue::InvalidDate`]. An
    /// integer that does not parse is kept as text for the server to reject.
    pub fn from_input(kind: ParameterKind, raw: &str) -> Self {
        if matches!(kind, ParameterKind::Text | ParameterKind::Unknown) {
            return ParameterValue::Text(raw.to_string());
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ParameterValue::Text(String::new());
        }

        match kind {
            ParameterKind::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map_or(ParameterValue::InvalidDate, ParameterValue::Date),
            ParameterKind::Integer => trimmed
                .parse::<i64>()
                .map_or_else(|_| ParameterValue::Text(raw.to_string()), ParameterValue::Integer),
            ParameterKind::Reference => ParameterValue::Reference(trimmed.to_string()),
            ParameterKind::Text | ParameterKind::Unknown => ParameterValue::Text(raw.to_string()),
        }
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            ParameterValue::InvalidDate => f.write_str(INVALID_DATE),
            ParameterValue::Text(s) | ParameterValue::Reference(s) => f.write_str(s),
            ParameterValue::Integer(n) => write!(f, "{n}"),
            ParameterValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for ParameterValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ParameterValue::Integer(n) => serializer.serialize_i64(*n),
            ParameterValue::Flag(b) => serializer.serialize_bool(*b),
            other => serializer.collect_str(other),
        }
    }
}

/// Parameter name to current value.
pub type ParametersMap = BTreeMap<String, ParameterValue>;

/// Domain-level carrier for a one-shot run-report request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReportRequest {
    pub report_uuid: String,
    pub parameter_mappings: ParametersMap,
    pub render_mode_uuid: String,
}

/// Run-report operations.
pub struct RunReport;

impl RunReport {
    /// Render the request body as a JSON value.
    pub fn to_json(request: &RunReportRequest) -> OpenmrsResult<serde_json::Value> {
        Ok(serde_json::to_value(domain_to_wire(request))?)
    }

    /// Render the request body as JSON text.
    pub fn render(request: &RunReportRequest) -> OpenmrsResult<String> {
        Ok(serde_json::to_string(&domain_to_wire(request))?)
    }

    /// Extract `error.message` from an OpenMRS error body.
    ///
    /// Returns `None` for bodies that are not JSON, have no message, or have an empty one.
    pub fn parse_error_message(body: &str) -> Option<String> {
        let wire: ErrorBodyWire = serde_json::from_str(body).ok()?;
        wire.error
            .and_then(|e| e.message)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReportRequestWire<'a> {
    uuid: Option<&'a str>,
    report_definition: ReportDefinitionRefWire<'a>,
    rendering_mode: RenderingModeWire<'a>,
    schedule: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDefinitionRefWire<'a> {
    parameterizable: UuidRefWire<'a>,
    parameter_mappings: &'a ParametersMap,
}

#[derive(Debug, Serialize)]
struct UuidRefWire<'a> {
    uuid: &'a str,
}

#[derive(Debug, Serialize)]
struct RenderingModeWire<'a> {
    argument: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyWire {
    #[serde(default)]
    error: Option<ErrorWire>,
}

#[derive(Debug, Deserialize)]
struct ErrorWire {
    #[serde(default)]
    message: Option<String>,
}

fn domain_to_wire(request: &RunReportRequest) -> RunReportRequestWire<'_> {
    RunReportRequestWire {
        uuid: None,
        report_definition: ReportDefinitionRefWire {
            parameterizable: UuidRefWire {
                uuid: &request.report_uuid,
            },
            parameter_mappings: &request.parameter_mappings,
        },
        rendering_mode: RenderingModeWire {
            argument: &request.render_mode_uuid,
        },
        schedule: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn renders_request_shape() {
        let mut parameter_mappings = ParametersMap::new();
        parameter_mappings.insert(
            "startDate".into(),
            ParameterValue::Date(date(2024, 1, 1)),
        );
        parameter_mappings.insert("facility".into(), ParameterValue::Text("Ward A".into()));
        parameter_mappings.insert("minAge".into(), ParameterValue::Integer(15));

        let request = RunReportRequest {
            report_uuid: "R1".into(),
            parameter_mappings,
            render_mode_uuid: "design-csv".into(),
        };

        let body = RunReport::to_json(&request).expect("render");
        assert_eq!(
            body,
            json!({
                "uuid": null,
                "reportDefinition": {
                    "parameterizable": {"uuid": "R1"},
                    "parameterMappings": {
                        "facility": "Ward A",
                        "minAge": 15,
                        "startDate": "2024-01-01"
                    }
                },
                "renderingMode": {"argument": "design-csv"},
                "schedule": null
            })
        );
    }

    #[test]
    fn presence_rules() {
        assert!(ParameterValue::Date(date(2024, 1, 1)).is_present());
        assert!(ParameterValue::Integer(0).is_present());
        assert!(ParameterValue::Text("x".into()).is_present());
        assert!(!ParameterValue::InvalidDate.is_present());
        assert!(!ParameterValue::Text(String::new()).is_present());
        assert!(!ParameterValue::Text(INVALID_DATE.into()).is_present());
        assert!(!ParameterValue::Reference(String::new()).is_present());
        assert!(!ParameterValue::Flag(false).is_present());
    }

    #[test]
    fn from_input_types_by_kind() {
        assert_eq!(
            ParameterValue::from_input(ParameterKind::Date, "2024-01-01"),
            ParameterValue::Date(date(2024, 1, 1))
        );
        assert_eq!(
            ParameterValue::from_input(ParameterKind::Date, "01/13/2024"),
            ParameterValue::InvalidDate
        );
        assert_eq!(
            ParameterValue::from_input(ParameterKind::Date, ""),
            ParameterValue::Text(String::new())
        );
        assert_eq!(
            ParameterValue::from_input(ParameterKind::Integer, " 42 "),
            ParameterValue::Integer(42)
        );
        assert_eq!(
            ParameterValue::from_input(ParameterKind::Integer, "forty"),
            ParameterValue::Text("forty".into())
        );
        assert_eq!(
            ParameterValue::from_input(ParameterKind::Reference, "L1"),
            ParameterValue::Reference("L1".into())
        );
        assert_eq!(ParameterValue::from_date(None), ParameterValue::InvalidDate);
    }

    #[test]
    fn text_input_is_kept_verbatim() {
        let spaces = ParameterValue::from_input(ParameterKind::Text, "   ");
        assert_eq!(spaces, ParameterValue::Text("   ".into()));
        assert!(spaces.is_present());

        assert_eq!(
            ParameterValue::from_input(ParameterKind::Unknown, " Ward A "),
            ParameterValue::Text(" Ward A ".into())
        );
        assert!(!ParameterValue::from_input(ParameterKind::Text, "").is_present());

        // Parsed kinds still treat blank input as cleared.
        assert_eq!(
            ParameterValue::from_input(ParameterKind::Reference, "  "),
            ParameterValue::Text(String::new())
        );
        assert_eq!(
            ParameterValue::from_input(ParameterKind::Integer, " "),
            ParameterValue::Text(String::new())
        );
    }

    #[test]
    fn parses_openmrs_error_message() {
        let body = r#"{"error": {"message": "Invalid date range", "code": "webservices.rest"}}"#;
        assert_eq!(
            RunReport::parse_error_message(body),
            Some("Invalid date range".to_string())
        );
        assert_eq!(RunReport::parse_error_message("<html>502</html>"), None);
        assert_eq!(RunReport::parse_error_message(r#"{"error": {}}"#), None);
        assert_eq!(
            RunReport::parse_error_message(r#"{"error": {"message": "  "}}"#),
            None
        );
    }
}

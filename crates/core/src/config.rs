//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the form and the REST client. Environment variables and files are read by the
//! binary, never during form operations, so evaluation stays pure and tests stay isolated.

use crate::category_index::CategoryIndex;
use crate::constants::{
    DEFAULT_CATEGORY_OPTIONS, DEFAULT_ERROR_TITLE, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SETTLE_DELAY_MS, DEFAULT_SUCCESS_TITLE, DEFAULT_SUPPORTED_PARAMETER_TYPES,
};
use crate::parameter_gate::ParameterTypeGate;
use crate::{ReportError, ReportResult};
use openmrs::{CategoryKey, ParameterType};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

/// A selectable category with its display label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryOption {
    pub key: CategoryKey,
    pub label: String,
}

/// Titles used for submission notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationTitles {
    pub success: String,
    pub error: String,
}

impl Default for NotificationTitles {
    fn default() -> Self {
        Self {
            success: DEFAULT_SUCCESS_TITLE.into(),
            error: DEFAULT_ERROR_TITLE.into(),
        }
    }
}

/// Static configuration table for the run-report form.
#[derive(Clone, Debug)]
pub struct FormConfig {
    supported_parameter_types: Vec<ParameterType>,
    categories: Vec<CategoryOption>,
    settle_delay: Duration,
    notifications: NotificationTitles,
}

impl FormConfig {
    /// Create a new `FormConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidConfig`] if the type whitelist is empty, a type tag or
    /// category key is blank, or a category key is listed twice.
    pub fn new(
        supported_parameter_types: Vec<ParameterType>,
        categories: Vec<CategoryOption>,
        settle_delay: Duration,
        notifications: NotificationTitles,
    ) -> ReportResult<Self> {
        if supported_parameter_types.is_empty() {
            return Err(ReportError::InvalidConfig(
                "supported_parameter_types cannot be empty".into(),
            ));
        }
        if supported_parameter_types
            .iter()
            .any(|t| t.as_str().trim().is_empty())
        {
            return Err(ReportError::InvalidConfig(
                "supported_parameter_types cannot contain blank entries".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        for option in &categories {
            if option.key.as_str().trim().is_empty() {
                return Err(ReportError::InvalidConfig(
                    "category key cannot be empty".into(),
                ));
            }
            if !seen.insert(option.key.clone()) {
                return Err(ReportError::InvalidConfig(format!(
                    "category key '{}' is listed more than once",
                    option.key
                )));
            }
        }

        Ok(Self {
            supported_parameter_types,
            categories,
            settle_delay,
            notifications,
        })
    }

    /// Parse configuration from YAML text.
    ///
    /// Missing keys take their defaults and unknown keys are rejected. Errors name the
    /// failing field path (for example `categories[1].key`).
    pub fn parse(yaml_text: &str) -> ReportResult<Self> {
        if yaml_text.trim().is_empty() {
            return Ok(Self::default());
        }

        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = match serde_path_to_error::deserialize::<_, FormConfigWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(ReportError::InvalidConfig(format!(
                    "form configuration schema mismatch at {path}: {source}"
                )));
            }
        };

        wire_to_config(wire)
    }

    /// Read and parse a YAML configuration file.
    pub fn load(path: &Path) -> ReportResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ReportError::ConfigRead)?;
        Self::parse(&text)
    }

    /// Replace the settle delay, for example from an environment override.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn supported_parameter_types(&self) -> &[ParameterType] {
        &self.supported_parameter_types
    }

    pub fn categories(&self) -> &[CategoryOption] {
        &self.categories
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn notifications(&self) -> &NotificationTitles {
        &self.notifications
    }

    pub fn parameter_gate(&self) -> ParameterTypeGate {
        ParameterTypeGate::new(self.supported_parameter_types.iter().cloned())
    }

    pub fn category_index(&self) -> CategoryIndex {
        CategoryIndex::new(self.categories.clone())
    }

    /// Look up a configured category by key.
    pub fn category(&self, key: &str) -> Option<&CategoryOption> {
        self.categories.iter().find(|c| c.key.as_str() == key)
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            supported_parameter_types: DEFAULT_SUPPORTED_PARAMETER_TYPES
                .iter()
                .map(|t| ParameterType::new(*t))
                .collect(),
            categories: default_categories(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            notifications: NotificationTitles::default(),
        }
    }
}

fn default_categories() -> Vec<CategoryOption> {
    DEFAULT_CATEGORY_OPTIONS
        .iter()
        .map(|(key, label)| CategoryOption {
            key: CategoryKey::new(*key),
            label: (*label).into(),
        })
        .collect()
}

/// Connection settings for the OpenMRS REST client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// The base URL must be an `http://` or `https://` URL; a trailing slash is dropped.
    pub fn new(
        base_url: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> ReportResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(ReportError::InvalidInput("base_url cannot be empty".into()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ReportError::InvalidInput(format!(
                "base_url must start with http:// or https:// (got {base_url})"
            )));
        }

        Ok(Self {
            base_url,
            username: username.filter(|u| !u.trim().is_empty()),
            password,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Parse a settle delay override in milliseconds from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `Ok(None)` so the configured delay stands.
pub fn settle_delay_from_env_value(value: Option<String>) -> ReportResult<Option<Duration>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    value
        .map(|v| {
            v.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                ReportError::InvalidInput(format!(
                    "settle delay must be a whole number of milliseconds (got {v})"
                ))
            })
        })
        .transpose()
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FormConfigWire {
    #[serde(default)]
    supported_parameter_types: Option<Vec<String>>,
    #[serde(default)]
    categories: Option<Vec<CategoryOptionWire>>,
    #[serde(default)]
    settle_delay_ms: Option<u64>,
    #[serde(default)]
    notifications: Option<NotificationTitlesWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryOptionWire {
    key: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NotificationTitlesWire {
    #[serde(default)]
    success: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn wire_to_config(wire: FormConfigWire) -> ReportResult<FormConfig> {
    let defaults = FormConfig::default();

    let supported_parameter_types = wire
        .supported_parameter_types
        .map(|types| types.into_iter().map(ParameterType::new).collect())
        .unwrap_or(defaults.supported_parameter_types);

    let categories = wire
        .categories
        .map(|options| {
            options
                .into_iter()
                .map(|o| CategoryOption {
                    label: o.label.unwrap_or_else(|| o.key.clone()),
                    key: CategoryKey::new(o.key),
                })
                .collect()
        })
        .unwrap_or(defaults.categories);

    let settle_delay = wire
        .settle_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.settle_delay);

    let notifications = match wire.notifications {
        Some(n) => NotificationTitles {
            success: n.success.unwrap_or(defaults.notifications.success),
            error: n.error.unwrap_or(defaults.notifications.error),
        },
        None => defaults.notifications,
    };

    FormConfig::new(
        supported_parameter_types,
        categories,
        settle_delay,
        notifications,
    )
}

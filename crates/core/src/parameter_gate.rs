//! Parameter type whitelist.
//!
//! The gate records which declared parameter types the form knows how to render and submit.
//! It never hides a parameter; a report that declares an unsupported type simply cannot be
//! submitted.

use openmrs::{ParameterSpec, ParameterType};
use std::collections::BTreeSet;

use crate::constants::DEFAULT_SUPPORTED_PARAMETER_TYPES;

/// Whitelist of renderable parameter types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterTypeGate {
    supported: BTreeSet<ParameterType>,
}

/// Result of classifying a report's declared parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterSupport {
    /// Distinct unsupported types, in sorted order.
    pub unsupported: BTreeSet<ParameterType>,
}

impl ParameterSupport {
    pub fn all_supported(&self) -> bool {
        self.unsupported.is_empty()
    }
}

impl ParameterTypeGate {
    pub fn new(supported: impl IntoIterator<Item = ParameterType>) -> Self {
        Self {
            supported: supported.into_iter().collect(),
        }
    }

    pub fn is_supported(&self, parameter_type: &ParameterType) -> bool {
        self.supported.contains(parameter_type)
    }

    /// Classify declared parameters. An empty list is trivially all supported.
    pub fn classify(&self, parameters: &[ParameterSpec]) -> ParameterSupport {
        ParameterSupport {
            unsupported: parameters
                .iter()
                .map(|p| &p.parameter_type)
                .filter(|t| !self.is_supported(t))
                .cloned()
                .collect(),
        }
    }

    pub fn supported_types(&self) -> impl Iterator<Item = &ParameterType> {
        self.supported.iter()
    }
}

impl Default for ParameterTypeGate {
    fn default() -> Self {
        Self::new(
            DEFAULT_SUPPORTED_PARAMETER_TYPES
                .iter()
                .map(|t| ParameterType::new(*t)),
        )
    }
}

//! Output formatters for resource states
//!
//! Provides summary, JSON and YAML output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::ResourceState;

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    JsonPretty,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Summary => "summary",
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json-pretty",
            OutputFormat::Yaml => "yaml",
        };
        write!(f, "{name}")
    }
}

/// Resource state formatter
pub struct StateFormatter {
    format: OutputFormat,
}

impl StateFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format a single resource state
    pub fn format_state(&self, state: &ResourceState) -> String {
        match self.format {
            OutputFormat::Summary => self.format_summary(state),
            OutputFormat::Json => serde_json::to_string(state).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(state).unwrap_or_default(),
            OutputFormat::Yaml => serde_yaml::to_string(state).unwrap_or_default(),
        }
    }

    fn format_summary(&self, state: &ResourceState) -> String {
        let kind = state.kind();
        let mut lines = vec![
            format!("{kind} namespace: {}", state.namespace()),
            format!("{kind} name: {}", state.name()),
            format!("{kind} api version: {}", state.api_version()),
        ];

        if let Some(uid) = state.uid() {
            lines.push(format!("{kind} uid: {uid}"));
        }
        if let Some(version) = state.resource_version() {
            lines.push(format!("{kind} resource version: {version}"));
        }
        if let Some(created) = state.creation_timestamp() {
            lines.push(format!("{kind} created: {}", created.to_rfc3339()));
        }
        if let Some(phase) = state.phase() {
            lines.push(format!("{kind} phase: {phase}"));
        }
        if !state.labels().is_empty() {
            let labels: Vec<_> = state
                .labels()
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            lines.push(format!("{kind} labels: {}", labels.join(",")));
        }

        lines.join("\n")
    }
}

//! Server-side resource snapshots

use chrono::{DateTime, Utc};
use kube::api::DynamicObject;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::descriptor::Identity;

/// What the API server returned for an object after create or get
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    kind: String,
    api_version: String,
    namespace: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creation_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phase: Option<String>,
    data: Value,
}

impl ResourceState {
    /// Build a snapshot from a server response.
    ///
    /// Fields the server omitted are filled from the identity the request
    /// was made for.
    pub fn from_object(object: DynamicObject, requested: &Identity) -> Self {
        let (kind, api_version) = match object.types {
            Some(types) => (types.kind, types.api_version),
            None => (requested.kind().to_string(), requested.api_version()),
        };

        let metadata = object.metadata;
        let phase = object
            .data
            .get("status")
            .and_then(|status| status.get("phase"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            kind,
            api_version,
            namespace: metadata
                .namespace
                .unwrap_or_else(|| requested.namespace().to_string()),
            name: metadata
                .name
                .unwrap_or_else(|| requested.name().to_string()),
            uid: metadata.uid,
            resource_version: metadata.resource_version,
            creation_timestamp: metadata.creation_timestamp.map(|t| t.0),
            labels: metadata.labels.unwrap_or_default(),
            phase,
            data: object.data,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn resource_version(&self) -> Option<&str> {
        self.resource_version.as_deref()
    }

    pub fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
        self.creation_timestamp
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    /// True when this snapshot names the same object as `identity`
    pub fn matches(&self, identity: &Identity) -> bool {
        self.kind == identity.kind()
            && self.namespace == identity.namespace()
            && self.name == identity.name()
    }
}

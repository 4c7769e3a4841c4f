//! Resource descriptors
//!
//! Declarative description of the single object the client creates.

use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::Resource;
use kube::core::GroupVersionKind;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Top-level manifest fields owned by the descriptor itself
const RESERVED_FIELDS: &[&str] = &["apiVersion", "kind", "metadata"];

/// Errors raised while reading a manifest into a descriptor
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    #[error("Manifest is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Manifest field `{0}` has the wrong type")]
    WrongType(&'static str),

    #[error("Manifest field `{0}` is not a known object metadata field")]
    UnknownField(String),
}

/// The (kind, namespace, name) triple naming an object in a cluster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    gvk: GroupVersionKind,
    namespace: String,
    name: String,
}

impl Identity {
    pub fn new(
        gvk: GroupVersionKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            gvk,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    pub fn kind(&self) -> &str {
        &self.gvk.kind
    }

    pub fn api_version(&self) -> String {
        if self.gvk.group.is_empty() {
            self.gvk.version.clone()
        } else {
            format!("{}/{}", self.gvk.group, self.gvk.version)
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check that every part of the identity is present
    pub fn validate(&self) -> Result<(), String> {
        let parts = [
            ("kind", self.gvk.kind.as_str()),
            ("version", self.gvk.version.as_str()),
            ("namespace", self.namespace.as_str()),
            ("name", self.name.as_str()),
        ];

        for (field, value) in parts {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.gvk.kind, self.namespace, self.name)
    }
}

/// Desired state of one object
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceDescriptor {
    identity: Identity,
    labels: BTreeMap<String, String>,
    /// Remaining object metadata (annotations, finalizers, owner references...)
    metadata: ObjectMeta,
    payload: Value,
}

impl ResourceDescriptor {
    pub fn new(
        gvk: GroupVersionKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            identity: Identity::new(gvk, namespace, name),
            labels: BTreeMap::new(),
            metadata: ObjectMeta::default(),
            payload: Value::Object(Map::new()),
        }
    }

    /// Pod running a single container of `image`
    pub fn pod(
        namespace: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        let image = image.into();
        let container_name = container_name_for(&image);
        Self::pod_with_container(namespace, name, container_name, image)
    }

    pub fn pod_with_container(
        namespace: impl Into<String>,
        name: impl Into<String>,
        container_name: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        let spec = PodSpec {
            containers: vec![Container {
                name: container_name.into(),
                image: Some(image.into()),
                ..Default::default()
            }],
            ..Default::default()
        };

        Self::pod_from_spec(namespace, name, spec)
    }

    pub fn pod_from_spec(
        namespace: impl Into<String>,
        name: impl Into<String>,
        spec: PodSpec,
    ) -> Self {
        Self::new(pod_gvk(), namespace, name).with_payload(serde_json::json!({ "spec": spec }))
    }

    /// Read a descriptor from a YAML or JSON manifest.
    ///
    /// `apiVersion`, `kind` and `metadata` become the identity, labels and
    /// remaining metadata; every other top-level field is carried as the
    /// payload. Null metadata fields count as absent.
    pub fn from_manifest(text: &str, default_namespace: &str) -> Result<Self, DescriptorError> {
        let manifest: Value =
            serde_yaml::from_str(text).map_err(|e| DescriptorError::Parse(e.to_string()))?;

        let Value::Object(mut fields) = manifest else {
            return Err(DescriptorError::WrongType("<root>"));
        };

        let api_version = take_string(&mut fields, "apiVersion")?;
        let kind = take_string(&mut fields, "kind")?;
        let raw_metadata = match fields.remove("metadata") {
            Some(Value::Object(metadata)) => metadata,
            Some(_) => return Err(DescriptorError::WrongType("metadata")),
            None => return Err(DescriptorError::MissingField("metadata")),
        };

        let mut metadata: ObjectMeta = serde_json::from_value(Value::Object(raw_metadata.clone()))
            .map_err(|_| DescriptorError::WrongType("metadata"))?;
        check_metadata_fields(&raw_metadata, &metadata)?;

        let name = metadata
            .name
            .take()
            .ok_or(DescriptorError::MissingField("metadata.name"))?;
        let namespace = metadata
            .namespace
            .take()
            .unwrap_or_else(|| default_namespace.to_string());
        let labels = metadata.labels.take().unwrap_or_default();

        let (group, version) = parse_api_version(&api_version);
        let gvk = GroupVersionKind::gvk(group, version, &kind);

        let mut descriptor = Self::new(gvk, namespace, name)
            .with_labels(labels)
            .with_payload(Value::Object(fields));
        descriptor.metadata = metadata;
        Ok(descriptor)
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels.extend(labels);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Metadata other than name, namespace and labels
    pub fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Local precondition check, run before any request is sent
    pub fn validate(&self) -> Result<(), String> {
        self.identity.validate()?;

        match &self.payload {
            Value::Null => Ok(()),
            Value::Object(fields) => match RESERVED_FIELDS.iter().find(|f| fields.contains_key(**f)) {
                Some(field) => Err(format!("payload must not set `{field}`")),
                None => Ok(()),
            },
            _ => Err("payload must be a JSON object".to_string()),
        }
    }
}

/// Group/version/kind of core/v1 Pod
pub fn pod_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(Pod::GROUP, Pod::VERSION, Pod::KIND)
}

/// Split `apps/v1` into ("apps", "v1"); core versions have an empty group
pub fn parse_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// Derive a container name from an image reference.
///
/// `docker.io/library/nginx:1.25` becomes `nginx`.
pub fn container_name_for(image: &str) -> String {
    let without_digest = image.split('@').next().unwrap_or(image);
    let last_segment = without_digest.rsplit('/').next().unwrap_or(without_digest);
    let repository = last_segment.split(':').next().unwrap_or(last_segment);

    let name: String = repository
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let name = name.trim_matches('-');

    if name.is_empty() {
        "main".to_string()
    } else {
        name.to_string()
    }
}

/// Reject metadata keys that `ObjectMeta` would silently drop
fn check_metadata_fields(raw: &Map<String, Value>, parsed: &ObjectMeta) -> Result<(), DescriptorError> {
    let known = serde_json::to_value(parsed).map_err(|e| DescriptorError::Parse(e.to_string()))?;

    match raw
        .iter()
        .find(|(key, value)| !value.is_null() && known.get(key.as_str()).is_none())
    {
        Some((key, _)) => Err(DescriptorError::UnknownField(format!("metadata.{key}"))),
        None => Ok(()),
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &'static str) -> Result<String, DescriptorError> {
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(DescriptorError::WrongType(key)),
        None => Err(DescriptorError::MissingField(key)),
    }
}

//! Resource operations
//!
//! Create, get and ensure a single object through a [`ConnectionHandle`].
//! Each call sends one request, bounded by a caller-supplied deadline, and
//! is never retried.

use kube::api::{ApiResource, DynamicObject, PostParams};
use kube::core::GroupVersionKind;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::ConnectionHandle;
use crate::models::{Identity, ResourceDescriptor, ResourceState};
use crate::utils::Timer;

/// Resource operation errors
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Invalid resource: {0}")]
    Invalid(String),

    #[error("{0} already exists")]
    AlreadyExists(Identity),

    #[error("{0} not found")]
    NotFound(Identity),

    #[error("Cluster unavailable: {0}")]
    Unavailable(String),

    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Result of [`ResourceOperations::ensure`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Existing,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Existing => write!(f, "existing"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verb {
    Create,
    Get,
}

/// Operations against one object at a time
pub struct ResourceOperations {
    handle: ConnectionHandle,
}

impl ResourceOperations {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Create the described object.
    ///
    /// Fails with [`OperationError::AlreadyExists`] when an object with the
    /// same identity is present; the existing object is left untouched.
    pub async fn create(
        &self,
        descriptor: &ResourceDescriptor,
        deadline: Duration,
    ) -> Result<ResourceState, OperationError> {
        descriptor.validate().map_err(OperationError::Invalid)?;

        let identity = descriptor.identity();
        let resource = ApiResource::from_gvk(identity.gvk());
        let api = self.handle.dynamic_api(identity.namespace(), &resource);
        let object = build_object(descriptor, &resource);

        info!("Creating {} ...", identity);
        let timer = Timer::start(format!("create {identity}"));

        let created = within_deadline(deadline, async {
            api.create(&PostParams::default(), &object)
                .await
                .map_err(|e| classify(e, Verb::Create, identity))
        })
        .await;

        timer.stop();
        let created = created?;
        info!("{} created successfully", identity);

        Ok(ResourceState::from_object(created, identity))
    }

    /// Fetch an object by identity
    pub async fn get(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
        deadline: Duration,
    ) -> Result<ResourceState, OperationError> {
        let identity = Identity::new(gvk.clone(), namespace, name);
        identity.validate().map_err(OperationError::Invalid)?;

        let resource = ApiResource::from_gvk(gvk);
        let api = self.handle.dynamic_api(namespace, &resource);

        info!("Getting {} ...", identity);
        let timer = Timer::start(format!("get {identity}"));

        let object = within_deadline(deadline, async {
            api.get(name)
                .await
                .map_err(|e| classify(e, Verb::Get, &identity))
        })
        .await;

        timer.stop();
        let object = object?;
        info!("{} read successfully", identity);

        Ok(ResourceState::from_object(object, &identity))
    }

    /// Create the object, or return the one already present.
    ///
    /// An existing object is read back, never modified.
    pub async fn ensure(
        &self,
        descriptor: &ResourceDescriptor,
        deadline: Duration,
    ) -> Result<(ResourceState, Outcome), OperationError> {
        match self.create(descriptor, deadline).await {
            Ok(state) => Ok((state, Outcome::Created)),
            Err(OperationError::AlreadyExists(identity)) => {
                warn!("{} already exists, reading it back", identity);
                let state = self
                    .get(
                        identity.gvk(),
                        identity.namespace(),
                        identity.name(),
                        deadline,
                    )
                    .await?;
                Ok((state, Outcome::Existing))
            }
            Err(e) => Err(e),
        }
    }
}

fn build_object(descriptor: &ResourceDescriptor, resource: &ApiResource) -> DynamicObject {
    let identity = descriptor.identity();
    let mut object = DynamicObject::new(identity.name(), resource);

    object.metadata = descriptor.metadata().clone();
    object.metadata.name = Some(identity.name().to_string());
    object.metadata.namespace = Some(identity.namespace().to_string());
    if !descriptor.labels().is_empty() {
        object.metadata.labels = Some(descriptor.labels().clone());
    }

    object.data = match descriptor.payload() {
        Value::Null => Value::Object(Default::default()),
        payload => payload.clone(),
    };

    object
}

async fn within_deadline<T, F>(deadline: Duration, request: F) -> Result<T, OperationError>
where
    F: Future<Output = Result<T, OperationError>>,
{
    tokio::time::timeout(deadline, request)
        .await
        .map_err(|_| OperationError::DeadlineExceeded(deadline))?
}

/// Map a client error onto the operation taxonomy
fn classify(err: kube::Error, verb: Verb, identity: &Identity) -> OperationError {
    let response = match err {
        kube::Error::Api(response) => response,
        other => {
            debug!("Request for {} failed: {:?}", identity, other);
            return OperationError::Unavailable(other.to_string());
        }
    };

    match (response.code, response.reason.as_str(), verb) {
        (409, _, Verb::Create) | (_, "AlreadyExists", _) => {
            OperationError::AlreadyExists(identity.clone())
        }
        (404, _, Verb::Create) => OperationError::Invalid(format!(
            "cannot create {identity}: {}",
            response.message
        )),
        (404, _, Verb::Get) | (_, "NotFound", Verb::Get) => {
            OperationError::NotFound(identity.clone())
        }
        (400 | 422, _, _) | (_, "Invalid" | "BadRequest", _) => {
            OperationError::Invalid(response.message.clone())
        }
        (code, reason, _) => {
            OperationError::Unavailable(format!("{} ({code} {reason})", response.message))
        }
    }
}

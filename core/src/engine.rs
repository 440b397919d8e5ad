//! Runs `RequestSpec`s against a `Transport`.
//!
//! # Design
//! Like a stateless client, each call is split in two halves that never
//! touch the network: `build_request` / `build_write_request` produce an
//! `ApiRequest`, and `parse_response` turns an `HttpResponse` into an
//! `Outcome`. `execute` and `execute_write` glue the halves together around
//! `Transport::send`. The engine keeps no per-call state, so one instance
//! (and the shared specs it runs) can serve concurrent callers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adjust;
use crate::dates::apply_date_format;
use crate::error::{ApiError, ConfigError, RemoteError, ReturnEnvelope};
use crate::http::{ApiRequest, HttpResponse, Params, Transport, FULL_DETAILS_PARAM, JSON_PAYLOAD_PARAM};
use crate::path::build_path;
use crate::registry::{CollectionShape, Registry};
use crate::spec::{RequestSpec, ResponseShape};
use crate::types::ApiEntity;

/// A decoded collection response.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection<T> {
    List(Vec<T>),
    ListsByKey(BTreeMap<String, Vec<T>>),
    StringsByKey(BTreeMap<String, String>),
}

impl<T> Collection<T> {
    /// The items of a plain list; `None` for keyed collections.
    pub fn into_list(self) -> Option<Vec<T>> {
        match self {
            Collection::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::List(items) => items.len(),
            Collection::ListsByKey(groups) => groups.values().map(Vec::len).sum(),
            Collection::StringsByKey(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The result of a call, shaped by the spec's `ResponseShape`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Object(T),
    Collection(Collection<T>),
    Success(bool),
    Raw(String),
}

impl<T> Outcome<T> {
    pub fn shape(&self) -> ResponseShape {
        match self {
            Outcome::Object(_) => ResponseShape::Object,
            Outcome::Collection(_) => ResponseShape::Collection,
            Outcome::Success(_) => ResponseShape::Success,
            Outcome::Raw(_) => ResponseShape::Raw,
        }
    }

    pub fn into_object(self) -> Result<T, ApiError> {
        match self {
            Outcome::Object(value) => Ok(value),
            other => Err(other.mismatch(ResponseShape::Object)),
        }
    }

    pub fn into_collection(self) -> Result<Collection<T>, ApiError> {
        match self {
            Outcome::Collection(collection) => Ok(collection),
            other => Err(other.mismatch(ResponseShape::Collection)),
        }
    }

    pub fn into_list(self) -> Result<Vec<T>, ApiError> {
        self.into_collection()?.into_list().ok_or_else(|| {
            ApiError::Deserialization("collection is keyed by name, not a list".to_string())
        })
    }

    pub fn into_success(self) -> Result<bool, ApiError> {
        match self {
            Outcome::Success(ok) => Ok(ok),
            other => Err(other.mismatch(ResponseShape::Success)),
        }
    }

    pub fn into_raw(self) -> Result<String, ApiError> {
        match self {
            Outcome::Raw(text) => Ok(text),
            other => Err(other.mismatch(ResponseShape::Raw)),
        }
    }

    fn mismatch(&self, expected: ResponseShape) -> ApiError {
        ApiError::UnexpectedShape {
            expected,
            actual: self.shape(),
        }
    }
}

/// Executes request specs using a shared registry and a transport.
#[derive(Debug, Clone)]
pub struct RequestEngine<T> {
    registry: Arc<Registry>,
    transport: T,
}

impl<T> RequestEngine<T> {
    pub fn new(registry: Arc<Registry>, transport: T) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_request(
        &self,
        spec: &RequestSpec,
        object_id: Option<&str>,
        related_id: Option<&str>,
        mut params: Params,
    ) -> Result<ApiRequest, ApiError> {
        let path = build_path(spec, object_id, related_id)?;
        if spec.needs_full_details() && !params.iter().any(|(k, _)| k == FULL_DETAILS_PARAM) {
            params.push((FULL_DETAILS_PARAM.to_string(), "true".to_string()));
        }
        Ok(ApiRequest {
            method: spec.method(),
            path,
            params,
            encoding: spec.encoding(),
        })
    }

    pub fn build_write_request<E: ApiEntity>(
        &self,
        spec: &RequestSpec,
        object: &E,
        object_id: Option<&str>,
        related_id: Option<&str>,
    ) -> Result<ApiRequest, ApiError> {
        let payload = self.serialize_payload(spec, object)?;
        let params = vec![(JSON_PAYLOAD_PARAM.to_string(), payload)];
        self.build_request(spec, object_id, related_id, params)
    }

    /// Serialize `object` into the JSON text the spec's endpoint expects:
    /// date formatting, then the inclusion policy, then the adjustments.
    pub fn serialize_payload<E: ApiEntity>(
        &self,
        spec: &RequestSpec,
        object: &E,
    ) -> Result<String, ApiError> {
        let tree = self.payload_tree(spec, object)?;
        serde_json::to_string(&tree).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    pub fn payload_tree<E: ApiEntity>(
        &self,
        spec: &RequestSpec,
        object: &E,
    ) -> Result<Value, ApiError> {
        let tree = serde_json::to_value(object).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let tree = apply_date_format(tree, spec.date_format());
        let tree = match spec.inclusion() {
            Some(policy) => policy.apply(tree, E::ENTITY, &self.registry),
            None => tree,
        };
        Ok(adjust::apply_all(spec.adjustments(), tree))
    }

    pub fn parse_response<R: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
        response: HttpResponse,
    ) -> Result<Outcome<R>, ApiError> {
        if !response.is_success() {
            warn!(status = response.status, endpoint = spec.endpoint(), "platform call failed");
            return Err(RemoteError::http(response.status, response.body).into());
        }

        match spec.response_shape() {
            ResponseShape::Object => decode(&response.body).map(Outcome::Object),
            ResponseShape::Collection => {
                let result = spec.result_type().ok_or(ConfigError::MissingCollectionResult)?;
                let shape = self.registry.collection_for(result)?;
                decode_collection(shape, &response.body).map(Outcome::Collection)
            }
            ResponseShape::Success => Ok(Outcome::Success(decode_success(&response.body))),
            ResponseShape::Raw => Ok(Outcome::Raw(response.body)),
        }
    }
}

impl<T: Transport> RequestEngine<T> {
    pub fn execute<R: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
        object_id: Option<&str>,
        related_id: Option<&str>,
        params: Params,
    ) -> Result<Outcome<R>, ApiError> {
        let request = self.build_request(spec, object_id, related_id, params)?;
        self.dispatch(spec, &request)
    }

    pub fn execute_write<E: ApiEntity, R: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
        object: &E,
        object_id: Option<&str>,
        related_id: Option<&str>,
    ) -> Result<Outcome<R>, ApiError> {
        let request = self.build_write_request(spec, object, object_id, related_id)?;
        self.dispatch(spec, &request)
    }

    fn dispatch<R: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
        request: &ApiRequest,
    ) -> Result<Outcome<R>, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending platform request");
        let response = self.transport.send(request).map_err(|err| {
            warn!(path = %request.path, error = %err, "platform transport failed");
            ApiError::from(err)
        })?;
        debug!(status = response.status, path = %request.path, "received platform response");
        self.parse_response(spec, response)
    }
}

fn decode<R: DeserializeOwned>(body: &str) -> Result<R, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn decode_collection<R: DeserializeOwned>(
    shape: CollectionShape,
    body: &str,
) -> Result<Collection<R>, ApiError> {
    match shape {
        CollectionShape::List => decode(body).map(Collection::List),
        CollectionShape::ListsByKey => decode(body).map(Collection::ListsByKey),
        CollectionShape::StringsByKey => {
            let values: BTreeMap<String, Value> = decode(body)?;
            let values = values
                .into_iter()
                .map(|(name, value)| {
                    let text = match value {
                        Value::String(text) => text,
                        other => other.to_string(),
                    };
                    (name, text)
                })
                .collect();
            Ok(Collection::StringsByKey(values))
        }
    }
}

/// `true` only for a success envelope; anything else is `false`.
fn decode_success(body: &str) -> bool {
    match ReturnEnvelope::parse(body) {
        Some(envelope) => envelope.is_success(),
        None => {
            warn!(body, "success response without a return envelope");
            false
        }
    }
}

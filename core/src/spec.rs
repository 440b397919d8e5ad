//! Declarative descriptions of platform operations.
//!
//! # Design
//! A `RequestSpec` says everything the engine needs to run one operation:
//! method, encoding, path shape, expected response shape and the entity
//! types involved. Specs are immutable. They are usually built once at
//! startup (see `catalog`) and shared; a call that needs a variation derives
//! a new spec with one of the `with_*` methods instead of mutating the shared
//! one. All registry lookups happen while building, so a spec that exists is
//! known to resolve.

use crate::adjust::Adjustment;
use crate::dates::DateFormat;
use crate::error::ConfigError;
use crate::http::{ContentEncoding, HttpMethod};
use crate::inclusion::InclusionPolicy;
use crate::registry::{EntityType, Registry};

/// How the raw response of an operation is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Object,
    Collection,
    /// A `returnCode` envelope decoded to `true`/`false`.
    Success,
    /// The response text, unparsed.
    Raw,
}

/// The closed set of operation patterns the platform's API follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// `GET entity/{id}`
    GetEntity,
    /// `GET entity/{id}?fullDetails=true`
    GetEntityWithDetails,
    /// `GET entity`
    GetList,
    /// `GET entity?fullDetails=true`
    GetListWithDetails,
    /// `GET entity/{id}/related/{relatedId}`
    GetOwnedEntity,
    /// `GET entity/{id}/related`
    GetOwnedEntities,
    /// `GET entity/{id}/related`, the related entities existing on their own.
    GetRelatedEntities,
    /// `POST entity` with a JSON body.
    CreateJson,
    /// `POST entity` with form parameters.
    CreateForm,
    /// `POST entity/{id}/related` with a JSON body.
    CreateOwnedEntity,
    /// `POST entity/{id}` with a JSON body.
    UpdateJson,
    /// `PATCH entity/{id}` with a JSON body.
    PatchEntity,
    /// `PATCH entity/{id}/related/{relatedId}` with a JSON body.
    PatchOwnedEntity,
    /// `DELETE entity/{id}`
    DeleteEntity,
    /// `DELETE entity/{id}/related/{relatedId}`
    DeleteOwnedEntity,
    /// `POST entity/{id}/related` with form parameters (transactions, state changes).
    PostEntityAction,
}

impl OperationKind {
    pub fn method(self) -> HttpMethod {
        use OperationKind::*;
        match self {
            GetEntity | GetEntityWithDetails | GetList | GetListWithDetails | GetOwnedEntity
            | GetOwnedEntities | GetRelatedEntities => HttpMethod::Get,
            CreateJson | CreateForm | CreateOwnedEntity | UpdateJson | PostEntityAction => {
                HttpMethod::Post
            }
            PatchEntity | PatchOwnedEntity => HttpMethod::Patch,
            DeleteEntity | DeleteOwnedEntity => HttpMethod::Delete,
        }
    }

    pub fn encoding(self) -> ContentEncoding {
        use OperationKind::*;
        match self {
            CreateJson | CreateOwnedEntity | UpdateJson | PatchEntity | PatchOwnedEntity => {
                ContentEncoding::Json
            }
            _ => ContentEncoding::Form,
        }
    }

    pub fn needs_object_id(self) -> bool {
        use OperationKind::*;
        !matches!(
            self,
            GetList | GetListWithDetails | CreateJson | CreateForm
        )
    }

    pub fn needs_full_details(self) -> bool {
        matches!(
            self,
            OperationKind::GetEntityWithDetails | OperationKind::GetListWithDetails
        )
    }

    pub fn response_shape(self) -> ResponseShape {
        use OperationKind::*;
        match self {
            GetList | GetListWithDetails | GetOwnedEntities | GetRelatedEntities => {
                ResponseShape::Collection
            }
            PatchEntity | PatchOwnedEntity | DeleteEntity | DeleteOwnedEntity => {
                ResponseShape::Success
            }
            _ => ResponseShape::Object,
        }
    }

    /// Operations whose path includes a related-entity segment, and which
    /// therefore need a result type distinct from the entity.
    pub fn needs_related_entity(self) -> bool {
        use OperationKind::*;
        matches!(
            self,
            GetOwnedEntity
                | GetOwnedEntities
                | GetRelatedEntities
                | CreateOwnedEntity
                | PatchOwnedEntity
                | DeleteOwnedEntity
                | PostEntityAction
        )
    }
}

/// Where the first path segment(s) of a spec come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSource {
    Registered(EntityType),
    Literal,
}

/// Immutable descriptor of one platform operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: HttpMethod,
    encoding: ContentEncoding,
    endpoint: String,
    source: EndpointSource,
    needs_object_id: bool,
    needs_full_details: bool,
    related_segment: Option<String>,
    entity: Option<EntityType>,
    result_type: Option<EntityType>,
    response_shape: ResponseShape,
    date_format: DateFormat,
    inclusion: Option<InclusionPolicy>,
    adjustments: Vec<Adjustment>,
}

impl RequestSpec {
    /// Start a spec from an operation kind on `entity`.
    pub fn builder(kind: OperationKind, entity: EntityType) -> RequestSpecBuilder {
        RequestSpecBuilder {
            kind: Some(kind),
            entity: Some(entity),
            ..RequestSpecBuilder::default()
        }
    }

    /// Start a spec for an endpoint outside the operation kinds.
    pub fn custom(path: impl Into<String>, method: HttpMethod) -> RequestSpecBuilder {
        RequestSpecBuilder {
            path: Some(path.into()),
            method: Some(method),
            ..RequestSpecBuilder::default()
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn encoding(&self) -> ContentEncoding {
        self.encoding
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn endpoint_source(&self) -> &EndpointSource {
        &self.source
    }

    pub fn needs_object_id(&self) -> bool {
        self.needs_object_id
    }

    pub fn needs_full_details(&self) -> bool {
        self.needs_full_details
    }

    pub fn related_segment(&self) -> Option<&str> {
        self.related_segment.as_deref()
    }

    pub fn entity(&self) -> Option<EntityType> {
        self.entity
    }

    pub fn result_type(&self) -> Option<EntityType> {
        self.result_type
    }

    pub fn response_shape(&self) -> ResponseShape {
        self.response_shape
    }

    pub fn date_format(&self) -> DateFormat {
        self.date_format
    }

    pub fn inclusion(&self) -> Option<&InclusionPolicy> {
        self.inclusion.as_ref()
    }

    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }

    /// Derive a spec decoding responses as `shape`.
    ///
    /// Switching to `Collection` re-checks that the result type has a
    /// registered collection shape.
    pub fn with_response_shape(
        &self,
        shape: ResponseShape,
        registry: &Registry,
    ) -> Result<Self, ConfigError> {
        let mut derived = self.clone();
        derived.response_shape = shape;
        derived.check_collection(registry)?;
        Ok(derived)
    }

    /// Derive a spec whose endpoint is the literal `path`.
    pub fn with_path(&self, path: impl Into<String>) -> Result<Self, ConfigError> {
        let path = normalize(&path.into());
        if path.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        let mut derived = self.clone();
        derived.endpoint = path;
        derived.source = EndpointSource::Literal;
        Ok(derived)
    }

    /// Derive a spec with `suffix` appended to the endpoint.
    pub fn with_path_suffix(&self, suffix: &str) -> Self {
        let mut derived = self.clone();
        let suffix = normalize(suffix);
        if !suffix.is_empty() {
            derived.endpoint = format!("{}/{suffix}", derived.endpoint);
            derived.source = EndpointSource::Literal;
        }
        derived
    }

    pub fn with_encoding(&self, encoding: ContentEncoding) -> Self {
        let mut derived = self.clone();
        derived.encoding = encoding;
        derived
    }

    pub fn with_date_format(&self, format: DateFormat) -> Self {
        let mut derived = self.clone();
        derived.date_format = format;
        derived
    }

    pub fn with_inclusion(&self, policy: InclusionPolicy) -> Self {
        let mut derived = self.clone();
        derived.inclusion = Some(policy);
        derived
    }

    pub fn with_adjustments(&self, adjustments: Vec<Adjustment>) -> Self {
        let mut derived = self.clone();
        derived.adjustments = adjustments;
        derived
    }

    fn check_collection(&self, registry: &Registry) -> Result<(), ConfigError> {
        if self.response_shape == ResponseShape::Collection {
            let result = self
                .result_type
                .ok_or(ConfigError::MissingCollectionResult)?;
            registry.collection_for(result)?;
        }
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Collects the parts of a `RequestSpec` and validates them against a registry.
#[derive(Debug, Clone, Default)]
pub struct RequestSpecBuilder {
    kind: Option<OperationKind>,
    entity: Option<EntityType>,
    path: Option<String>,
    method: Option<HttpMethod>,
    encoding: Option<ContentEncoding>,
    result_type: Option<EntityType>,
    related_segment: Option<String>,
    response_shape: Option<ResponseShape>,
    date_format: DateFormat,
    inclusion: Option<InclusionPolicy>,
    adjustments: Vec<Adjustment>,
}

impl RequestSpecBuilder {
    pub fn result(mut self, result: EntityType) -> Self {
        self.result_type = Some(result);
        self
    }

    /// Related-entity segment to use instead of the one derived from the
    /// result type.
    pub fn related_segment(mut self, segment: impl Into<String>) -> Self {
        self.related_segment = Some(segment.into());
        self
    }

    pub fn encoding(mut self, encoding: ContentEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn response(mut self, shape: ResponseShape) -> Self {
        self.response_shape = Some(shape);
        self
    }

    pub fn date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    pub fn inclusion(mut self, policy: InclusionPolicy) -> Self {
        self.inclusion = Some(policy);
        self
    }

    pub fn adjust(mut self, adjustment: Adjustment) -> Self {
        self.adjustments.push(adjustment);
        self
    }

    pub fn build(self, registry: &Registry) -> Result<RequestSpec, ConfigError> {
        let spec = match (self.kind, self.entity) {
            (Some(kind), Some(entity)) => self.build_for_kind(kind, entity, registry)?,
            _ => self.build_custom(registry)?,
        };
        spec.check_collection(registry)?;
        Ok(spec)
    }

    fn build_for_kind(
        &self,
        kind: OperationKind,
        entity: EntityType,
        registry: &Registry,
    ) -> Result<RequestSpec, ConfigError> {
        let endpoint = registry.endpoint_for(entity)?.to_string();

        let related_segment = if kind.needs_related_entity() {
            let result = self
                .result_type
                .ok_or(ConfigError::MissingResultType { kind, entity })?;
            let derived = registry.descriptor(result)?.relation_segment().to_string();
            Some(self.related_segment.clone().map(|s| normalize(&s)).unwrap_or(derived))
        } else {
            self.related_segment.clone().map(|s| normalize(&s))
        };

        if let Some(result) = self.result_type {
            registry.descriptor(result)?;
        }

        Ok(RequestSpec {
            method: kind.method(),
            encoding: self.encoding.unwrap_or(kind.encoding()),
            endpoint,
            source: EndpointSource::Registered(entity),
            needs_object_id: kind.needs_object_id(),
            needs_full_details: kind.needs_full_details(),
            related_segment,
            entity: Some(entity),
            result_type: Some(self.result_type.unwrap_or(entity)),
            response_shape: self.response_shape.unwrap_or(kind.response_shape()),
            date_format: self.date_format,
            inclusion: self.inclusion.clone(),
            adjustments: self.adjustments.clone(),
        })
    }

    fn build_custom(&self, registry: &Registry) -> Result<RequestSpec, ConfigError> {
        let path = self
            .path
            .as_deref()
            .map(normalize)
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;
        if let Some(result) = self.result_type {
            registry.descriptor(result)?;
        }
        Ok(RequestSpec {
            method: self.method.unwrap_or(HttpMethod::Get),
            encoding: self.encoding.unwrap_or(ContentEncoding::Form),
            endpoint: path,
            source: EndpointSource::Literal,
            needs_object_id: false,
            needs_full_details: false,
            related_segment: self.related_segment.clone().map(|s| normalize(&s)),
            entity: None,
            result_type: self.result_type,
            response_shape: self.response_shape.unwrap_or(ResponseShape::Object),
            date_format: self.date_format,
            inclusion: self.inclusion.clone(),
            adjustments: self.adjustments.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::standard().unwrap()
    }

    #[test]
    fn get_entity_derives_shape_from_kind() {
        let spec = RequestSpec::builder(OperationKind::GetEntity, EntityType::CLIENT)
            .build(&registry())
            .unwrap();
        assert_eq!(spec.method(), HttpMethod::Get);
        assert_eq!(spec.encoding(), ContentEncoding::Form);
        assert_eq!(spec.endpoint(), "clients");
        assert!(spec.needs_object_id());
        assert!(!spec.needs_full_details());
        assert_eq!(spec.response_shape(), ResponseShape::Object);
        assert_eq!(spec.result_type(), Some(EntityType::CLIENT));
        assert_eq!(spec.related_segment(), None);
    }

    #[test]
    fn details_kind_sets_full_details() {
        let spec = RequestSpec::builder(OperationKind::GetEntityWithDetails, EntityType::LOAN_ACCOUNT)
            .build(&registry())
            .unwrap();
        assert!(spec.needs_full_details());
        assert_eq!(spec.endpoint(), "loans");
    }

    #[test]
    fn patch_is_json_with_success_response() {
        let spec = RequestSpec::builder(OperationKind::PatchEntity, EntityType::CLIENT)
            .build(&registry())
            .unwrap();
        assert_eq!(spec.method(), HttpMethod::Patch);
        assert_eq!(spec.encoding(), ContentEncoding::Json);
        assert_eq!(spec.response_shape(), ResponseShape::Success);
    }

    #[test]
    fn owned_entities_derive_related_segment_from_result() {
        let spec = RequestSpec::builder(OperationKind::GetOwnedEntities, EntityType::LOAN_ACCOUNT)
            .result(EntityType::LOAN_TRANSACTION)
            .build(&registry())
            .unwrap();
        assert_eq!(spec.related_segment(), Some("transactions"));
        assert_eq!(spec.response_shape(), ResponseShape::Collection);
        assert_eq!(spec.result_type(), Some(EntityType::LOAN_TRANSACTION));
    }

    #[test]
    fn explicit_related_segment_wins() {
        let spec = RequestSpec::builder(OperationKind::PatchOwnedEntity, EntityType::CLIENT)
            .result(EntityType::CUSTOM_FIELD_VALUE)
            .related_segment("/customfields/")
            .build(&registry())
            .unwrap();
        assert_eq!(spec.related_segment(), Some("customfields"));
    }

    #[test]
    fn missing_result_type_is_rejected() {
        let err = RequestSpec::builder(OperationKind::GetOwnedEntities, EntityType::CLIENT)
            .build(&registry())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingResultType {
                kind: OperationKind::GetOwnedEntities,
                entity: EntityType::CLIENT,
            }
        );
    }

    #[test]
    fn unregistered_entity_fails_at_build_time() {
        let unknown = EntityType::new("Hologram");
        let err = RequestSpec::builder(OperationKind::GetEntity, unknown)
            .build(&registry())
            .unwrap_err();
        assert_eq!(err, ConfigError::UnregisteredEntity(unknown));
    }

    #[test]
    fn collection_without_registered_shape_fails_at_build_time() {
        let err = RequestSpec::builder(OperationKind::GetList, EntityType::GENERAL_SETTINGS)
            .build(&registry())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCollectionShape(EntityType::GENERAL_SETTINGS)
        );
    }

    #[test]
    fn custom_spec_needs_a_path() {
        let err = RequestSpec::custom("/", HttpMethod::Get)
            .build(&registry())
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingEndpoint);
    }

    #[test]
    fn custom_spec_uses_literal_path() {
        let spec = RequestSpec::custom("/settings/general/", HttpMethod::Get)
            .response(ResponseShape::Raw)
            .build(&registry())
            .unwrap();
        assert_eq!(spec.endpoint(), "settings/general");
        assert_eq!(spec.endpoint_source(), &EndpointSource::Literal);
        assert!(!spec.needs_object_id());
        assert_eq!(spec.response_shape(), ResponseShape::Raw);
    }

    #[test]
    fn custom_collection_requires_result_type_with_shape() {
        let registry = registry();
        assert_eq!(
            RequestSpec::custom("indicators", HttpMethod::Get)
                .response(ResponseShape::Collection)
                .build(&registry)
                .unwrap_err(),
            ConfigError::MissingCollectionResult
        );
        let spec = RequestSpec::custom("indicators", HttpMethod::Get)
            .result(EntityType::INDICATOR)
            .response(ResponseShape::Collection)
            .build(&registry)
            .unwrap();
        assert_eq!(spec.result_type(), Some(EntityType::INDICATOR));
    }

    #[test]
    fn derivation_leaves_shared_spec_untouched() {
        let registry = registry();
        let shared = RequestSpec::builder(OperationKind::GetEntity, EntityType::CLIENT)
            .build(&registry)
            .unwrap();
        let raw = shared
            .with_response_shape(ResponseShape::Raw, &registry)
            .unwrap();
        let suffixed = shared.with_path_suffix("custominformation");
        assert_eq!(shared.response_shape(), ResponseShape::Object);
        assert_eq!(shared.endpoint(), "clients");
        assert_eq!(raw.response_shape(), ResponseShape::Raw);
        assert_eq!(suffixed.endpoint(), "clients/custominformation");
    }

    #[test]
    fn derived_collection_is_revalidated() {
        let registry = registry();
        let spec = RequestSpec::custom("settings/general", HttpMethod::Get)
            .result(EntityType::GENERAL_SETTINGS)
            .build(&registry)
            .unwrap();
        assert!(spec
            .with_response_shape(ResponseShape::Collection, &registry)
            .is_err());
    }

    #[test]
    fn with_path_switches_to_literal_source() {
        let spec = RequestSpec::builder(OperationKind::GetList, EntityType::CLIENT)
            .build(&registry())
            .unwrap();
        let derived = spec.with_path("groups/G1/members").unwrap();
        assert_eq!(derived.endpoint(), "groups/G1/members");
        assert_eq!(derived.endpoint_source(), &EndpointSource::Literal);
        assert!(spec.with_path("").is_err());
        assert_eq!(
            spec.endpoint_source(),
            &EndpointSource::Registered(EntityType::CLIENT)
        );
    }
}

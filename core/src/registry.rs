//! Endpoint registry and collection type table.
//!
//! # Design
//! Entity types are plain tagged values (`EntityType`), not Rust types looked
//! up at runtime. A `RegistryBuilder` collects one `EntityDescriptor` per tag
//! at startup and freezes into an immutable `Registry`, which is then shared
//! behind an `Arc` and read without locks.
//!
//! Besides the endpoint path and optional collection shape, a descriptor lists
//! the fields of that entity which embed other entities. The inclusion policy
//! uses this to know the declaring type of every nested object it walks.

use std::collections::HashMap;
use std::fmt;

use crate::error::ConfigError;

/// Tag identifying a logical resource kind of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityType(&'static str);

impl EntityType {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }

    pub const CLIENT: Self = Self::new("Client");
    pub const ADDRESS: Self = Self::new("Address");
    pub const GROUP: Self = Self::new("Group");
    pub const LOAN_ACCOUNT: Self = Self::new("LoanAccount");
    pub const DISBURSEMENT_DETAILS: Self = Self::new("DisbursementDetails");
    pub const LOAN_TRANSACTION: Self = Self::new("LoanTransaction");
    pub const SAVINGS_ACCOUNT: Self = Self::new("SavingsAccount");
    pub const SAVINGS_TRANSACTION: Self = Self::new("SavingsTransaction");
    pub const REPAYMENT: Self = Self::new("Repayment");
    pub const LOAN_PRODUCT: Self = Self::new("LoanProduct");
    pub const SAVINGS_PRODUCT: Self = Self::new("SavingsProduct");
    pub const COMMENT: Self = Self::new("Comment");
    pub const DOCUMENT: Self = Self::new("Document");
    pub const TASK: Self = Self::new("Task");
    pub const USER: Self = Self::new("User");
    pub const ROLE: Self = Self::new("Role");
    pub const BRANCH: Self = Self::new("Branch");
    pub const CENTRE: Self = Self::new("Centre");
    pub const CUSTOM_FIELD_VALUE: Self = Self::new("CustomFieldValue");
    pub const CURRENCY: Self = Self::new("Currency");
    pub const SEARCH_RESULT: Self = Self::new("SearchResult");
    pub const INDICATOR: Self = Self::new("Indicator");
    pub const GENERAL_SETTINGS: Self = Self::new("GeneralSettings");
    pub const ORGANIZATION: Self = Self::new("Organization");
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// How a collection response for a type must be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionShape {
    /// A JSON array of the type.
    List,
    /// An object mapping a category name to an array of the type (search).
    ListsByKey,
    /// An object mapping a name to a string value (indicators).
    StringsByKey,
}

/// Everything the engine knows about one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub endpoint: String,
    pub collection: Option<CollectionShape>,
    pub nested: Vec<(String, EntityType)>,
}

impl EntityDescriptor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            collection: None,
            nested: Vec::new(),
        }
    }

    pub fn collection(mut self, shape: CollectionShape) -> Self {
        self.collection = Some(shape);
        self
    }

    pub fn list(self) -> Self {
        self.collection(CollectionShape::List)
    }

    /// Declare that `field` holds an object (or array of objects) of `entity`.
    pub fn nested(mut self, field: impl Into<String>, entity: EntityType) -> Self {
        self.nested.push((field.into(), entity));
        self
    }

    /// Final path segment of the endpoint, used as a related-entity segment.
    pub fn relation_segment(&self) -> &str {
        self.endpoint.rsplit('/').next().unwrap_or(&self.endpoint)
    }
}

/// Append-only collector for entity registrations.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: HashMap<EntityType, EntityDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity`. Registering the same tag twice, or an empty
    /// endpoint, is a configuration error.
    pub fn register(
        mut self,
        entity: EntityType,
        descriptor: EntityDescriptor,
    ) -> Result<Self, ConfigError> {
        let endpoint = descriptor.endpoint.trim_matches('/');
        if endpoint.is_empty() {
            return Err(ConfigError::InvalidRegistration {
                entity,
                reason: "endpoint is empty".to_string(),
            });
        }
        if self.entries.contains_key(&entity) {
            return Err(ConfigError::InvalidRegistration {
                entity,
                reason: "already registered".to_string(),
            });
        }
        let descriptor = EntityDescriptor {
            endpoint: endpoint.to_string(),
            ..descriptor
        };
        self.entries.insert(entity, descriptor);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

/// Immutable map from entity tag to its descriptor.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: HashMap<EntityType, EntityDescriptor>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The platform's standard entity set.
    pub fn standard() -> Result<Self, ConfigError> {
        use EntityType as E;

        let builder = Self::builder()
            .register(
                E::CLIENT,
                EntityDescriptor::new("clients")
                    .list()
                    .nested("addresses", E::ADDRESS),
            )?
            .register(E::ADDRESS, EntityDescriptor::new("addresses").list())?
            .register(E::GROUP, EntityDescriptor::new("groups").list())?
            .register(
                E::LOAN_ACCOUNT,
                EntityDescriptor::new("loans")
                    .list()
                    .nested("disbursementDetails", E::DISBURSEMENT_DETAILS),
            )?
            .register(
                E::DISBURSEMENT_DETAILS,
                EntityDescriptor::new("disbursementdetails"),
            )?
            .register(
                E::LOAN_TRANSACTION,
                EntityDescriptor::new("loans/transactions").list(),
            )?
            .register(E::SAVINGS_ACCOUNT, EntityDescriptor::new("savings").list())?
            .register(
                E::SAVINGS_TRANSACTION,
                EntityDescriptor::new("savings/transactions").list(),
            )?
            .register(E::REPAYMENT, EntityDescriptor::new("repayments").list())?
            .register(E::LOAN_PRODUCT, EntityDescriptor::new("loanproducts").list())?
            .register(
                E::SAVINGS_PRODUCT,
                EntityDescriptor::new("savingsproducts").list(),
            )?
            .register(E::COMMENT, EntityDescriptor::new("comments").list())?
            .register(E::DOCUMENT, EntityDescriptor::new("documents").list())?
            .register(E::TASK, EntityDescriptor::new("tasks").list())?
            .register(
                E::USER,
                EntityDescriptor::new("users").list().nested("role", E::ROLE),
            )?
            .register(E::ROLE, EntityDescriptor::new("userroles").list())?
            .register(E::BRANCH, EntityDescriptor::new("branches").list())?
            .register(E::CENTRE, EntityDescriptor::new("centres").list())?
            .register(
                E::CUSTOM_FIELD_VALUE,
                EntityDescriptor::new("custominformation").list(),
            )?
            .register(E::CURRENCY, EntityDescriptor::new("currencies").list())?
            .register(
                E::SEARCH_RESULT,
                EntityDescriptor::new("search").collection(CollectionShape::ListsByKey),
            )?
            .register(
                E::INDICATOR,
                EntityDescriptor::new("indicators").collection(CollectionShape::StringsByKey),
            )?
            .register(E::GENERAL_SETTINGS, EntityDescriptor::new("settings/general"))?
            .register(
                E::ORGANIZATION,
                EntityDescriptor::new("settings/organization"),
            )?;
        Ok(builder.build())
    }

    pub fn descriptor(&self, entity: EntityType) -> Result<&EntityDescriptor, ConfigError> {
        self.entries
            .get(&entity)
            .ok_or(ConfigError::UnregisteredEntity(entity))
    }

    pub fn endpoint_for(&self, entity: EntityType) -> Result<&str, ConfigError> {
        self.descriptor(entity).map(|d| d.endpoint.as_str())
    }

    pub fn collection_for(&self, entity: EntityType) -> Result<CollectionShape, ConfigError> {
        self.descriptor(entity)?
            .collection
            .ok_or(ConfigError::MissingCollectionShape(entity))
    }

    /// Entity type embedded under `field` of `entity`, if any.
    pub fn nested_type(&self, entity: EntityType, field: &str) -> Option<EntityType> {
        self.entries.get(&entity).and_then(|d| {
            d.nested
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, nested)| *nested)
        })
    }

    pub fn contains(&self, entity: EntityType) -> bool {
        self.entries.contains_key(&entity)
    }
}

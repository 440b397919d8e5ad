//! Declarative request engine for a financial platform's REST API.
//!
//! # Overview
//! Operations are described by immutable `RequestSpec`s: method, encoding,
//! path shape and response shape, derived from an `OperationKind` and the
//! entity types involved, or given explicitly for odd endpoints. The
//! `RequestEngine` turns a spec plus identifiers (and, for writes, a domain
//! object) into an `ApiRequest`, hands it to a `Transport`, and decodes the
//! reply into an `Outcome`.
//!
//! # Design
//! - `Registry` maps `EntityType` tags to endpoints, collection shapes and
//!   nested entity fields. It is built once and shared behind an `Arc`.
//! - Write payloads go through date formatting, an `InclusionPolicy`
//!   (allow-listed fields per entity type) and a list of `Adjustment`s that
//!   fix up the JSON shape an endpoint expects.
//! - Building requests and parsing responses never touch the network; the
//!   `Transport` trait is the only I/O seam (`UreqTransport` is the stock
//!   implementation).
//! - `ApiCatalog` holds ready-made specs for common operations.

pub mod adjust;
pub mod catalog;
pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod http;
pub mod inclusion;
pub mod paging;
pub mod path;
pub mod registry;
pub mod spec;
pub mod transport;
pub mod types;

pub use adjust::Adjustment;
pub use catalog::ApiCatalog;
pub use config::ClientConfig;
pub use dates::DateFormat;
pub use engine::{Collection, Outcome, RequestEngine};
pub use error::{ApiError, ConfigError, RemoteError, ReturnEnvelope, TransportError};
pub use http::{ApiRequest, ContentEncoding, HttpMethod, HttpRequest, HttpResponse, Params, Transport};
pub use inclusion::InclusionPolicy;
pub use paging::Pagination;
pub use path::build_path;
pub use registry::{CollectionShape, EntityDescriptor, EntityType, Registry, RegistryBuilder};
pub use spec::{OperationKind, RequestSpec, RequestSpecBuilder, ResponseShape};
pub use transport::UreqTransport;
pub use types::{
    Address, ApiEntity, Client, Comment, DisbursementDetails, LoanAccount, LoanTransaction, Role,
    SearchResult, Task, User,
};

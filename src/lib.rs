//! # estate
//!
//! REST backend for property listings, team profiles, contact enquiries,
//! investor accounts, blog posts and generated investment annexures.
//!
//! ## Features
//!
//! - **Entity stores**: one async [`EntityStore`](core::store::EntityStore)
//!   contract with in-memory and MongoDB (`mongodb_backend`) implementations
//! - **Query builder**: query-string parameters turned into typed filter
//!   predicates, in lenient or strict mode
//! - **Pagination**: counted pages with `total`, `page`, `limit`, `totalPages`
//! - **Documents**: annexure PDFs rendered from a `tera` template
//! - **Compensating cleanup**: file removals tied to the outcome of a write
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use estate::prelude::*;
//!
//! let config = AppConfig::load(None)?;
//! ServerBuilder::new()
//!     .with_config(config)
//!     .with_stores(EntityStores::in_memory())
//!     .serve("127.0.0.1:5000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    pub use crate::config::{AppConfig, StorageBackend};

    pub use crate::core::{
        Cleanup, DocumentGenerator, DocumentRenderer, DocumentTemplate, Entity, EntityStore,
        FieldValue, FileStore, FilterParseMode, FilterSpec, PageRequest, PageResult, Paginator,
        Predicate, QueryBuilder, SortOrder, TextPdfRenderer,
        error::{EntityError, EstateError, EstateResult, RenderError, StorageError, ValidationError},
        validation::{Payload, Validated},
    };

    pub use crate::entities::{
        Annexure, AnnexureRequest, Blog, ContactQuery, Property, PropertyStatus, PropertyType,
        QueryStatus, Role, TeamMember, User,
    };

    pub use crate::impl_entity;

    pub use crate::server::{RestExposure, ServerBuilder, ServerHost};

    pub use crate::storage::{EntityStores, InMemoryFileStore, InMemoryStore, LocalFileStore};

    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;
}

//! Core contracts: records, filters, pagination, collaborators and errors

pub mod cleanup;
pub mod document;
pub mod entity;
pub mod error;
pub mod field;
pub mod files;
pub mod filter;
pub mod generator;
pub mod pdf;
pub mod query;
pub mod store;
pub mod validation;

pub use cleanup::{Cleanup, CleanupReport};
pub use document::{ANNEXURE_TEMPLATE, DocumentRenderer, DocumentTemplate, TextPdfRenderer};
pub use entity::Entity;
pub use error::{EstateError, EstateResult};
pub use field::{FieldFormat, FieldValue};
pub use files::FileStore;
pub use filter::{FilterParseMode, FilterSpec, ParamRule, ParamSpec, Predicate, QueryBuilder};
pub use generator::{DocumentGenerator, GeneratedDocument};
pub use query::{PageRequest, PageResult, PaginationMeta, Paginator, SortOrder};
pub use store::EntityStore;

//! Record types served by the API
//!
//! Each module defines the stored record, the validated create payload,
//! the partial-update payload and, for listed entities, the filter schema.

#[macro_use]
pub mod macros;

pub mod annexure;
pub mod blog;
pub mod contact_query;
pub mod property;
pub mod team_member;
pub mod user;

pub use annexure::{Annexure, AnnexureRequest};
pub use blog::Blog;
pub use contact_query::{ContactQuery, QueryStatus};
pub use property::{Property, PropertyStatus, PropertyType};
pub use team_member::TeamMember;
pub use user::{Role, User};

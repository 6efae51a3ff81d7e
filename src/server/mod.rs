//! HTTP server: builder, shared host state and the REST exposure

pub mod builder;
pub mod exposure;
pub mod host;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use host::{Params, ServerHost};

//! Transport exposures built on top of [`ServerHost`](super::host::ServerHost)

pub mod rest;

pub use rest::RestExposure;

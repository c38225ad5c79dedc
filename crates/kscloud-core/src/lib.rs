//! Shared building blocks for the kscloud SDK.
//!
//! This crate holds the pieces every backend client needs but that carry no
//! state of their own:
//!
//! - [`endpoint`]: turning a configured host or URL into a scheme/host pair
//! - [`routes`]: the system report route and request headers
//! - [`annotations`]: resource annotation keys used to hand a job over
//!   between components

pub mod annotations;
pub mod endpoint;
mod error;
pub mod routes;

pub use endpoint::{Endpoint, Scheme, parse_host, resolve_path};
pub use error::{CoreError, Result};

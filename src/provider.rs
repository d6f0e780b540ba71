//! Token-issuer descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes the validated endpoint set, audience, and client authentication
//! preference. `strategy` defines [`ProviderStrategy`], the hook used by the token flow to
//! decorate outgoing requests and map error responses into the crate taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;

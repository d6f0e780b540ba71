//! Token models and unverified JWT claim decoding.

pub mod claims;
pub mod token;

pub use claims::*;
pub use token::{record::*, secret::*};

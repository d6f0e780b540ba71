//! Access-token secret wrapper and cached token records.

pub mod record;
pub mod secret;

//! Database query modules.
//!
//! - `videos`: indexed video CRUD and scan support
//! - `bindings`: episode binding inserts and lookups

pub mod bindings;
pub mod videos;

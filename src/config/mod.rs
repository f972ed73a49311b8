//! Configuration documents: data structures and loading
//!
//! - [`document`]: the document tree and typed views over its sections
//! - [`loader`]: JSON loading, defaulting, include resolution

pub mod document;
pub mod loader;

pub use document::{ConfigDocument, Setting, UpstreamSpec, UserProperty};
pub use loader::load;

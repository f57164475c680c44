//! Indentation-based layout notation and the builder that turns it into a
//! widget tree

mod builder;
mod error;
pub mod notation;

pub use builder::LayoutBuilder;
pub use error::LayoutError;

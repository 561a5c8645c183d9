//! Data model.
//!
//! Library-side types (items, attachments, collections) and the document
//! intermediate representation that renderers serialize.

mod collection;
mod document;
mod item;
mod paragraph;
mod style;

pub use collection::*;
pub use document::*;
pub use item::*;
pub use paragraph::*;
pub use style::*;

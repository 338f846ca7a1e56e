//! Media module for descriptor representation and MIME helpers.

pub mod item;
pub mod mime;

pub use item::{MediaDescriptor, MediaKind};
pub use mime::{extension_from_mime, extension_from_url};

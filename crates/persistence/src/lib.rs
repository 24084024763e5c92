//! Host-side NVM backends and images for ember-kernel.

pub mod error;
pub mod image;
pub mod mapped;

pub use error::{PersistenceError, Result};
pub use image::{load_image, read_header, restore_into, save_image, ImageHeader};
pub use mapped::MappedStore;

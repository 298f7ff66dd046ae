//! rollcall-core — People gallery behind a biometric lock.
//!
//! Holds the person list and its locked/unlocked projection, the on-disk
//! photo store, and the authenticator contract the daemon plugs a
//! biometric backend into.

pub mod auth;
pub mod error;
pub mod gallery;
pub mod photo;
pub mod types;

pub use auth::{Authenticator, DEFAULT_REASON};
pub use error::GalleryError;
pub use gallery::Gallery;
pub use photo::{PhotoStore, DEFAULT_JPEG_QUALITY};
pub use types::{Person, DEFAULT_NAME};

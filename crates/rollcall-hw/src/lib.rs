//! rollcall-hw — Camera capture for the "take a photo" image source.
//!
//! Opens a V4L2 device, skips dark warmup frames and hands back an RGB
//! frame ready to be stored as a person photo.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
pub use frame::{Frame, FrameError};

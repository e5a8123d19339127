//! warden-hw: Camera capture and the audible alarm.
//!
//! [`camera::CameraStream`] is the V4L2 [`warden_core::FrameSource`];
//! [`alarm::Bell`] is the terminal-bell [`warden_core::Alarm`].

pub mod alarm;
pub mod camera;
pub mod frame;

pub use alarm::Bell;
pub use camera::{Camera, CameraError, CameraStream, DeviceInfo, PixelFormat};
pub use frame::FrameError;

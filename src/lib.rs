//! shutter library crate.
//!
//! A permission-gated camera capture screen: live preview binding, single
//! shot capture into a timestamped JPEG and clean teardown.

pub mod camera;
pub mod clock;
pub mod config;
pub mod permissions;
pub mod session;

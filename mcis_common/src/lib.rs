//! MCIS Common Library
//!
//! Shared fixed-size vector/matrix math, discrete filter building blocks,
//! wire format layouts and error types used by both the real-time MCIS
//! service and the offline replay tool.
//!
//! # Module Structure
//!
//! - [`vector`] - Fixed-3 vector algebra
//! - [`matrix`] - Fixed 3x3 matrix algebra and DCM generation
//! - [`filters`] - Biquad section, saturation, rate limiters
//! - [`wire`] - MB command/reply packet layouts and simulator telemetry offsets
//! - [`fault`] - Latched MB fault bitflags
//! - [`consts`] - System-wide numeric constants

pub mod consts;
pub mod fault;
pub mod filters;
pub mod matrix;
pub mod vector;
pub mod wire;

pub use matrix::Matrix3;
pub use vector::Vector3;

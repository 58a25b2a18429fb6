//! Core WebXR bridge transport: buffer layouts, decoders, and coordinate
//! conversion.
//!
//! This crate provides:
//! - Fixed float-offset layouts for the headset, controller, hand, and
//!   hit-test transport buffers
//! - Producer-side writers and consumer-side decoders over those layouts
//! - Conversion of poses and matrices from the browser's right-handed,
//!   column-major convention to the host's left-handed convention
//!
//! Nothing here does I/O or holds global state; the session runtime in
//! `xrbridge-session` drives these pieces once per host tick.

#![forbid(unsafe_code)]

pub mod buffer;
pub mod convert;
pub mod decode;
pub mod layout;
pub mod types;

pub use buffer::{
    ControllerSample, HandSample, HeadsetSample, HitTestSample, JointSample, SharedBuffers,
};
pub use types::{
    ControllerState, Hand, HandFrame, HandJoint, HandJointId, HeadsetFrame, HitTestPose, Pose,
};

/// Errors raised while reading a transport buffer.
///
/// Absent data (frame id 0, an unchanged frame id, or a record with
/// `enabled = 0`) is not an error; decoders report it through their return
/// value instead. These variants cover structurally impossible input only.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer too short: expected {expected} floats, got {got}")]
    TooShort { expected: usize, got: usize },
    #[error("slot index out of range: {0}")]
    InvalidSlot(usize),
    #[error("unrecognized hand value: {0}")]
    UnknownHand(i32),
}

/// Errors raised when parsing host-facing identifiers from strings.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized hand name: {0:?}")]
    UnknownHand(String),
}

//! Consumer-side WebXR session runtime.
//!
//! This crate provides:
//! - The session/mode state machine (Normal / VR / AR, view layout,
//!   visibility) driven by explicit producer signals
//! - The per-tick update pass that polls the shared buffers, decodes what
//!   changed, and fans typed events out to registered observers
//! - Per-slot input state tables with edge-triggered button detection
//! - The command surface back to the producer (mode toggles, haptics,
//!   viewer hit-test)
//!
//! Everything hangs off one owned [`XrSession`] value constructed at
//! startup; there is no ambient global state.

#![forbid(unsafe_code)]

pub mod input;
pub mod link;
pub mod observer;
pub mod session;
pub mod state;

pub use input::{Action, Axis, ButtonState, InputConfig, InputTable};
pub use link::{BrowserLink, NullLink};
pub use observer::{ObserverId, ObserverRegistry, XrObserver};
pub use session::{SessionConfig, XrSession};
pub use state::{ControllerProfiles, ViewRect, VisibilityState, XrCapabilities, XrMode};

/// Errors raised when parsing host-facing identifiers and wire enums.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized action name: {0:?}")]
    UnknownAction(String),
    #[error("unrecognized visibility state: {0}")]
    UnknownVisibility(i32),
    #[error("unrecognized presentation mode: {0}")]
    UnknownMode(i32),
}

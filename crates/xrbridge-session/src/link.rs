//! Command surface back to the producer.
//!
//! The session never talks to the browser directly; it issues commands
//! through this trait. The embedding layer (WASM glue, an IPC shim, or the
//! simulator) implements it.

use xrbridge_core::Hand;

/// Consumer → producer commands.
pub trait BrowserLink {
    /// Request entering/leaving AR presentation.
    fn toggle_ar(&mut self);

    /// Request entering/leaving VR presentation.
    fn toggle_vr(&mut self);

    /// Flip the viewer hit-test subscription on the producer side.
    fn toggle_viewer_hit_test(&mut self);

    /// Fire a haptic actuator. `intensity` is 0–1, `duration_ms` in
    /// milliseconds.
    fn haptic_pulse(&mut self, hand: Hand, intensity: f32, duration_ms: f32);
}

/// Link that drops every command. Useful for tests and headless runs.
#[derive(Debug, Default)]
pub struct NullLink;

impl BrowserLink for NullLink {
    fn toggle_ar(&mut self) {}
    fn toggle_vr(&mut self) {}
    fn toggle_viewer_hit_test(&mut self) {}
    fn haptic_pulse(&mut self, _hand: Hand, _intensity: f32, _duration_ms: f32) {}
}

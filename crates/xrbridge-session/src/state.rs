//! Session-level state types: presentation mode, visibility, view layout,
//! and the capability/profile records delivered by the producer.

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// How the host is currently presenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XrMode {
    /// Flat rendering, no XR session.
    #[default]
    Normal,
    Vr,
    Ar,
}

impl XrMode {
    pub fn is_immersive(self) -> bool {
        !matches!(self, XrMode::Normal)
    }
}

/// Whether the producer considers pose data trustworthy right now.
///
/// Orthogonal to [`XrMode`]: visibility changes never change the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    #[default]
    Visible,
    VisibleBlurred,
    Hidden,
}

impl TryFrom<i32> for VisibilityState {
    type Error = ParseError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VisibilityState::Visible),
            1 => Ok(VisibilityState::VisibleBlurred),
            2 => Ok(VisibilityState::Hidden),
            other => Err(ParseError::UnknownVisibility(other)),
        }
    }
}

/// Normalized viewport rectangle for one eye, in [0, 1] framebuffer
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Full-framebuffer rectangle.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// What the browser reports it can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XrCapabilities {
    #[serde(default)]
    pub can_present_ar: bool,
    #[serde(default)]
    pub can_present_vr: bool,
    #[serde(default)]
    pub has_external_display: bool,
}

/// WebXR input profile identifiers for both controller slots, delivered
/// once per session as a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerProfiles {
    #[serde(default)]
    pub controller1: Vec<String>,
    #[serde(default)]
    pub controller2: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_wire_values() {
        assert_eq!(VisibilityState::try_from(0), Ok(VisibilityState::Visible));
        assert_eq!(
            VisibilityState::try_from(1),
            Ok(VisibilityState::VisibleBlurred)
        );
        assert_eq!(VisibilityState::try_from(2), Ok(VisibilityState::Hidden));
        assert_eq!(
            VisibilityState::try_from(3),
            Err(ParseError::UnknownVisibility(3))
        );
    }

    #[test]
    fn profiles_json_roundtrip() {
        let json = r#"{"controller1":["oculus-touch-v3","generic-trigger"],"controller2":[]}"#;
        let profiles: ControllerProfiles = serde_json::from_str(json).unwrap();
        assert_eq!(profiles.controller1.len(), 2);
        assert!(profiles.controller2.is_empty());
    }

    #[test]
    fn profiles_json_missing_fields_default() {
        let profiles: ControllerProfiles = serde_json::from_str("{}").unwrap();
        assert!(profiles.controller1.is_empty());
        assert!(profiles.controller2.is_empty());
    }
}

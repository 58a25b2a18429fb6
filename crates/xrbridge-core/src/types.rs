//! Typed values decoded out of the transport buffers.
//!
//! All of these are plain values the consumer owns outright; nothing keeps
//! a reference into the shared buffers, which the producer overwrites on
//! its next frame.

use glam::{Mat4, Quat, Vec3};

use crate::layout::HAND_JOINTS;
use crate::ParseError;

/// Which physical hand an input source is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hand {
    #[default]
    None,
    Left,
    Right,
}

impl Hand {
    /// Wire encoding used in the controller and hand buffers.
    pub const fn to_wire(self) -> f32 {
        match self {
            Hand::None => 0.0,
            Hand::Left => 1.0,
            Hand::Right => 2.0,
        }
    }

    /// Parse a WebXR handedness name.
    pub fn parse(name: &str) -> Result<Self, ParseError> {
        match name {
            "none" => Ok(Hand::None),
            "left" => Ok(Hand::Left),
            "right" => Ok(Hand::Right),
            other => Err(ParseError::UnknownHand(other.to_string())),
        }
    }
}

impl TryFrom<i32> for Hand {
    type Error = crate::DecodeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Hand::None),
            1 => Ok(Hand::Left),
            2 => Ok(Hand::Right),
            other => Err(crate::DecodeError::UnknownHand(other)),
        }
    }
}

/// A position plus an orientation, in the host's left-handed convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// One complete headset frame: stereo projections plus per-eye poses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadsetFrame {
    pub frame: u64,
    pub left_projection: Mat4,
    pub right_projection: Mat4,
    pub left: Pose,
    pub right: Pose,
}

impl Default for HeadsetFrame {
    fn default() -> Self {
        Self {
            frame: 0,
            left_projection: Mat4::IDENTITY,
            right_projection: Mat4::IDENTITY,
            left: Pose::default(),
            right: Pose::default(),
        }
    }
}

/// Decoded state of one controller slot.
///
/// The transport carries a single target-ray pose per controller; `grip`
/// aliases `pointer` until the wire format grows a second pose. `profiles`
/// is filled once from the producer's input-profiles signal and stays fixed
/// for the life of the controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerState {
    pub frame: u64,
    pub enabled: bool,
    pub hand: Hand,
    pub pointer: Pose,
    pub grip: Pose,
    pub trigger: f32,
    pub squeeze: f32,
    pub thumbstick: f32,
    pub thumbstick_x: f32,
    pub thumbstick_y: f32,
    pub touchpad: f32,
    pub touchpad_x: f32,
    pub touchpad_y: f32,
    pub button_a: f32,
    pub button_b: f32,
    pub profiles: Vec<String>,
}

impl ControllerState {
    /// Reset everything except the slot's hand identity and profiles.
    /// Used when the producer reports the controller gone and when the
    /// session winds down with the controller still live.
    pub fn reset_to_disabled(&mut self, frame: u64) {
        let hand = self.hand;
        let profiles = std::mem::take(&mut self.profiles);
        *self = Self {
            frame,
            hand,
            profiles,
            ..Self::default()
        };
    }
}

/// The WebXR hand joint set, wrist first, then each finger root to tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum HandJointId {
    Wrist = 0,
    ThumbMetacarpal = 1,
    ThumbPhalanxProximal = 2,
    ThumbPhalanxDistal = 3,
    ThumbTip = 4,
    IndexFingerMetacarpal = 5,
    IndexFingerPhalanxProximal = 6,
    IndexFingerPhalanxIntermediate = 7,
    IndexFingerPhalanxDistal = 8,
    IndexFingerTip = 9,
    MiddleFingerMetacarpal = 10,
    MiddleFingerPhalanxProximal = 11,
    MiddleFingerPhalanxIntermediate = 12,
    MiddleFingerPhalanxDistal = 13,
    MiddleFingerTip = 14,
    RingFingerMetacarpal = 15,
    RingFingerPhalanxProximal = 16,
    RingFingerPhalanxIntermediate = 17,
    RingFingerPhalanxDistal = 18,
    RingFingerTip = 19,
    PinkyFingerMetacarpal = 20,
    PinkyFingerPhalanxProximal = 21,
    PinkyFingerPhalanxIntermediate = 22,
    PinkyFingerPhalanxDistal = 23,
    PinkyFingerTip = 24,
}

impl HandJointId {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One tracked hand joint. `enabled` is per joint: the hand can be tracked
/// while an individual joint is not, in which case `pose` and `radius`
/// retain their previous values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandJoint {
    pub enabled: bool,
    pub pose: Pose,
    pub radius: f32,
}

/// Decoded state of one hand slot (25 joints plus pinch/grasp values).
#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    pub frame: u64,
    pub enabled: bool,
    pub hand: Hand,
    pub trigger: f32,
    pub squeeze: f32,
    pub joints: [HandJoint; HAND_JOINTS],
}

impl Default for HandFrame {
    fn default() -> Self {
        Self {
            frame: 0,
            enabled: false,
            hand: Hand::None,
            trigger: 0.0,
            squeeze: 0.0,
            joints: [HandJoint::default(); HAND_JOINTS],
        }
    }
}

impl HandFrame {
    pub fn joint(&self, id: HandJointId) -> &HandJoint {
        &self.joints[id.index()]
    }

    /// Reset to the untracked state, keeping joint poses (stale but
    /// harmless; `enabled` gates their use).
    pub fn reset_to_disabled(&mut self, frame: u64) {
        self.frame = frame;
        self.enabled = false;
        self.trigger = 0.0;
        self.squeeze = 0.0;
        for joint in &mut self.joints {
            joint.enabled = false;
        }
    }
}

/// Result of the viewer hit-test ray against detected real-world geometry.
/// `pose` is only meaningful while `available` is true.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitTestPose {
    pub frame: u64,
    pub available: bool,
    pub pose: Pose,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_wire_roundtrip() {
        for hand in [Hand::None, Hand::Left, Hand::Right] {
            assert_eq!(Hand::try_from(hand.to_wire() as i32), Ok(hand));
        }
        assert!(Hand::try_from(7).is_err());
    }

    #[test]
    fn hand_parse() {
        assert_eq!(Hand::parse("left"), Ok(Hand::Left));
        assert_eq!(Hand::parse("right"), Ok(Hand::Right));
        assert_eq!(Hand::parse("none"), Ok(Hand::None));
        assert_eq!(
            Hand::parse("LEFT"),
            Err(ParseError::UnknownHand("LEFT".to_string()))
        );
    }

    #[test]
    fn joint_ids_are_dense() {
        assert_eq!(HandJointId::Wrist.index(), 0);
        assert_eq!(HandJointId::PinkyFingerTip.index(), HAND_JOINTS - 1);
    }

    #[test]
    fn controller_reset_keeps_identity() {
        let mut state = ControllerState {
            enabled: true,
            hand: Hand::Left,
            trigger: 0.7,
            profiles: vec!["generic-trigger".to_string()],
            ..Default::default()
        };
        state.reset_to_disabled(12);
        assert!(!state.enabled);
        assert_eq!(state.frame, 12);
        assert_eq!(state.hand, Hand::Left);
        assert_eq!(state.trigger, 0.0);
        assert_eq!(state.profiles, vec!["generic-trigger".to_string()]);
    }
}

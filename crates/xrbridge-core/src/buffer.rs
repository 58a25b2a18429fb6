//! Shared transport buffers and the producer-side writers.
//!
//! One flat float array per data class, sized by [`crate::layout`]. The
//! producer is the only writer and the consumer the only reader; there is
//! no lock. Correctness rests on the write discipline every writer here
//! follows: payload floats first, frame id last, so a record's frame id
//! never advances ahead of its data.
//!
//! Writers accept producer-native (right-handed, column-major) values;
//! conversion to the host convention happens on the consumer side in
//! [`crate::decode`].

use crate::layout::*;
use crate::types::Hand;
use crate::DecodeError;

/// Producer-native headset record: stereo projections plus per-eye
/// rotation and position.
#[derive(Debug, Clone, Copy)]
pub struct HeadsetSample {
    pub left_projection: [f32; 16],
    pub right_projection: [f32; 16],
    pub left_rotation: [f32; 4],
    pub right_rotation: [f32; 4],
    pub left_position: [f32; 3],
    pub right_position: [f32; 3],
}

impl Default for HeadsetSample {
    fn default() -> Self {
        const IDENTITY: [f32; 16] = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        Self {
            left_projection: IDENTITY,
            right_projection: IDENTITY,
            left_rotation: [0.0, 0.0, 0.0, 1.0],
            right_rotation: [0.0, 0.0, 0.0, 1.0],
            left_position: [0.0; 3],
            right_position: [0.0; 3],
        }
    }
}

/// Producer-native controller record for one slot.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSample {
    pub hand: Hand,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
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
}

impl Default for ControllerSample {
    fn default() -> Self {
        Self {
            hand: Hand::None,
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            trigger: 0.0,
            squeeze: 0.0,
            thumbstick: 0.0,
            thumbstick_x: 0.0,
            thumbstick_y: 0.0,
            touchpad: 0.0,
            touchpad_x: 0.0,
            touchpad_y: 0.0,
            button_a: 0.0,
            button_b: 0.0,
        }
    }
}

/// Producer-native joint record.
#[derive(Debug, Clone, Copy)]
pub struct JointSample {
    pub enabled: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub radius: f32,
}

impl Default for JointSample {
    fn default() -> Self {
        Self {
            enabled: false,
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            radius: 0.0,
        }
    }
}

/// Producer-native hand record for one slot.
#[derive(Debug, Clone, Copy)]
pub struct HandSample {
    pub hand: Hand,
    pub trigger: f32,
    pub squeeze: f32,
    pub joints: [JointSample; HAND_JOINTS],
}

impl Default for HandSample {
    fn default() -> Self {
        Self {
            hand: Hand::None,
            trigger: 0.0,
            squeeze: 0.0,
            joints: [JointSample::default(); HAND_JOINTS],
        }
    }
}

/// Producer-native viewer hit-test record.
#[derive(Debug, Clone, Copy)]
pub struct HitTestSample {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

/// The four shared buffers plus the headset frame counter.
///
/// Architecturally this lives between two single-threaded worlds: the
/// browser driver fills it once per rendered frame, the host runtime reads
/// it once per tick. Consumers copy out into typed values and never hold a
/// reference into the raw floats across ticks.
#[derive(Debug, Clone)]
pub struct SharedBuffers {
    headset_frame: u64,
    headset: [f32; HEADSET_FLOATS],
    controllers: [f32; CONTROLLER_BUFFER_FLOATS],
    hands: [f32; HAND_BUFFER_FLOATS],
    hit_test: [f32; HIT_TEST_FLOATS],
}

impl Default for SharedBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedBuffers {
    /// All-zero buffers; frame id 0 everywhere reads as "no data yet".
    pub fn new() -> Self {
        Self {
            headset_frame: 0,
            headset: [0.0; HEADSET_FLOATS],
            controllers: [0.0; CONTROLLER_BUFFER_FLOATS],
            hands: [0.0; HAND_BUFFER_FLOATS],
            hit_test: [0.0; HIT_TEST_FLOATS],
        }
    }

    pub fn headset_frame(&self) -> u64 {
        self.headset_frame
    }

    pub fn headset(&self) -> &[f32] {
        &self.headset
    }

    pub fn controllers(&self) -> &[f32] {
        &self.controllers
    }

    pub fn hands(&self) -> &[f32] {
        &self.hands
    }

    pub fn hit_test(&self) -> &[f32] {
        &self.hit_test
    }

    /// Write a complete headset record, then publish its frame counter.
    pub fn write_headset(&mut self, frame: u64, sample: &HeadsetSample) {
        self.headset[HEADSET_LEFT_PROJECTION..HEADSET_LEFT_PROJECTION + 16]
            .copy_from_slice(&sample.left_projection);
        self.headset[HEADSET_RIGHT_PROJECTION..HEADSET_RIGHT_PROJECTION + 16]
            .copy_from_slice(&sample.right_projection);
        self.headset[HEADSET_LEFT_ROTATION..HEADSET_LEFT_ROTATION + 4]
            .copy_from_slice(&sample.left_rotation);
        self.headset[HEADSET_RIGHT_ROTATION..HEADSET_RIGHT_ROTATION + 4]
            .copy_from_slice(&sample.right_rotation);
        self.headset[HEADSET_LEFT_POSITION..HEADSET_LEFT_POSITION + 3]
            .copy_from_slice(&sample.left_position);
        self.headset[HEADSET_RIGHT_POSITION..HEADSET_RIGHT_POSITION + 3]
            .copy_from_slice(&sample.right_position);
        self.headset_frame = frame;
    }

    /// Write an enabled controller record into `slot`.
    pub fn write_controller(
        &mut self,
        slot: usize,
        frame: u64,
        sample: &ControllerSample,
    ) -> Result<(), DecodeError> {
        let base = controller_base(slot)?;
        let buf = &mut self.controllers;
        buf[base + CONTROLLER_ENABLED] = 1.0;
        buf[base + CONTROLLER_HAND] = sample.hand.to_wire();
        buf[base + CONTROLLER_POSITION..base + CONTROLLER_POSITION + 3]
            .copy_from_slice(&sample.position);
        buf[base + CONTROLLER_ROTATION..base + CONTROLLER_ROTATION + 4]
            .copy_from_slice(&sample.rotation);
        let axes = base + CONTROLLER_AXES;
        buf[axes] = sample.trigger;
        buf[axes + 1] = sample.squeeze;
        buf[axes + 2] = sample.thumbstick;
        buf[axes + 3] = sample.thumbstick_x;
        buf[axes + 4] = sample.thumbstick_y;
        buf[axes + 5] = sample.touchpad;
        buf[axes + 6] = sample.touchpad_x;
        buf[axes + 7] = sample.touchpad_y;
        buf[axes + 8] = sample.button_a;
        buf[axes + 9] = sample.button_b;
        buf[base + CONTROLLER_FRAME] = frame as f32;
        Ok(())
    }

    /// Mark `slot` disabled for `frame`, leaving the stale payload floats
    /// in place (the decoder never reads them).
    pub fn write_controller_disabled(&mut self, slot: usize, frame: u64) -> Result<(), DecodeError> {
        let base = controller_base(slot)?;
        self.controllers[base + CONTROLLER_ENABLED] = 0.0;
        self.controllers[base + CONTROLLER_FRAME] = frame as f32;
        Ok(())
    }

    /// Write an enabled hand record into `slot` (0 = left, 1 = right).
    pub fn write_hand(
        &mut self,
        slot: usize,
        frame: u64,
        sample: &HandSample,
    ) -> Result<(), DecodeError> {
        let base = hand_base(slot)?;
        let buf = &mut self.hands;
        buf[base + HAND_ENABLED] = 1.0;
        buf[base + HAND_HAND] = sample.hand.to_wire();
        buf[base + HAND_TRIGGER] = sample.trigger;
        buf[base + HAND_SQUEEZE] = sample.squeeze;
        for (i, joint) in sample.joints.iter().enumerate() {
            let at = base + HAND_HEADER_FLOATS + i * HAND_JOINT_FLOATS;
            buf[at] = if joint.enabled { 1.0 } else { 0.0 };
            buf[at + 1..at + 4].copy_from_slice(&joint.position);
            buf[at + 4..at + 8].copy_from_slice(&joint.rotation);
            buf[at + 8] = joint.radius;
        }
        buf[base + HAND_FRAME] = frame as f32;
        Ok(())
    }

    /// Mark hand `slot` untracked for `frame`.
    pub fn write_hand_disabled(&mut self, slot: usize, frame: u64) -> Result<(), DecodeError> {
        let base = hand_base(slot)?;
        self.hands[base + HAND_ENABLED] = 0.0;
        self.hands[base + HAND_FRAME] = frame as f32;
        Ok(())
    }

    /// Write the viewer hit-test record; `None` reports "no hit".
    pub fn write_hit_test(&mut self, frame: u64, sample: Option<&HitTestSample>) {
        match sample {
            Some(sample) => {
                self.hit_test[HIT_TEST_AVAILABLE] = 1.0;
                self.hit_test[HIT_TEST_POSITION..HIT_TEST_POSITION + 3]
                    .copy_from_slice(&sample.position);
                self.hit_test[HIT_TEST_ROTATION..HIT_TEST_ROTATION + 4]
                    .copy_from_slice(&sample.rotation);
            }
            None => {
                self.hit_test[HIT_TEST_AVAILABLE] = 0.0;
            }
        }
        self.hit_test[HIT_TEST_FRAME] = frame as f32;
    }
}

fn controller_base(slot: usize) -> Result<usize, DecodeError> {
    if slot >= CONTROLLER_SLOTS {
        return Err(DecodeError::InvalidSlot(slot));
    }
    Ok(slot * CONTROLLER_SLOT_FLOATS)
}

fn hand_base(slot: usize) -> Result<usize, DecodeError> {
    if slot >= HAND_SLOTS {
        return Err(DecodeError::InvalidSlot(slot));
    }
    Ok(slot * HAND_SLOT_FLOATS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use crate::types::{ControllerState, HandFrame, HitTestPose};
    use glam::Vec3;

    #[test]
    fn fresh_buffers_read_as_no_data() {
        let buffers = SharedBuffers::new();
        assert_eq!(buffers.headset_frame(), 0);
        let mut controller = ControllerState::default();
        assert!(!decode::decode_controller(buffers.controllers(), 0, &mut controller).unwrap());
        let mut hand = HandFrame::default();
        assert!(!decode::decode_hand(buffers.hands(), 0, &mut hand).unwrap());
        let mut hit = HitTestPose::default();
        assert!(!decode::decode_hit_test(buffers.hit_test(), &mut hit).unwrap());
    }

    #[test]
    fn controller_write_read() {
        let mut buffers = SharedBuffers::new();
        let sample = ControllerSample {
            hand: Hand::Left,
            position: [0.0, 1.0, 2.0],
            trigger: 1.0,
            ..Default::default()
        };
        buffers.write_controller(0, 1, &sample).unwrap();

        let mut out = ControllerState::default();
        assert!(decode::decode_controller(buffers.controllers(), 0, &mut out).unwrap());
        assert!(out.enabled);
        assert_eq!(out.hand, Hand::Left);
        assert_eq!(out.pointer.position, Vec3::new(0.0, 1.0, -2.0));
        assert_eq!(out.trigger, 1.0);

        buffers.write_controller_disabled(0, 2).unwrap();
        assert!(decode::decode_controller(buffers.controllers(), 0, &mut out).unwrap());
        assert!(!out.enabled);
        assert_eq!(out.hand, Hand::Left);
    }

    #[test]
    fn hand_write_read() {
        let mut buffers = SharedBuffers::new();
        let mut sample = HandSample {
            hand: Hand::Right,
            trigger: 0.4,
            ..Default::default()
        };
        sample.joints[0] = JointSample {
            enabled: true,
            position: [0.0, 0.0, 1.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            radius: 0.03,
        };
        buffers.write_hand(1, 9, &sample).unwrap();

        let mut out = HandFrame::default();
        assert!(decode::decode_hand(buffers.hands(), 1, &mut out).unwrap());
        assert_eq!(out.frame, 9);
        assert_eq!(out.hand, Hand::Right);
        assert_eq!(out.trigger, 0.4);
        assert!(out.joints[0].enabled);
        assert_eq!(out.joints[0].pose.position, Vec3::new(0.0, 0.0, -1.0));
        assert!(!out.joints[1].enabled);
    }

    #[test]
    fn hit_test_write_read() {
        let mut buffers = SharedBuffers::new();
        buffers.write_hit_test(
            3,
            Some(&HitTestSample {
                position: [1.0, 0.0, 4.0],
                rotation: [0.0, 0.0, 0.0, 1.0],
            }),
        );
        let mut out = HitTestPose::default();
        assert!(decode::decode_hit_test(buffers.hit_test(), &mut out).unwrap());
        assert!(out.available);

        buffers.write_hit_test(4, None);
        assert!(decode::decode_hit_test(buffers.hit_test(), &mut out).unwrap());
        assert!(!out.available);
    }

    #[test]
    fn invalid_slots_rejected() {
        let mut buffers = SharedBuffers::new();
        assert_eq!(
            buffers.write_controller(5, 1, &ControllerSample::default()),
            Err(DecodeError::InvalidSlot(5))
        );
        assert_eq!(
            buffers.write_hand_disabled(2, 1),
            Err(DecodeError::InvalidSlot(2))
        );
    }
}

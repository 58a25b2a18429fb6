//! Consumer-side decoders for the shared transport buffers.
//!
//! Each decoder compares the record's embedded frame id against the typed
//! state it is updating and returns `Ok(false)` when nothing changed, so a
//! poll turns into a change notification without hashing any payload. On
//! `Ok(true)` the typed state has been replaced wholesale (or merged, for
//! hand joints). On `Err` the typed state is untouched.
//!
//! A record whose `enabled` flag is clear short-circuits: the remaining
//! floats in that slot are unspecified and are never read.

use glam::{Quat, Vec3};

use crate::convert;
use crate::layout::*;
use crate::types::{ControllerState, Hand, HandFrame, HeadsetFrame, HitTestPose, Pose};
use crate::DecodeError;

/// Decode one complete headset record.
///
/// The headset buffer has no embedded frame id; the caller passes the
/// producer's published counter and owns the unchanged/zero-frame checks.
pub fn decode_headset(frame: u64, buf: &[f32]) -> Result<HeadsetFrame, DecodeError> {
    check_len(buf, HEADSET_FLOATS)?;
    Ok(HeadsetFrame {
        frame,
        left_projection: convert::projection_from_gl(matrix_at(buf, HEADSET_LEFT_PROJECTION)),
        right_projection: convert::projection_from_gl(matrix_at(buf, HEADSET_RIGHT_PROJECTION)),
        left: pose_at(buf, HEADSET_LEFT_POSITION, HEADSET_LEFT_ROTATION),
        right: pose_at(buf, HEADSET_RIGHT_POSITION, HEADSET_RIGHT_ROTATION),
    })
}

/// Decode one controller slot into `out`.
///
/// Returns `Ok(false)` when the slot's frame id matches `out.frame`. When
/// the record is disabled, `out` keeps its hand identity and profiles and
/// everything else resets.
pub fn decode_controller(
    buf: &[f32],
    slot: usize,
    out: &mut ControllerState,
) -> Result<bool, DecodeError> {
    check_len(buf, CONTROLLER_BUFFER_FLOATS)?;
    if slot >= CONTROLLER_SLOTS {
        return Err(DecodeError::InvalidSlot(slot));
    }
    let base = slot * CONTROLLER_SLOT_FLOATS;

    let frame = frame_id(buf[base + CONTROLLER_FRAME]);
    if frame == out.frame {
        return Ok(false);
    }

    if buf[base + CONTROLLER_ENABLED] == 0.0 {
        out.reset_to_disabled(frame);
        return Ok(true);
    }

    let hand = Hand::try_from(buf[base + CONTROLLER_HAND] as i32)?;
    let pointer = pose_at(buf, base + CONTROLLER_POSITION, base + CONTROLLER_ROTATION);
    let axes = base + CONTROLLER_AXES;

    out.frame = frame;
    out.enabled = true;
    out.hand = hand;
    out.pointer = pointer;
    out.grip = pointer;
    out.trigger = buf[axes];
    out.squeeze = buf[axes + 1];
    out.thumbstick = buf[axes + 2];
    out.thumbstick_x = buf[axes + 3];
    out.thumbstick_y = buf[axes + 4];
    out.touchpad = buf[axes + 5];
    out.touchpad_x = buf[axes + 6];
    out.touchpad_y = buf[axes + 7];
    out.button_a = buf[axes + 8];
    out.button_b = buf[axes + 9];
    Ok(true)
}

/// Decode one hand slot into `out`.
///
/// Joints are merged: a joint whose own enabled flag is clear keeps its
/// previous pose and radius, so consumers never see the unspecified floats
/// behind an untracked joint.
pub fn decode_hand(buf: &[f32], slot: usize, out: &mut HandFrame) -> Result<bool, DecodeError> {
    check_len(buf, HAND_BUFFER_FLOATS)?;
    if slot >= HAND_SLOTS {
        return Err(DecodeError::InvalidSlot(slot));
    }
    let base = slot * HAND_SLOT_FLOATS;

    let frame = frame_id(buf[base + HAND_FRAME]);
    if frame == out.frame {
        return Ok(false);
    }

    if buf[base + HAND_ENABLED] == 0.0 {
        out.reset_to_disabled(frame);
        return Ok(true);
    }

    let hand = Hand::try_from(buf[base + HAND_HAND] as i32)?;

    out.frame = frame;
    out.enabled = true;
    out.hand = hand;
    out.trigger = buf[base + HAND_TRIGGER];
    out.squeeze = buf[base + HAND_SQUEEZE];
    for (i, joint) in out.joints.iter_mut().enumerate() {
        let at = base + HAND_HEADER_FLOATS + i * HAND_JOINT_FLOATS;
        joint.enabled = buf[at] != 0.0;
        if !joint.enabled {
            continue;
        }
        joint.pose = pose_at(buf, at + 1, at + 4);
        joint.radius = buf[at + 8];
    }
    Ok(true)
}

/// Decode the viewer hit-test record into `out`.
///
/// When the record reports no hit, `available` clears and the previous
/// pose is retained but must not be consulted.
pub fn decode_hit_test(buf: &[f32], out: &mut HitTestPose) -> Result<bool, DecodeError> {
    check_len(buf, HIT_TEST_FLOATS)?;

    let frame = frame_id(buf[HIT_TEST_FRAME]);
    if frame == out.frame {
        return Ok(false);
    }

    out.frame = frame;
    out.available = buf[HIT_TEST_AVAILABLE] != 0.0;
    if out.available {
        out.pose = pose_at(buf, HIT_TEST_POSITION, HIT_TEST_ROTATION);
    }
    Ok(true)
}

fn check_len(buf: &[f32], expected: usize) -> Result<(), DecodeError> {
    if buf.len() < expected {
        return Err(DecodeError::TooShort {
            expected,
            got: buf.len(),
        });
    }
    Ok(())
}

/// Frame ids ride the float buffer as whole numbers. Negative or NaN
/// garbage saturates to 0, which the change detector treats as "no data".
fn frame_id(raw: f32) -> u64 {
    raw as u64
}

fn matrix_at(buf: &[f32], at: usize) -> [f32; 16] {
    std::array::from_fn(|i| buf[at + i])
}

/// Read a producer-native position and rotation and convert both to the
/// host convention.
fn pose_at(buf: &[f32], pos_at: usize, rot_at: usize) -> Pose {
    Pose {
        position: convert::position_from_gl(Vec3::new(
            buf[pos_at],
            buf[pos_at + 1],
            buf[pos_at + 2],
        )),
        rotation: convert::rotation_from_gl(Quat::from_xyzw(
            buf[rot_at],
            buf[rot_at + 1],
            buf[rot_at + 2],
            buf[rot_at + 3],
        )),
    }
}

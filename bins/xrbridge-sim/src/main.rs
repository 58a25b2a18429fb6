//! Drives a scripted browser-side producer through a full session:
//! capabilities, start VR, a run of frames with head motion and a trigger
//! press, then end XR. Observer events and outgoing commands land in the
//! log, so the whole decode/convert/notify path is visible without a
//! browser.

#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use xrbridge_core::{ControllerSample, ControllerState, Hand, HandFrame, HeadsetFrame, HeadsetSample};
use xrbridge_session::{
    Action, BrowserLink, SessionConfig, ViewRect, VisibilityState, XrCapabilities, XrMode,
    XrObserver, XrSession,
};

#[derive(Parser, Debug)]
#[command(name = "xrbridge-sim")]
struct Args {
    /// Number of producer frames to simulate.
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Frame on which the scripted trigger press starts.
    #[arg(long, default_value_t = 30)]
    press_at: u64,

    /// Frame on which the scripted trigger press ends.
    #[arg(long, default_value_t = 60)]
    release_at: u64,
}

struct LoggingLink;

impl BrowserLink for LoggingLink {
    fn toggle_ar(&mut self) {
        info!("command: toggle AR");
    }
    fn toggle_vr(&mut self) {
        info!("command: toggle VR");
    }
    fn toggle_viewer_hit_test(&mut self) {
        info!("command: toggle viewer hit-test");
    }
    fn haptic_pulse(&mut self, hand: Hand, intensity: f32, duration_ms: f32) {
        info!(?hand, intensity, duration_ms, "command: haptic pulse");
    }
}

struct LoggingObserver;

impl XrObserver for LoggingObserver {
    fn on_xr_change(&self, mode: XrMode, views: u32, _left: ViewRect, _right: ViewRect) {
        info!(?mode, views, "xr change");
    }
    fn on_headset_update(&self, headset: &HeadsetFrame) {
        if headset.frame % 30 == 0 {
            info!(
                frame = headset.frame,
                position = ?headset.left.position,
                "headset update"
            );
        }
    }
    fn on_controller_update(&self, controller: &ControllerState) {
        info!(
            frame = controller.frame,
            hand = ?controller.hand,
            enabled = controller.enabled,
            trigger = controller.trigger,
            "controller update"
        );
    }
    fn on_hand_update(&self, hand: &HandFrame) {
        info!(hand = ?hand.hand, enabled = hand.enabled, "hand update");
    }
    fn on_visibility_change(&self, visibility: VisibilityState) {
        info!(?visibility, "visibility change");
    }
    fn on_capabilities_update(&self, capabilities: &XrCapabilities) {
        info!(?capabilities, "capabilities update");
    }
}

/// Head bobbing gently along X, in producer-native coordinates.
fn headset_sample(frame: u64) -> HeadsetSample {
    let t = frame as f32 / 90.0;
    HeadsetSample {
        left_position: [t.sin() * 0.1 - 0.032, 1.6, 0.0],
        right_position: [t.sin() * 0.1 + 0.032, 1.6, 0.0],
        ..Default::default()
    }
}

fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut session = XrSession::new(SessionConfig::default(), Box::new(LoggingLink));
    session.register_observer(Arc::new(LoggingObserver));

    session.set_capabilities(XrCapabilities {
        can_present_vr: true,
        ..Default::default()
    });
    session.set_input_profiles_json(r#"{"controller1":["generic-trigger-squeeze"]}"#);
    session.toggle_vr();

    // The browser granted the session; frames start flowing.
    session.start_vr(
        2,
        ViewRect::new(0.0, 0.0, 0.5, 1.0),
        ViewRect::new(0.5, 0.0, 0.5, 1.0),
    );

    for frame in 1..=args.frames {
        let pressed = frame >= args.press_at && frame < args.release_at;
        session.buffers_mut().write_headset(frame, &headset_sample(frame));
        session.buffers_mut().write_controller(
            0,
            frame,
            &ControllerSample {
                hand: Hand::Right,
                position: [0.2, 1.1, -0.4],
                trigger: if pressed { 1.0 } else { 0.0 },
                ..Default::default()
            },
        )?;

        session.on_update();

        let (down, up) = match session.controller_input(0) {
            Some(input) => (
                input.button_down(Action::Trigger),
                input.button_up(Action::Trigger),
            ),
            None => (false, false),
        };
        if down {
            info!(frame, "trigger pressed, firing haptic pulse");
            session.haptic_pulse(Hand::Right, 0.8, 40.0);
        }
        if up {
            info!(frame, "trigger released");
        }
    }

    session.end_xr();
    session.on_update();

    info!("session complete");
    Ok(())
}
